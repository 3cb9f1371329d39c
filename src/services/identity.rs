// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Swimmer identity: page validity and name/club extraction.
//!
//! Name extraction is a fixed, ordered list of strategies. Each looks at one
//! page and either produces a name or passes; the first hit wins and the
//! caller falls back to a synthetic name if every strategy passes.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};

static PARAGRAPH: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("p").expect("valid selector"));
static TABLE_OR_HEADING: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("table, h1, h2").expect("valid selector"));
static TITLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("title").expect("valid selector"));
static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));
static CLUB_TRAILER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(Search Again.*|<.*)").expect("valid regex"));

/// Phrases that mark the summary page as an error or empty result.
const NOT_A_SWIMMER: &[&str] = &["no results found", "invalid", "not found", "error"];

/// Words that show a candidate name is really page furniture.
const BOILERPLATE: &[&str] = &["swimming", "results", "search", "individual", "best", "times"];

/// Which page a strategy reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    /// The best-times page, already fetched for the records.
    Summary,
    /// The biography page, fetched only if a strategy needs it.
    Biography,
}

/// Name and club pulled from a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedIdentity {
    pub name: String,
    pub club: Option<String>,
}

impl ExtractedIdentity {
    fn cleaned(name: &str, club: Option<&str>) -> Self {
        let club = club
            .map(|c| CLUB_TRAILER.replace(c, ""))
            .map(|c| collapse_whitespace(&c))
            .filter(|c| !c.is_empty());
        Self {
            name: collapse_whitespace(name),
            club,
        }
    }
}

pub trait IdentityStrategy: Send + Sync {
    fn name(&self) -> &'static str;
    fn page(&self) -> PageKind;
    fn extract(&self, tiref: &str, html: &str) -> Option<ExtractedIdentity>;
}

/// "Name - (tiref) - Club" in a paragraph.
pub struct ParagraphText;

/// The same pattern matched against raw markup, anchored on the tiref link.
pub struct MarkupPattern;

/// "Biographical Data - Name (Club)" in the biography page title.
pub struct BiographyTitle;

/// Strategies in the order they are tried.
pub static STRATEGIES: [&dyn IdentityStrategy; 3] = [&ParagraphText, &MarkupPattern, &BiographyTitle];

impl IdentityStrategy for ParagraphText {
    fn name(&self) -> &'static str {
        "paragraph_text"
    }

    fn page(&self) -> PageKind {
        PageKind::Summary
    }

    fn extract(&self, tiref: &str, html: &str) -> Option<ExtractedIdentity> {
        let document = Html::parse_document(html);
        document.select(&PARAGRAPH).find_map(|p| {
            let text = collapse_whitespace(&p.text().collect::<String>());
            if !text.contains(tiref) || !text.contains('-') {
                return None;
            }
            let parts: Vec<&str> = text.split(" - ").collect();
            if parts.len() < 3 {
                return None;
            }
            let name = parts[0].trim();
            if !plausible_name(name) {
                return None;
            }
            let club = parts[parts.len() - 1]
                .split("Search Again")
                .next()
                .unwrap_or_default()
                .trim();
            Some(ExtractedIdentity::cleaned(name, Some(club)))
        })
    }
}

impl IdentityStrategy for MarkupPattern {
    fn name(&self) -> &'static str {
        "markup_pattern"
    }

    fn page(&self) -> PageKind {
        PageKind::Summary
    }

    fn extract(&self, tiref: &str, html: &str) -> Option<ExtractedIdentity> {
        let id = regex::escape(tiref);
        let pattern = Regex::new(&format!(
            r"([^<>]+?)\s*-\s*\(<a[^>]*tiref={id}[^>]*>{id}</a>\)\s*-\s*([^<>]+)"
        ))
        .ok()?;
        let captures = pattern.captures(html)?;
        let name = captures.get(1)?.as_str().trim();
        if name.is_empty() {
            return None;
        }
        let club = captures.get(2).map(|m| m.as_str().trim());
        Some(ExtractedIdentity::cleaned(name, club))
    }
}

impl IdentityStrategy for BiographyTitle {
    fn name(&self) -> &'static str {
        "biography_title"
    }

    fn page(&self) -> PageKind {
        PageKind::Biography
    }

    fn extract(&self, _tiref: &str, html: &str) -> Option<ExtractedIdentity> {
        let document = Html::parse_document(html);
        let title: String = document.select(&TITLE).next()?.text().collect();
        if !title.contains('(') {
            return None;
        }
        let (_, rest) = title.split_once(" - ")?;
        let (name, club) = match rest.split_once('(') {
            Some((name, club)) => (name.trim(), club.rsplit_once(')').map(|(c, _)| c)),
            None => (rest.trim(), None),
        };
        if name.is_empty() || name.chars().count() >= 50 {
            return None;
        }
        Some(ExtractedIdentity::cleaned(name, club))
    }
}

/// Whether a summary page looks like a real swimmer's page.
///
/// Any error phrase anywhere in the text rejects the page, even when it
/// also contains tables.
pub fn page_indicates_swimmer(html: &str) -> bool {
    let document = Html::parse_document(html);
    let text = document.root_element().text().collect::<String>().to_lowercase();
    if NOT_A_SWIMMER.iter().any(|phrase| text.contains(phrase)) {
        return false;
    }
    document.select(&TABLE_OR_HEADING).next().is_some()
}

fn plausible_name(name: &str) -> bool {
    let len = name.chars().count();
    let lower = name.to_lowercase();
    (3..80).contains(&len) && !BOILERPLATE.iter().any(|word| lower.contains(word))
}

fn collapse_whitespace(text: &str) -> String {
    WHITESPACE.replace_all(text.trim(), " ").into_owned()
}
