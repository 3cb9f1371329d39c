// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Result-table parsing for the summary (best times) page and the
//! per-event detail (race history) pages.
//!
//! Every data row produces a [`RowOutcome`]. A row that cannot be read is
//! skipped with a reason; one bad row never aborts the page.

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};

use crate::models::{
    EventKey, PoolType, RaceResult, RoundType, Stroke, SwimRecord, VALID_DISTANCES,
};
use crate::time_utils::parse_meet_date;

static TABLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("table").expect("valid selector"));
static ROW: LazyLock<Selector> = LazyLock::new(|| Selector::parse("tr").expect("valid selector"));
static CELL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("td, th").expect("valid selector"));

/// Summary rows: event, time, converted time, points, date, meet, venue,
/// licence[, level].
const SUMMARY_MIN_CELLS: usize = 8;

/// Detail rows: time, points, round, date[, meet, venue, club, level].
const DETAIL_MIN_CELLS: usize = 4;

/// Stroke keywords, checked in order against the lowercased event name.
/// Plain substring matching: the first stroke with any hit wins.
/// Markers the site appends to a time cell.
const TIME_ANNOTATIONS: &[&str] = &["PB", "NT"];

const STROKE_KEYWORDS: &[(Stroke, &[&str])] = &[
    (Stroke::Freestyle, &["freestyle", "free", "fr"]),
    (Stroke::Backstroke, &["backstroke", "back", "bk"]),
    (Stroke::Breaststroke, &["breaststroke", "breast", "br"]),
    (Stroke::Butterfly, &["butterfly", "fly", "bf"]),
    (Stroke::IndividualMedley, &["medley", "im"]),
];

/// Why a table row did not become a record.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SkipReason {
    #[error("row has {found} cells, need at least {required}")]
    TooFewCells { found: usize, required: usize },

    #[error("missing {0}")]
    MissingField(&'static str),

    #[error("unrecognised event {0:?}")]
    UnknownEvent(String),

    #[error("unparseable date {0:?}")]
    UnparseableDate(String),
}

/// Result of reading one table row.
#[derive(Debug, Clone, PartialEq)]
pub enum RowOutcome {
    Parsed(SwimRecord),
    Skipped(SkipReason),
}

/// Records read from a page plus the reasons rows were dropped.
#[derive(Debug, Default)]
pub struct TableHarvest {
    pub records: Vec<SwimRecord>,
    pub skipped: Vec<SkipReason>,
}

impl TableHarvest {
    fn push(&mut self, outcome: RowOutcome) {
        match outcome {
            RowOutcome::Parsed(record) => self.records.push(record),
            RowOutcome::Skipped(reason) => self.skipped.push(reason),
        }
    }
}

/// Decide the pool length of a summary table.
///
/// Header text wins when it names the course. Otherwise the site's layout
/// is assumed: first table long course, second short course, anything
/// later long course.
pub fn classify_pool(header: &str, table_index: usize) -> PoolType {
    let lower = header.to_lowercase();
    let compact: String = lower.chars().filter(|c| !c.is_whitespace()).collect();

    if compact.contains("strokelc") || lower.contains("lc time") {
        PoolType::LongCourse
    } else if compact.contains("strokesc") || lower.contains("sc time") {
        PoolType::ShortCourse
    } else if table_index == 1 {
        PoolType::ShortCourse
    } else {
        PoolType::LongCourse
    }
}

/// Split an event name such as "100 Breaststroke" into stroke and distance.
pub fn parse_event_name(name: &str) -> Option<(Stroke, u16)> {
    let digits: String = name
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    let distance: u16 = digits.parse().ok()?;
    if !VALID_DISTANCES.contains(&distance) {
        return None;
    }

    let lower = name.to_lowercase();
    let stroke = STROKE_KEYWORDS
        .iter()
        .find(|(_, words)| words.iter().any(|w| lower.contains(w)))
        .map(|(stroke, _)| *stroke)?;

    Some((stroke, distance))
}

/// Points cells are either all digits or meaningless.
pub fn parse_points(raw: &str) -> Option<u32> {
    let raw = raw.trim();
    if raw.is_empty() || !raw.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok()
}

fn cell<'a>(cells: &'a [String], index: usize) -> &'a str {
    cells.get(index).map(String::as_str).unwrap_or("")
}

/// Read a summary-page row.
pub fn summary_row(tiref: &str, cells: &[String], pool_type: PoolType) -> RowOutcome {
    if cells.len() < SUMMARY_MIN_CELLS {
        return RowOutcome::Skipped(SkipReason::TooFewCells {
            found: cells.len(),
            required: SUMMARY_MIN_CELLS,
        });
    }

    let event_name = cell(cells, 0);
    let time = time_text(cell(cells, 1));
    let date = cell(cells, 4);
    for (value, field) in [(event_name, "event"), (time, "time"), (date, "date")] {
        if value.is_empty() {
            return RowOutcome::Skipped(SkipReason::MissingField(field));
        }
    }

    let Some((stroke, distance)) = parse_event_name(event_name) else {
        return RowOutcome::Skipped(SkipReason::UnknownEvent(event_name.to_string()));
    };
    let Some(meet_date) = parse_meet_date(date) else {
        return RowOutcome::Skipped(SkipReason::UnparseableDate(date.to_string()));
    };

    RowOutcome::Parsed(SwimRecord::new(
        tiref,
        event_name,
        EventKey::new(stroke, distance, pool_type),
        RaceResult {
            time: time.to_string(),
            wa_points: parse_points(cell(cells, 3)),
            round_type: RoundType::Finals,
            meet_date,
            meet_name: cell(cells, 5).to_string(),
            venue: cell(cells, 6).to_string(),
        },
    ))
}

/// Read a detail-page row. The event comes from the page being read, not
/// the row.
pub fn detail_row(tiref: &str, key: EventKey, event_name: &str, cells: &[String]) -> RowOutcome {
    if cells.len() < DETAIL_MIN_CELLS {
        return RowOutcome::Skipped(SkipReason::TooFewCells {
            found: cells.len(),
            required: DETAIL_MIN_CELLS,
        });
    }

    let time = time_text(cell(cells, 0));
    let date = cell(cells, 3);
    if time.is_empty() {
        return RowOutcome::Skipped(SkipReason::MissingField("time"));
    }
    if date.is_empty() {
        return RowOutcome::Skipped(SkipReason::MissingField("date"));
    }
    let Some(meet_date) = parse_meet_date(date) else {
        return RowOutcome::Skipped(SkipReason::UnparseableDate(date.to_string()));
    };

    RowOutcome::Parsed(SwimRecord::new(
        tiref,
        event_name,
        key,
        RaceResult {
            time: time.to_string(),
            wa_points: parse_points(cell(cells, 1)),
            round_type: RoundType::from_code(cell(cells, 2)),
            meet_date,
            meet_name: cell(cells, 4).to_string(),
            venue: cell(cells, 5).to_string(),
        },
    ))
}

/// Parse every table on the summary page.
pub fn parse_summary_page(tiref: &str, html: &str) -> TableHarvest {
    let mut harvest = TableHarvest::default();
    for (index, rows) in extract_tables(html).into_iter().enumerate() {
        if rows.len() < 2 {
            continue;
        }
        let Some((header, data)) = rows.split_first() else {
            continue;
        };
        let pool_type = classify_pool(&header.join(" "), index);
        for cells in data {
            harvest.push(summary_row(tiref, cells, pool_type));
        }
    }
    harvest
}

/// Parse every table on an event's detail page.
pub fn parse_detail_page(tiref: &str, key: EventKey, event_name: &str, html: &str) -> TableHarvest {
    let mut harvest = TableHarvest::default();
    for rows in extract_tables(html).into_iter().filter(|rows| rows.len() >= 2) {
        for cells in rows.iter().skip(1) {
            harvest.push(detail_row(tiref, key, event_name, cells));
        }
    }
    harvest
}

/// Cell text of every table on the page, in document order. Table
/// positions matter to [`classify_pool`], so short tables are kept here.
fn extract_tables(html: &str) -> Vec<Vec<Vec<String>>> {
    let document = Html::parse_document(html);
    document
        .select(&TABLE)
        .map(|table| {
            table
                .select(&ROW)
                .map(|row| row.select(&CELL).map(cell_text).collect())
                .collect::<Vec<Vec<String>>>()
        })
        .collect()
}

/// Text nodes are trimmed and joined with nothing between them, so
/// `1:05.32<sup>PB</sup>` reads as `1:05.32PB`.
fn cell_text(cell: ElementRef<'_>) -> String {
    cell.text().map(str::trim).collect()
}

/// Drop a trailing `PB` or `NT` annotation so an annotated time merges with
/// the same swim listed without one. A bare annotation is left alone.
fn time_text(raw: &str) -> &str {
    let mut time = raw;
    while let Some(rest) = TIME_ANNOTATIONS
        .iter()
        .find_map(|marker| time.strip_suffix(marker))
    {
        time = rest.trim_end();
    }
    if time.is_empty() {
        raw
    } else {
        time
    }
}
