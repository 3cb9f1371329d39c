// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time formatting and for the date, race time and
//! season conventions used by the results site.

use chrono::{DateTime, Datelike, NaiveDate, SecondsFormat, Utc};

/// Format a UTC timestamp as RFC3339 using a `Z` suffix.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Separators of the numeric day/month/year layouts. Two-digit years are
/// expanded by hand so the century pivot is ours rather than chrono's.
const SHORT_YEAR_SEPARATORS: &[char] = &['/', '-'];

/// Remaining layouts, tried after the numeric day/month ones.
const LONG_YEAR_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%d %b %Y",
    "%d %B %Y",
    "%b %d, %Y",
    "%B %d, %Y",
];

/// Two-digit years below this are 20xx, the rest 19xx.
const CENTURY_PIVOT: i32 = 50;

/// Status markers that mean the swim has no time.
const NO_TIME_MARKERS: &[&str] = &["ns", "dq", "dns", "dnf"];

/// Parse a meet date as printed by the results site.
///
/// Day/month/two-digit-year is tried first since it is what the site
/// prints almost everywhere. Returns `None` if no layout matches.
pub fn parse_meet_date(raw: &str) -> Option<NaiveDate> {
    let text = raw.trim();
    if text.is_empty() {
        return None;
    }

    for &sep in SHORT_YEAR_SEPARATORS {
        if let Some(date) = parse_short_year(text, sep) {
            return Some(date);
        }
        let long = if sep == '/' { "%d/%m/%Y" } else { "%d-%m-%Y" };
        if let Ok(date) = NaiveDate::parse_from_str(text, long) {
            return Some(apply_century_pivot(date));
        }
    }

    LONG_YEAR_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
        .map(apply_century_pivot)
}

/// `dd{sep}mm{sep}yy` with exactly two year digits.
fn parse_short_year(text: &str, sep: char) -> Option<NaiveDate> {
    let parts: Vec<&str> = text.split(sep).collect();
    let [day, month, year] = parts.as_slice() else {
        return None;
    };
    if year.len() != 2 || !year.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let day: u32 = day.parse().ok()?;
    let month: u32 = month.parse().ok()?;
    let year: i32 = year.parse().ok()?;
    NaiveDate::from_ymd_opt(expand_two_digit_year(year), month, day)
}

fn expand_two_digit_year(year: i32) -> i32 {
    if year < CENTURY_PIVOT {
        2000 + year
    } else {
        1900 + year
    }
}

/// A layout such as `%d/%m/%Y` happily reads "25" as the year 25 AD.
fn apply_century_pivot(date: NaiveDate) -> NaiveDate {
    if date.year() < 100 {
        date.with_year(expand_two_digit_year(date.year()))
            .unwrap_or(date)
    } else {
        date
    }
}

/// Whether a time cell is a status (no swim, disqualified, ...) rather than a time.
pub fn is_status_time(raw: &str) -> bool {
    let lower = raw.to_lowercase();
    NO_TIME_MARKERS.iter().any(|marker| lower.contains(marker))
}

/// Convert a race time to seconds.
///
/// Accepts `SS.ss`, `M:SS.ss` and `H:MM:SS.ss`, with an optional `NT` or
/// `PB` annotation. Status times (`DQ`, `DNS`, ...) have no numeric value.
pub fn parse_race_time(raw: &str) -> Option<f64> {
    if raw.trim().is_empty() || is_status_time(raw) {
        return None;
    }

    let cleaned = raw.replace("NT", "").replace("PB", "");
    let cleaned = cleaned.trim();

    let seconds = if cleaned.contains(':') {
        let parts: Vec<&str> = cleaned.split(':').collect();
        match parts.as_slice() {
            [m, s] => m.trim().parse::<f64>().ok()? * 60.0 + s.trim().parse::<f64>().ok()?,
            [h, m, s] => {
                h.trim().parse::<f64>().ok()? * 3600.0
                    + m.trim().parse::<f64>().ok()? * 60.0
                    + s.trim().parse::<f64>().ok()?
            }
            _ => return None,
        }
    } else {
        cleaned.parse::<f64>().ok()?
    };

    seconds.is_finite().then_some(seconds)
}

/// Swimming season (September to August) a meet date belongs to.
pub fn season_for(date: NaiveDate) -> String {
    let year = date.year();
    if date.month() >= 9 {
        format!("{}-{}", year, year + 1)
    } else {
        format!("{}-{}", year - 1, year)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_short_year_dates() {
        assert_eq!(parse_meet_date("10/05/25"), Some(ymd(2025, 5, 10)));
        assert_eq!(parse_meet_date("10/05/70"), Some(ymd(1970, 5, 10)));
        assert_eq!(parse_meet_date("01/12/49"), Some(ymd(2049, 12, 1)));
        assert_eq!(parse_meet_date("01/12/50"), Some(ymd(1950, 12, 1)));
        assert_eq!(parse_meet_date("10-05-25"), Some(ymd(2025, 5, 10)));
    }

    #[test]
    fn test_long_year_dates() {
        assert_eq!(parse_meet_date("10/05/2025"), Some(ymd(2025, 5, 10)));
        assert_eq!(parse_meet_date("10-05-2025"), Some(ymd(2025, 5, 10)));
        assert_eq!(parse_meet_date("2025-05-10"), Some(ymd(2025, 5, 10)));
        assert_eq!(parse_meet_date("10 May 2025"), Some(ymd(2025, 5, 10)));
        assert_eq!(parse_meet_date("10 September 2024"), Some(ymd(2024, 9, 10)));
        assert_eq!(parse_meet_date("May 10, 2025"), Some(ymd(2025, 5, 10)));
        assert_eq!(parse_meet_date(" 10/05/25 "), Some(ymd(2025, 5, 10)));
    }

    #[test]
    fn test_unparseable_dates() {
        assert_eq!(parse_meet_date(""), None);
        assert_eq!(parse_meet_date("yesterday"), None);
        assert_eq!(parse_meet_date("32/01/25"), None);
        assert_eq!(parse_meet_date("10/13/25"), None);
    }

    #[test]
    fn test_race_times() {
        let close = |a: Option<f64>, b: f64| (a.expect("time should parse") - b).abs() < 1e-9;
        assert!(close(parse_race_time("1:05.32"), 65.32));
        assert!(close(parse_race_time("58.21"), 58.21));
        assert!(close(parse_race_time("2:01:05.00"), 7265.0));
        assert!(close(parse_race_time("PB 31.40"), 31.40));
        assert!(close(parse_race_time("NT1:10.00"), 70.0));
    }

    #[test]
    fn test_status_times_have_no_seconds() {
        for raw in ["DQ", "dns", "DNF", "NS", ""] {
            assert_eq!(parse_race_time(raw), None, "{raw:?}");
        }
        assert!(is_status_time("dq"));
        assert!(!is_status_time("1:05.32"));
    }

    #[test]
    fn test_malformed_times() {
        assert_eq!(parse_race_time("1:2:3:4"), None);
        assert_eq!(parse_race_time("abc"), None);
        assert_eq!(parse_race_time("1:xx"), None);
    }

    #[test]
    fn test_season_for() {
        assert_eq!(season_for(ymd(2024, 10, 1)), "2024-2025");
        assert_eq!(season_for(ymd(2024, 3, 1)), "2023-2024");
        assert_eq!(season_for(ymd(2024, 9, 1)), "2024-2025");
        assert_eq!(season_for(ymd(2024, 8, 31)), "2023-2024");
    }

    #[test]
    fn test_format_utc_rfc3339() {
        let date = DateTime::from_timestamp(1_704_103_200, 0).unwrap();
        assert_eq!(format_utc_rfc3339(date), "2024-01-01T10:00:00Z");
    }
}
