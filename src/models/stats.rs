// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Swimmer statistics computed from the stored race history.
//!
//! Cheap enough to recompute on every profile request, so nothing here is
//! persisted.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashSet;

use crate::models::{PoolType, RoundType, Stroke, SwimRecord};

/// Aggregate view over all of a swimmer's records.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SwimmerStats {
    // ─── Totals ──────────────────────────────────────────────────
    /// Number of stored swims
    pub total_races: u32,
    /// Distinct (stroke, distance, pool) events swum
    pub total_events: u32,
    /// Events with a numeric best time
    pub personal_bests: u32,

    // ─── Favourites ──────────────────────────────────────────────
    /// Most frequently swum stroke
    pub favorite_stroke: Option<Stroke>,
    /// Most frequently swum distance (metres)
    pub favorite_distance: Option<u16>,

    // ─── Time Span ───────────────────────────────────────────────
    pub first_race_date: Option<NaiveDate>,
    pub last_race_date: Option<NaiveDate>,
    /// Distinct calendar years with at least one race
    pub years_active: u32,

    // ─── Seasons ─────────────────────────────────────────────────
    /// Seasons with at least one race, most recent first
    pub seasons_competed: Vec<String>,
    pub current_season: Option<String>,

    // ─── Points ──────────────────────────────────────────────────
    /// Mean points over swims that carry points
    pub average_wa_points: Option<f64>,
}

impl SwimmerStats {
    pub fn from_records(records: &[SwimRecord]) -> Self {
        if records.is_empty() {
            return Self::default();
        }

        let mut events = HashSet::new();
        let mut timed_events = HashSet::new();
        let mut years = HashSet::new();
        let mut seasons = HashSet::new();
        let mut stroke_counts: Vec<(Stroke, u32)> = Vec::new();
        let mut distance_counts: Vec<(u16, u32)> = Vec::new();
        let mut points_sum = 0u64;
        let mut points_count = 0u32;

        for record in records {
            events.insert(record.event_key());
            if record.time_seconds.is_some() {
                timed_events.insert(record.event_key());
            }
            years.insert(chrono::Datelike::year(&record.meet_date));
            seasons.insert(record.season.clone());
            bump(&mut stroke_counts, record.stroke);
            bump(&mut distance_counts, record.distance);

            if let Some(points) = record.wa_points.filter(|p| *p > 0) {
                points_sum += u64::from(points);
                points_count += 1;
            }
        }

        let mut seasons_competed: Vec<String> = seasons.into_iter().collect();
        seasons_competed.sort_by(|a, b| b.cmp(a));

        Self {
            total_races: records.len() as u32,
            total_events: events.len() as u32,
            personal_bests: timed_events.len() as u32,
            favorite_stroke: most_frequent(&stroke_counts),
            favorite_distance: most_frequent(&distance_counts),
            first_race_date: records.iter().map(|r| r.meet_date).min(),
            last_race_date: records.iter().map(|r| r.meet_date).max(),
            years_active: years.len() as u32,
            current_season: seasons_competed.first().cloned(),
            seasons_competed,
            average_wa_points: (points_count > 0)
                .then(|| points_sum as f64 / f64::from(points_count)),
        }
    }
}

// ─── Per-event cards ─────────────────────────────────────────

/// Direction of the most recent swims in an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Improving,
    Declining,
    Stable,
}

/// Time dropped in an event, in seconds. Positive means faster.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Improvement {
    /// Previous swim minus latest swim
    pub recent_improvement: f64,
    /// First swim minus latest swim
    pub all_time_improvement: f64,
    pub trend: Trend,
}

impl Default for Improvement {
    fn default() -> Self {
        Self {
            recent_improvement: 0.0,
            all_time_improvement: 0.0,
            trend: Trend::Stable,
        }
    }
}

/// Improvement over one event's swims, oldest to newest by meet date.
///
/// Status times (DQ, NS, ...) are ignored. With three or more timed swims
/// the trend needs the last three to move strictly one way; with exactly
/// two, any drop counts as improving.
pub fn improvement_for(records: &[&SwimRecord]) -> Improvement {
    let mut timed: Vec<(NaiveDate, f64)> = records
        .iter()
        .filter_map(|r| r.time_seconds.map(|t| (r.meet_date, t)))
        .collect();
    if timed.len() < 2 {
        return Improvement::default();
    }
    timed.sort_by_key(|(date, _)| *date);

    let times: Vec<f64> = timed.into_iter().map(|(_, t)| t).collect();
    let latest = times[times.len() - 1];
    let recent = times[times.len() - 2] - latest;
    let all_time = times[0] - latest;

    let trend = match times.as_slice() {
        [.., a, b, c] if a > b && b > c => Trend::Improving,
        [.., a, b, c] if a < b && b < c => Trend::Declining,
        [_, _, _, ..] => Trend::Stable,
        _ if recent > 0.0 => Trend::Improving,
        _ => Trend::Stable,
    };

    Improvement {
        recent_improvement: round_hundredths(recent),
        all_time_improvement: round_hundredths(all_time),
        trend,
    }
}

fn round_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// One pool's best swim on a card.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CardTime {
    pub time: String,
    pub time_seconds: f64,
    pub pool_type: PoolType,
    pub date: NaiveDate,
    pub meet_name: String,
    pub venue: String,
    pub wa_points: Option<u32>,
    pub round_type: RoundType,
}

impl CardTime {
    fn from_record(record: &SwimRecord, time_seconds: f64) -> Self {
        Self {
            time: record.time.clone(),
            time_seconds,
            pool_type: record.pool_type,
            date: record.meet_date,
            meet_name: record.meet_name.clone(),
            venue: record.venue.clone(),
            wa_points: record.wa_points,
            round_type: record.round_type,
        }
    }
}

/// A stroke and distance across both pool lengths.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PersonalBestCard {
    pub event_name: String,
    pub stroke: Stroke,
    pub distance: u16,
    /// The faster of the long and short course bests
    pub primary_best: CardTime,
    /// The other pool's best, when both were swum
    pub secondary_best: Option<CardTime>,
    pub improvement: Improvement,
    pub total_races: u32,
    /// Most recent first
    pub seasons_competed: Vec<String>,
}

/// Build one card per stroke and distance with at least one timed swim,
/// ordered by stroke then distance. Long course wins an exact tie.
pub fn personal_best_cards(records: &[SwimRecord]) -> Vec<PersonalBestCard> {
    let mut groups: Vec<((Stroke, u16), Vec<&SwimRecord>)> = Vec::new();
    for record in records {
        let key = (record.stroke, record.distance);
        match groups.iter_mut().find(|(k, _)| *k == key) {
            Some((_, list)) => list.push(record),
            None => groups.push((key, vec![record])),
        }
    }

    let mut cards: Vec<PersonalBestCard> = groups
        .into_iter()
        .filter_map(|((stroke, distance), list)| {
            let long = fastest_in(&list, PoolType::LongCourse);
            let short = fastest_in(&list, PoolType::ShortCourse);
            let (primary, secondary) = match (long, short) {
                (Some(lc), Some(sc)) if sc.time_seconds < lc.time_seconds => (sc, Some(lc)),
                (Some(lc), sc) => (lc, sc),
                (None, Some(sc)) => (sc, None),
                (None, None) => return None,
            };

            let mut seasons: Vec<String> = list
                .iter()
                .map(|r| r.season.clone())
                .collect::<HashSet<_>>()
                .into_iter()
                .collect();
            seasons.sort_by(|a, b| b.cmp(a));

            Some(PersonalBestCard {
                event_name: format!("{} {}", distance, stroke),
                stroke,
                distance,
                primary_best: primary,
                secondary_best: secondary,
                improvement: improvement_for(&list),
                total_races: list.len() as u32,
                seasons_competed: seasons,
            })
        })
        .collect();

    cards.sort_by_key(|card| (card.stroke, card.distance));
    cards
}

/// Fastest timed swim in one pool length. Ties go to the first seen.
fn fastest_in(records: &[&SwimRecord], pool_type: PoolType) -> Option<CardTime> {
    let mut best: Option<(&SwimRecord, f64)> = None;
    for record in records.iter().filter(|r| r.pool_type == pool_type) {
        let Some(seconds) = record.time_seconds else {
            continue;
        };
        if best.map_or(true, |(_, fastest)| seconds < fastest) {
            best = Some((*record, seconds));
        }
    }
    best.map(|(record, seconds)| CardTime::from_record(record, seconds))
}

/// Frequency counts kept in first-seen order so ties resolve stably.
fn bump<T: PartialEq>(counts: &mut Vec<(T, u32)>, value: T) {
    match counts.iter_mut().find(|(v, _)| *v == value) {
        Some((_, n)) => *n += 1,
        None => counts.push((value, 1)),
    }
}

fn most_frequent<T: Copy>(counts: &[(T, u32)]) -> Option<T> {
    let mut best: Option<(T, u32)> = None;
    for &(value, n) in counts {
        if best.map_or(true, |(_, top)| n > top) {
            best = Some((value, n));
        }
    }
    best.map(|(value, _)| value)
}
