// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Swim records, events and personal bests.

use crate::time_utils::{parse_race_time, season_for};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Distances (in metres) the site publishes results for.
pub const VALID_DISTANCES: [u16; 7] = [25, 50, 100, 200, 400, 800, 1500];

/// Swimming stroke, in the order events are listed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Stroke {
    Freestyle,
    Backstroke,
    Breaststroke,
    Butterfly,
    #[serde(rename = "Individual Medley")]
    IndividualMedley,
}

impl Stroke {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stroke::Freestyle => "Freestyle",
            Stroke::Backstroke => "Backstroke",
            Stroke::Breaststroke => "Breaststroke",
            Stroke::Butterfly => "Butterfly",
            Stroke::IndividualMedley => "Individual Medley",
        }
    }
}

impl fmt::Display for Stroke {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pool length: 25m (short course) or 50m (long course).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PoolType {
    #[serde(rename = "SC")]
    ShortCourse,
    #[serde(rename = "LC")]
    LongCourse,
}

impl PoolType {
    /// Two-letter code used in storage and API responses.
    pub fn code(&self) -> &'static str {
        match self {
            PoolType::ShortCourse => "SC",
            PoolType::LongCourse => "LC",
        }
    }

    /// Course letter the detail page expects in its `tcourse` parameter.
    pub fn course_letter(&self) -> char {
        match self {
            PoolType::ShortCourse => 'S',
            PoolType::LongCourse => 'L',
        }
    }
}

impl fmt::Display for PoolType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Which round of a meet a swim was in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoundType {
    #[serde(rename = "F")]
    Finals,
    #[serde(rename = "H")]
    Heats,
    #[serde(rename = "SF")]
    SemiFinals,
    #[serde(rename = "P")]
    Preliminary,
}

impl RoundType {
    /// Map the round column of a detail table. Unknown codes are finals.
    pub fn from_code(code: &str) -> Self {
        match code.trim().to_uppercase().as_str() {
            "H" => RoundType::Heats,
            "SF" => RoundType::SemiFinals,
            "P" => RoundType::Preliminary,
            _ => RoundType::Finals,
        }
    }
}

/// A competitive event: stroke, distance and pool length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventKey {
    pub stroke: Stroke,
    pub distance: u16,
    pub pool_type: PoolType,
}

impl EventKey {
    pub fn new(stroke: Stroke, distance: u16, pool_type: PoolType) -> Self {
        Self {
            stroke,
            distance,
            pool_type,
        }
    }
}

impl fmt::Display for EventKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} ({})", self.distance, self.stroke, self.pool_type)
    }
}

/// The per-race columns common to summary and detail tables.
#[derive(Debug, Clone, PartialEq)]
pub struct RaceResult {
    pub time: String,
    pub wa_points: Option<u32>,
    pub round_type: RoundType,
    pub meet_date: NaiveDate,
    pub meet_name: String,
    pub venue: String,
}

/// A single swim by a swimmer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwimRecord {
    /// Swimmer's tiref (owner)
    pub tiref: String,
    /// Event name as printed by the site (e.g. "50 Freestyle")
    pub event_name: String,
    pub stroke: Stroke,
    /// Distance in metres
    pub distance: u16,
    pub pool_type: PoolType,
    /// Time as printed (e.g. "1:05.32" or "DQ")
    pub time: String,
    /// `time` in seconds, absent for status times
    pub time_seconds: Option<f64>,
    pub wa_points: Option<u32>,
    pub ranking: Option<u32>,
    pub meet_date: NaiveDate,
    pub venue: String,
    pub meet_name: String,
    pub round_type: RoundType,
    /// Season label, e.g. "2024-2025"
    pub season: String,
}

impl SwimRecord {
    /// Build a record, deriving `time_seconds` and `season`.
    pub fn new(tiref: &str, event_name: &str, key: EventKey, race: RaceResult) -> Self {
        Self {
            tiref: tiref.to_string(),
            event_name: event_name.to_string(),
            stroke: key.stroke,
            distance: key.distance,
            pool_type: key.pool_type,
            time_seconds: parse_race_time(&race.time),
            time: race.time,
            wa_points: race.wa_points,
            ranking: None,
            season: season_for(race.meet_date),
            meet_date: race.meet_date,
            venue: race.venue,
            meet_name: race.meet_name,
            round_type: race.round_type,
        }
    }

    pub fn event_key(&self) -> EventKey {
        EventKey::new(self.stroke, self.distance, self.pool_type)
    }

    /// Key used to merge harvests from several pages.
    ///
    /// Round type and points are deliberately absent, so a heat and a final
    /// swum in the same time at the same meet on the same day collapse.
    pub fn merge_key(&self) -> (EventKey, &str, NaiveDate, &str) {
        (
            self.event_key(),
            self.time.as_str(),
            self.meet_date,
            self.meet_name.as_str(),
        )
    }

    /// Stable document id for storage; includes the venue.
    pub fn storage_id(&self) -> String {
        let raw = format!(
            "{}|{}|{}|{}|{}|{}|{}|{}",
            self.tiref,
            self.stroke,
            self.distance,
            self.pool_type,
            self.time,
            self.meet_date,
            self.venue,
            self.meet_name
        );
        urlencoding::encode(&raw).into_owned()
    }
}

/// Fastest swim for one event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonalBest {
    pub tiref: String,
    pub event_name: String,
    pub stroke: Stroke,
    pub distance: u16,
    pub pool_type: PoolType,
    pub best_time: String,
    pub best_time_seconds: f64,
    pub wa_points: Option<u32>,
    pub meet_date: NaiveDate,
    pub venue: String,
    pub meet_name: String,
    pub round_type: RoundType,
}

impl PersonalBest {
    /// Returns `None` for a record without a numeric time.
    pub fn from_record(record: &SwimRecord) -> Option<Self> {
        Some(Self {
            best_time_seconds: record.time_seconds?,
            tiref: record.tiref.clone(),
            event_name: record.event_name.clone(),
            stroke: record.stroke,
            distance: record.distance,
            pool_type: record.pool_type,
            best_time: record.time.clone(),
            wa_points: record.wa_points,
            meet_date: record.meet_date,
            venue: record.venue.clone(),
            meet_name: record.meet_name.clone(),
            round_type: record.round_type,
        })
    }

    pub fn event_key(&self) -> EventKey {
        EventKey::new(self.stroke, self.distance, self.pool_type)
    }

    /// Document id: one personal best per swimmer and event.
    pub fn storage_id(&self) -> String {
        format!(
            "{}_{}_{}_{}",
            self.tiref,
            urlencoding::encode(self.stroke.as_str()),
            self.distance,
            self.pool_type
        )
    }
}
