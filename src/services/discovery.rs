// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Event discovery: which detail pages to fetch for a swimmer.

use crate::models::{EventKey, Stroke, SwimRecord};

/// Path of the per-event race history page.
pub const DETAIL_PATH: &str = "/individualbest/personal_best_time_date.php";

/// Query parameters that select one event on the detail page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchCoordinates {
    /// The site's numeric code for a stroke/distance pair
    pub stroke_code: u8,
    /// 'L' or 'S'
    pub course: char,
}

/// A detail page to fetch, and the event its rows belong to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventTarget {
    pub key: EventKey,
    pub event_name: String,
    pub coordinates: FetchCoordinates,
}

impl EventTarget {
    /// Query string for the detail page, in the order the site emits it.
    pub fn query(&self, tiref: &str) -> Vec<(&'static str, String)> {
        vec![
            ("back", "individualbest".to_string()),
            ("tiref", tiref.to_string()),
            ("mode", "A".to_string()),
            ("tstroke", self.coordinates.stroke_code.to_string()),
            ("tcourse", self.coordinates.course.to_string()),
        ]
    }
}

/// The site's stroke code for an event, if it has a detail page.
pub fn stroke_code(stroke: Stroke, distance: u16) -> Option<u8> {
    let code = match (stroke, distance) {
        (Stroke::Freestyle, 50) => 1,
        (Stroke::Freestyle, 100) => 2,
        (Stroke::Freestyle, 200) => 3,
        (Stroke::Freestyle, 400) => 4,
        (Stroke::Freestyle, 800) => 5,
        (Stroke::Freestyle, 1500) => 6,
        (Stroke::Breaststroke, 50) => 7,
        (Stroke::Breaststroke, 100) => 8,
        (Stroke::Breaststroke, 200) => 9,
        (Stroke::Butterfly, 50) => 10,
        (Stroke::Butterfly, 100) => 11,
        (Stroke::Butterfly, 200) => 12,
        (Stroke::Backstroke, 50) => 13,
        (Stroke::Backstroke, 100) => 14,
        (Stroke::Backstroke, 200) => 15,
        (Stroke::IndividualMedley, 200) => 16,
        (Stroke::IndividualMedley, 400) => 17,
        (Stroke::IndividualMedley, 100) => 18,
        _ => return None,
    };
    Some(code)
}

/// Distinct events in first-occurrence order. Events without a stroke code
/// (25m swims, 800 backstroke, ...) have no detail page and are dropped.
pub fn derive_events(records: &[SwimRecord]) -> Vec<EventTarget> {
    let mut targets: Vec<EventTarget> = Vec::new();
    for record in records {
        let key = record.event_key();
        if targets.iter().any(|t| t.key == key) {
            continue;
        }
        let Some(stroke_code) = stroke_code(key.stroke, key.distance) else {
            tracing::debug!(event = %key, "No detail page for event");
            continue;
        };
        targets.push(EventTarget {
            key,
            event_name: record.event_name.clone(),
            coordinates: FetchCoordinates {
                stroke_code,
                course: key.pool_type.course_letter(),
            },
        });
    }
    targets
}
