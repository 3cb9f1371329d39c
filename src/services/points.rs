// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Approximate points estimate for swims the site printed no points for.
//!
//! This is NOT the official scoring table. It scales against a hardcoded set
//! of long course men's reference times and exists only so charts have
//! something to plot. Never present it as an official score.

use crate::models::{EventKey, PoolType, Stroke};

/// Short course reference times are taken as this fraction of long course.
const SHORT_COURSE_FACTOR: f64 = 0.96;

const MIN_POINTS: i64 = 1;
const MAX_POINTS: i64 = 1500;

/// Long course reference times in seconds.
fn reference_time(stroke: Stroke, distance: u16) -> Option<f64> {
    let seconds = match (stroke, distance) {
        (Stroke::Freestyle, 50) => 20.91,
        (Stroke::Freestyle, 100) => 46.86,
        (Stroke::Freestyle, 200) => 104.00,
        (Stroke::Freestyle, 400) => 220.07,
        (Stroke::Freestyle, 800) => 458.17,
        (Stroke::Freestyle, 1500) => 871.02,
        (Stroke::Backstroke, 50) => 23.71,
        (Stroke::Backstroke, 100) => 51.60,
        (Stroke::Backstroke, 200) => 111.92,
        (Stroke::Breaststroke, 50) => 25.95,
        (Stroke::Breaststroke, 100) => 56.88,
        (Stroke::Breaststroke, 200) => 125.95,
        (Stroke::Butterfly, 50) => 22.27,
        (Stroke::Butterfly, 100) => 49.45,
        (Stroke::Butterfly, 200) => 110.73,
        (Stroke::IndividualMedley, 200) => 113.42,
        (Stroke::IndividualMedley, 400) => 240.54,
        _ => return None,
    };
    Some(seconds)
}

/// Estimate points for a time in seconds.
pub fn estimate_points(seconds: f64, key: EventKey) -> u32 {
    let Some(reference) = reference_time(key.stroke, key.distance) else {
        return (1000.0 - seconds * 10.0).max(MIN_POINTS as f64) as u32;
    };

    let reference = match key.pool_type {
        PoolType::ShortCourse => reference * SHORT_COURSE_FACTOR,
        PoolType::LongCourse => reference,
    };

    let points = if seconds <= reference {
        1000 + ((reference - seconds) * 50.0) as i64
    } else {
        (1000.0 * (reference / seconds).powi(3)) as i64
    };

    points.clamp(MIN_POINTS, MAX_POINTS) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lc(stroke: Stroke, distance: u16) -> EventKey {
        EventKey::new(stroke, distance, PoolType::LongCourse)
    }

    #[test]
    fn test_reference_time_scores_1000() {
        assert_eq!(estimate_points(20.91, lc(Stroke::Freestyle, 50)), 1000);
    }

    #[test]
    fn test_slower_time_cubic() {
        // (20.91 / 41.82)^3 = 0.125
        assert_eq!(estimate_points(41.82, lc(Stroke::Freestyle, 50)), 125);
    }

    #[test]
    fn test_short_course_is_harder() {
        let long = estimate_points(60.0, lc(Stroke::Butterfly, 100));
        let short = estimate_points(
            60.0,
            EventKey::new(Stroke::Butterfly, 100, PoolType::ShortCourse),
        );
        assert!(short < long);
    }

    #[test]
    fn test_clamped() {
        assert_eq!(estimate_points(1.0, lc(Stroke::Freestyle, 50)), 1500);
        assert_eq!(estimate_points(10_000.0, lc(Stroke::Freestyle, 1500)), 1);
    }

    #[test]
    fn test_unlisted_event_fallback() {
        assert_eq!(estimate_points(70.0, lc(Stroke::IndividualMedley, 100)), 300);
        assert_eq!(estimate_points(200.0, lc(Stroke::Freestyle, 25)), 1);
    }
}
