// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for the application.

pub mod record;
pub mod stats;
pub mod swimmer;

pub use record::{
    EventKey, PersonalBest, PoolType, RaceResult, RoundType, Stroke, SwimRecord, VALID_DISTANCES,
};
pub use stats::{improvement_for, personal_best_cards, Improvement, PersonalBestCard, SwimmerStats, Trend};
pub use swimmer::{CacheMetadata, SwimmerIdentity};
