// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Swimmer identity and per-swimmer cache metadata.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Swimmer profile as extracted from the results site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwimmerIdentity {
    /// Membership number on the results site (also used as document ID)
    pub tiref: String,
    /// Display name
    pub name: String,
    /// Club, when the page shows one
    pub club: Option<String>,
    /// When this profile was last refreshed from the site
    pub last_updated: DateTime<Utc>,
}

impl SwimmerIdentity {
    /// Placeholder identity used when no page yields a name.
    pub fn synthetic(tiref: &str, now: DateTime<Utc>) -> Self {
        Self {
            tiref: tiref.to_string(),
            name: format!("Swimmer {}", tiref),
            club: None,
            last_updated: now,
        }
    }
}

/// Outcome of the last fetch attempt for a swimmer.
///
/// Overwritten on every attempt, successful or not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheMetadata {
    pub tiref: String,
    pub last_scraped: DateTime<Utc>,
    pub records_count: u32,
    pub scrape_success: bool,
    #[serde(default)]
    pub error_message: Option<String>,
}

impl CacheMetadata {
    pub fn success(tiref: &str, at: DateTime<Utc>, records_count: u32) -> Self {
        Self {
            tiref: tiref.to_string(),
            last_scraped: at,
            records_count,
            scrape_success: true,
            error_message: None,
        }
    }

    pub fn failure(tiref: &str, at: DateTime<Utc>, error: impl Into<String>) -> Self {
        Self {
            tiref: tiref.to_string(),
            last_scraped: at,
            records_count: 0,
            scrape_success: false,
            error_message: Some(error.into()),
        }
    }
}
