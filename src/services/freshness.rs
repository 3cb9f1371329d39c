// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Cache freshness: when stored data may be served without a fetch.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Mutex;
use std::time::Duration;

use crate::models::CacheMetadata;

/// Source of "now" for freshness decisions.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        if let Ok(mut guard) = self.now.lock() {
            *guard = now;
        }
    }

    pub fn advance(&self, by: chrono::Duration) {
        if let Ok(mut guard) = self.now.lock() {
            *guard += by;
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        match self.now.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

/// State of a swimmer's cached data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheState {
    /// Never attempted
    Unknown,
    /// Last attempt succeeded within the TTL
    Fresh,
    /// Last attempt failed or is older than the TTL
    Stale,
}

/// Classify cached data at `now`. An age of exactly `ttl` is stale.
pub fn classify(meta: Option<&CacheMetadata>, now: DateTime<Utc>, ttl: Duration) -> CacheState {
    let Some(meta) = meta else {
        return CacheState::Unknown;
    };
    if !meta.scrape_success {
        return CacheState::Stale;
    }
    let Ok(ttl) = chrono::Duration::from_std(ttl) else {
        return CacheState::Fresh;
    };
    if now - meta.last_scraped < ttl {
        CacheState::Fresh
    } else {
        CacheState::Stale
    }
}

/// Whether a sync request can be answered from the store alone.
pub fn can_serve_cached(force: bool, state: CacheState, has_identity: bool) -> bool {
    !force && state == CacheState::Fresh && has_identity
}
