// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Swimmer sync service.
//!
//! Handles the core workflow:
//! 1. Decide from cache metadata whether stored data can be served
//! 2. Fetch and validate the summary page, extract the identity
//! 3. Discover events and fetch each detail page in turn
//! 4. Reconcile everything into one record set
//! 5. Store identity, records and personal bests, then cache metadata

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::db::SwimStore;
use crate::error::{AppError, Result};
use crate::models::{
    personal_best_cards, CacheMetadata, PersonalBest, PersonalBestCard, SwimRecord,
    SwimmerIdentity, SwimmerStats,
};
use crate::services::discovery::{derive_events, DETAIL_PATH};
use crate::services::fetcher::{FetchError, Fetcher, HttpTransport};
use crate::services::freshness::{can_serve_cached, classify, CacheState, Clock};
use crate::services::identity::{page_indicates_swimmer, PageKind, STRATEGIES};
use crate::services::points::estimate_points;
use crate::services::reconcile::{compute_personal_bests, reconcile};
use crate::services::tables::{parse_detail_page, parse_summary_page};

/// Best-times page, also used to validate a tiref.
pub const SUMMARY_PATH: &str = "/individualbest/personal_best.php";
/// Biography page, consulted only when the summary page yields no name.
pub const BIOGRAPHY_PATH: &str = "/biogs/biogs_details.php";

const MIN_TIREF_LEN: usize = 4;
const MAX_TIREF_LEN: usize = 8;

/// Result of a sync request.
#[derive(Debug, Clone, Serialize)]
pub struct SyncOutcome {
    pub identity: SwimmerIdentity,
    pub records: Vec<SwimRecord>,
    /// Records added by this sync (0 when served from cache)
    pub new_records: usize,
    pub from_cache: bool,
    pub success: bool,
    pub message: String,
}

/// A personal best with an approximate points figure attached.
#[derive(Debug, Clone, Serialize)]
pub struct PersonalBestView {
    #[serde(flatten)]
    pub best: PersonalBest,
    /// Approximation only, not an official score
    pub estimated_points: u32,
}

/// Everything stored for a swimmer.
#[derive(Debug, Clone, Serialize)]
pub struct SwimmerProfile {
    pub identity: SwimmerIdentity,
    pub records: Vec<SwimRecord>,
    pub personal_bests: Vec<PersonalBestView>,
    pub stats: SwimmerStats,
    pub cache: Option<CacheMetadata>,
}

/// Per-event cards pairing long and short course bests.
#[derive(Debug, Clone, Serialize)]
pub struct PersonalBestCards {
    pub tiref: String,
    pub swimmer_name: String,
    pub personal_bests: Vec<PersonalBestCard>,
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CacheInfo {
    pub tiref: String,
    pub state: CacheState,
    pub ttl_hours: u64,
    pub metadata: Option<CacheMetadata>,
}

/// Keeps stored swimmer data in step with the results site.
pub struct SwimmerService<S, T> {
    store: S,
    fetcher: Fetcher<T>,
    clock: Arc<dyn Clock>,
    base_url: String,
    cache_ttl: Duration,
}

impl<S: SwimStore, T: HttpTransport> SwimmerService<S, T> {
    pub fn new(
        store: S,
        fetcher: Fetcher<T>,
        clock: Arc<dyn Clock>,
        base_url: impl Into<String>,
        cache_ttl: Duration,
    ) -> Self {
        Self {
            store,
            fetcher,
            clock,
            base_url: base_url.into(),
            cache_ttl,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn fetcher(&self) -> &Fetcher<T> {
        &self.fetcher
    }

    /// Format check only: 4 to 8 ASCII digits. Never touches the network.
    pub fn validate_external_id(tiref: &str) -> bool {
        (MIN_TIREF_LEN..=MAX_TIREF_LEN).contains(&tiref.len())
            && tiref.chars().all(|c| c.is_ascii_digit())
    }

    fn ensure_valid(tiref: &str) -> Result<()> {
        if Self::validate_external_id(tiref) {
            Ok(())
        } else {
            Err(AppError::InvalidIdentifier(tiref.to_string()))
        }
    }

    /// Whether the results site knows this swimmer. Fetch failures count
    /// as "no".
    pub async fn check_exists(&self, tiref: &str) -> Result<bool> {
        Self::ensure_valid(tiref)?;
        match self.fetch_summary(tiref).await {
            Ok(page) => Ok(page_indicates_swimmer(&page)),
            Err(e) => {
                tracing::warn!(tiref, error = %e, "Validation fetch failed");
                Ok(false)
            }
        }
    }

    /// Serve stored data if fresh, otherwise run a full fetch cycle.
    pub async fn sync_swimmer(&self, tiref: &str, force: bool) -> Result<SyncOutcome> {
        Self::ensure_valid(tiref)?;

        let now = self.clock.now();
        let meta = self.store.get_cache_metadata(tiref).await?;
        let state = classify(meta.as_ref(), now, self.cache_ttl);
        let stored_identity = self.store.get_identity(tiref).await?;

        if let Some(identity) = stored_identity
            .as_ref()
            .filter(|_| can_serve_cached(force, state, true))
        {
            tracing::info!(tiref, "Serving swimmer from cache");
            return Ok(SyncOutcome {
                identity: identity.clone(),
                records: self.store.get_records(tiref, None).await?,
                new_records: 0,
                from_cache: true,
                success: true,
                message: "Served from cache".to_string(),
            });
        }

        tracing::info!(tiref, force, state = ?state, "Starting sync cycle");
        match self.run_cycle(tiref).await {
            Ok((identity, records)) => self.persist(identity, records).await,
            Err(err @ (AppError::NotFound(_) | AppError::Transport(_))) => {
                let message = err.to_string();
                tracing::warn!(tiref, error = %message, "Sync cycle failed");
                self.store
                    .put_cache_metadata(&CacheMetadata::failure(tiref, self.clock.now(), &message))
                    .await?;

                match stored_identity {
                    Some(identity) => Ok(SyncOutcome {
                        identity,
                        records: self.store.get_records(tiref, None).await?,
                        new_records: 0,
                        from_cache: true,
                        success: false,
                        message,
                    }),
                    None => Err(err),
                }
            }
            Err(err) => Err(err),
        }
    }

    /// Fetch, parse and reconcile. Touches no storage.
    async fn run_cycle(&self, tiref: &str) -> Result<(SwimmerIdentity, Vec<SwimRecord>)> {
        let summary = self.fetch_summary(tiref).await.map_err(|e| match e {
            FetchError::Status { status: 404, .. } => {
                AppError::NotFound(format!("Swimmer {} not found", tiref))
            }
            other => other.into(),
        })?;
        if !page_indicates_swimmer(&summary) {
            return Err(AppError::NotFound(format!("Swimmer {} not found", tiref)));
        }

        let identity = self.extract_identity(tiref, &summary).await;

        let summary_harvest = parse_summary_page(tiref, &summary);
        if !summary_harvest.skipped.is_empty() {
            tracing::debug!(
                tiref,
                skipped = summary_harvest.skipped.len(),
                reasons = ?summary_harvest.skipped,
                "Skipped summary rows"
            );
        }

        let targets = derive_events(&summary_harvest.records);
        tracing::info!(
            tiref,
            summary_rows = summary_harvest.records.len(),
            events = targets.len(),
            "Discovered events"
        );

        let detail_url = format!("{}{}", self.base_url, DETAIL_PATH);
        let mut harvested = Vec::new();
        for target in &targets {
            let page = match self.fetcher.fetch(&detail_url, &target.query(tiref)).await {
                Ok(page) => page,
                Err(e) => {
                    tracing::warn!(tiref, event = %target.key, error = %e, "Skipping event history");
                    continue;
                }
            };
            let harvest = parse_detail_page(tiref, target.key, &target.event_name, &page);
            tracing::debug!(
                tiref,
                event = %target.key,
                rows = harvest.records.len(),
                skipped = harvest.skipped.len(),
                "Parsed event history"
            );
            harvested.extend(harvest.records);
        }

        // Detail rows carry the real round and go first so they win the merge.
        harvested.extend(summary_harvest.records);
        let records = reconcile(harvested);

        Ok((identity, records))
    }

    async fn fetch_summary(&self, tiref: &str) -> std::result::Result<String, FetchError> {
        let url = format!("{}{}", self.base_url, SUMMARY_PATH);
        self.fetcher
            .fetch(&url, &[("mode", "A".to_string()), ("tiref", tiref.to_string())])
            .await
    }

    async fn extract_identity(&self, tiref: &str, summary: &str) -> SwimmerIdentity {
        let mut biography: Option<Option<String>> = None;

        for strategy in STRATEGIES.iter() {
            let page = match strategy.page() {
                PageKind::Summary => Some(summary),
                PageKind::Biography => {
                    if biography.is_none() {
                        biography = Some(self.fetch_biography(tiref).await);
                    }
                    biography.as_ref().and_then(|b| b.as_deref())
                }
            };
            let Some(found) = page.and_then(|html| strategy.extract(tiref, html)) else {
                continue;
            };

            tracing::debug!(tiref, strategy = strategy.name(), "Extracted swimmer identity");
            return SwimmerIdentity {
                tiref: tiref.to_string(),
                name: found.name,
                club: found.club,
                last_updated: self.clock.now(),
            };
        }

        tracing::info!(tiref, "No name found, using placeholder");
        SwimmerIdentity::synthetic(tiref, self.clock.now())
    }

    async fn fetch_biography(&self, tiref: &str) -> Option<String> {
        let url = format!("{}{}", self.base_url, BIOGRAPHY_PATH);
        match self.fetcher.fetch(&url, &[("tiref", tiref.to_string())]).await {
            Ok(page) => Some(page),
            Err(e) => {
                tracing::warn!(tiref, error = %e, "Biography page unavailable");
                None
            }
        }
    }

    /// Write a successful cycle. Cache metadata goes last so that a
    /// partial write still reads as stale.
    async fn persist(
        &self,
        identity: SwimmerIdentity,
        records: Vec<SwimRecord>,
    ) -> Result<SyncOutcome> {
        let tiref = identity.tiref.clone();

        self.store.save_identity(&identity).await?;
        let new_records = self.store.save_records(&tiref, &records).await?;
        let stored = self.store.get_records(&tiref, None).await?;
        let bests = compute_personal_bests(&stored);
        self.store.replace_personal_bests(&tiref, &bests).await?;
        self.store
            .put_cache_metadata(&CacheMetadata::success(
                &tiref,
                self.clock.now(),
                records.len() as u32,
            ))
            .await?;

        tracing::info!(
            tiref,
            fetched = records.len(),
            new_records,
            personal_bests = bests.len(),
            "Sync complete"
        );

        Ok(SyncOutcome {
            identity,
            message: format!("Fetched {} records ({} new)", records.len(), new_records),
            records: stored,
            new_records,
            from_cache: false,
            success: true,
        })
    }

    pub async fn list_known_swimmers(&self) -> Result<Vec<SwimmerIdentity>> {
        self.store.list_identities().await
    }

    pub async fn get_swimmer(&self, tiref: &str) -> Result<SwimmerIdentity> {
        Self::ensure_valid(tiref)?;
        self.store
            .get_identity(tiref)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Swimmer {} not found", tiref)))
    }

    pub async fn records(&self, tiref: &str, limit: Option<usize>) -> Result<Vec<SwimRecord>> {
        self.get_swimmer(tiref).await?;
        self.store.get_records(tiref, limit).await
    }

    pub async fn personal_bests(&self, tiref: &str) -> Result<Vec<PersonalBestView>> {
        self.get_swimmer(tiref).await?;
        Ok(with_estimates(self.store.get_personal_bests(tiref).await?))
    }

    /// Rebuild personal bests from every stored record. Returns how many
    /// events have a best.
    pub async fn recompute_personal_bests(&self, tiref: &str) -> Result<usize> {
        self.get_swimmer(tiref).await?;
        let records = self.store.get_records(tiref, None).await?;
        let bests = compute_personal_bests(&records);
        self.store.replace_personal_bests(tiref, &bests).await?;
        tracing::info!(tiref, count = bests.len(), "Personal bests recomputed");
        Ok(bests.len())
    }

    /// Cards are built from stored records, not the stored bests, so both
    /// pool lengths and the improvement trend are always current.
    pub async fn personal_best_cards(&self, tiref: &str) -> Result<PersonalBestCards> {
        let identity = self.get_swimmer(tiref).await?;
        let records = self.store.get_records(tiref, None).await?;

        Ok(PersonalBestCards {
            tiref: identity.tiref,
            swimmer_name: identity.name,
            personal_bests: personal_best_cards(&records),
            last_updated: identity.last_updated,
        })
    }

    pub async fn swimmer_profile(&self, tiref: &str) -> Result<SwimmerProfile> {
        let identity = self.get_swimmer(tiref).await?;
        let records = self.store.get_records(tiref, None).await?;
        let personal_bests = with_estimates(self.store.get_personal_bests(tiref).await?);
        let cache = self.store.get_cache_metadata(tiref).await?;

        Ok(SwimmerProfile {
            identity,
            stats: SwimmerStats::from_records(&records),
            records,
            personal_bests,
            cache,
        })
    }

    pub async fn cache_info(&self, tiref: &str) -> Result<CacheInfo> {
        Self::ensure_valid(tiref)?;
        let metadata = self.store.get_cache_metadata(tiref).await?;
        Ok(CacheInfo {
            tiref: tiref.to_string(),
            state: classify(metadata.as_ref(), self.clock.now(), self.cache_ttl),
            ttl_hours: self.cache_ttl.as_secs() / 3600,
            metadata,
        })
    }

    /// Delete all stored data for a swimmer. Returns documents removed.
    pub async fn delete_swimmer(&self, tiref: &str) -> Result<usize> {
        Self::ensure_valid(tiref)?;
        let deleted = self.store.delete_all(tiref).await?;
        if deleted == 0 {
            return Err(AppError::NotFound(format!("Swimmer {} not found", tiref)));
        }
        Ok(deleted)
    }
}

fn with_estimates(bests: Vec<PersonalBest>) -> Vec<PersonalBestView> {
    bests
        .into_iter()
        .map(|best| PersonalBestView {
            estimated_points: estimate_points(best.best_time_seconds, best.event_key()),
            best,
        })
        .collect()
}
