// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-memory store for local runs and tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use dashmap::DashMap;

use crate::db::{sort_personal_bests, SwimStore};
use crate::error::{AppError, Result};
use crate::models::{CacheMetadata, PersonalBest, SwimRecord, SwimmerIdentity};

/// Swimmer data held in concurrent maps, keyed by tiref. Clones share state.
#[derive(Clone, Default)]
pub struct MemoryStore {
    swimmers: Arc<DashMap<String, SwimmerIdentity>>,
    records: Arc<DashMap<String, Vec<SwimRecord>>>,
    personal_bests: Arc<DashMap<String, Vec<PersonalBest>>>,
    cache_metadata: Arc<DashMap<String, CacheMetadata>>,
    fail_writes: Arc<AtomicBool>,
    fail_metadata_writes: Arc<AtomicBool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write fail with a database error.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Fail only cache metadata writes, leaving identity, records and
    /// personal bests writable.
    pub fn set_fail_metadata_writes(&self, fail: bool) {
        self.fail_metadata_writes.store(fail, Ordering::SeqCst);
    }

    fn check_writable(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(AppError::Database("memory store is read-only".to_string()));
        }
        Ok(())
    }
}

impl SwimStore for MemoryStore {
    async fn get_identity(&self, tiref: &str) -> Result<Option<SwimmerIdentity>> {
        Ok(self.swimmers.get(tiref).map(|s| s.value().clone()))
    }

    async fn save_identity(&self, identity: &SwimmerIdentity) -> Result<()> {
        self.check_writable()?;
        self.swimmers
            .insert(identity.tiref.clone(), identity.clone());
        Ok(())
    }

    async fn list_identities(&self) -> Result<Vec<SwimmerIdentity>> {
        let mut swimmers: Vec<SwimmerIdentity> =
            self.swimmers.iter().map(|e| e.value().clone()).collect();
        swimmers.sort_by(|a, b| b.last_updated.cmp(&a.last_updated));
        Ok(swimmers)
    }

    async fn get_records(&self, tiref: &str, limit: Option<usize>) -> Result<Vec<SwimRecord>> {
        let mut records = self
            .records
            .get(tiref)
            .map(|r| r.value().clone())
            .unwrap_or_default();
        records.sort_by(|a, b| b.meet_date.cmp(&a.meet_date));
        if let Some(limit) = limit {
            records.truncate(limit);
        }
        Ok(records)
    }

    async fn save_records(&self, tiref: &str, records: &[SwimRecord]) -> Result<usize> {
        self.check_writable()?;
        let mut stored = self.records.entry(tiref.to_string()).or_default();
        let mut inserted = 0;
        for record in records {
            let id = record.storage_id();
            if stored.iter().any(|r| r.storage_id() == id) {
                continue;
            }
            stored.push(record.clone());
            inserted += 1;
        }
        Ok(inserted)
    }

    async fn get_personal_bests(&self, tiref: &str) -> Result<Vec<PersonalBest>> {
        let mut bests = self
            .personal_bests
            .get(tiref)
            .map(|b| b.value().clone())
            .unwrap_or_default();
        sort_personal_bests(&mut bests);
        Ok(bests)
    }

    async fn replace_personal_bests(&self, tiref: &str, bests: &[PersonalBest]) -> Result<()> {
        self.check_writable()?;
        self.personal_bests.insert(tiref.to_string(), bests.to_vec());
        Ok(())
    }

    async fn get_cache_metadata(&self, tiref: &str) -> Result<Option<CacheMetadata>> {
        Ok(self.cache_metadata.get(tiref).map(|m| m.value().clone()))
    }

    async fn put_cache_metadata(&self, meta: &CacheMetadata) -> Result<()> {
        self.check_writable()?;
        if self.fail_metadata_writes.load(Ordering::SeqCst) {
            return Err(AppError::Database("cache metadata write failed".to_string()));
        }
        self.cache_metadata.insert(meta.tiref.clone(), meta.clone());
        Ok(())
    }

    async fn delete_all(&self, tiref: &str) -> Result<usize> {
        self.check_writable()?;
        let mut deleted = 0;
        deleted += self.records.remove(tiref).map_or(0, |(_, r)| r.len());
        deleted += self.personal_bests.remove(tiref).map_or(0, |(_, b)| b.len());
        deleted += usize::from(self.cache_metadata.remove(tiref).is_some());
        deleted += usize::from(self.swimmers.remove(tiref).is_some());
        tracing::info!(tiref, deleted, "Swimmer data deleted");
        Ok(deleted)
    }
}
