//! Database layer: the store trait and its Firestore and in-memory backends.

use std::future::Future;

use crate::error::Result;
use crate::models::{CacheMetadata, PersonalBest, SwimRecord, SwimmerIdentity};

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreDb;
pub use memory::MemoryStore;

/// Collection names as constants.
pub mod collections {
    /// Swimmer identities (keyed by tiref)
    pub const SWIMMERS: &str = "swimmers";
    /// Individual swims (keyed by `SwimRecord::storage_id`)
    pub const SWIM_RECORDS: &str = "swim_records";
    /// One per swimmer and event (keyed by `PersonalBest::storage_id`)
    pub const PERSONAL_BESTS: &str = "personal_bests";
    /// Outcome of the last sync attempt (keyed by tiref)
    pub const CACHE_METADATA: &str = "cache_metadata";
}

/// Persistence for swimmers and their results.
///
/// All methods return `Send` futures so the service can run inside axum
/// handlers on the multi-threaded runtime.
pub trait SwimStore: Send + Sync {
    // ── Identity ──────────────────────────────────────────────────────

    fn get_identity(
        &self,
        tiref: &str,
    ) -> impl Future<Output = Result<Option<SwimmerIdentity>>> + Send;

    fn save_identity(&self, identity: &SwimmerIdentity) -> impl Future<Output = Result<()>> + Send;

    /// Every stored swimmer, most recently updated first.
    fn list_identities(&self) -> impl Future<Output = Result<Vec<SwimmerIdentity>>> + Send;

    // ── Records ───────────────────────────────────────────────────────

    /// Records for a swimmer, newest meet first.
    fn get_records(
        &self,
        tiref: &str,
        limit: Option<usize>,
    ) -> impl Future<Output = Result<Vec<SwimRecord>>> + Send;

    /// Insert records, ignoring any already stored under the same
    /// `storage_id`. Returns how many were new.
    fn save_records(
        &self,
        tiref: &str,
        records: &[SwimRecord],
    ) -> impl Future<Output = Result<usize>> + Send;

    // ── Personal bests ────────────────────────────────────────────────

    /// Ordered by stroke, then distance, then pool.
    fn get_personal_bests(
        &self,
        tiref: &str,
    ) -> impl Future<Output = Result<Vec<PersonalBest>>> + Send;

    /// Replace the swimmer's whole personal best set.
    fn replace_personal_bests(
        &self,
        tiref: &str,
        bests: &[PersonalBest],
    ) -> impl Future<Output = Result<()>> + Send;

    // ── Cache metadata ────────────────────────────────────────────────

    fn get_cache_metadata(
        &self,
        tiref: &str,
    ) -> impl Future<Output = Result<Option<CacheMetadata>>> + Send;

    fn put_cache_metadata(&self, meta: &CacheMetadata) -> impl Future<Output = Result<()>> + Send;

    // ── Deletion ──────────────────────────────────────────────────────

    /// Remove everything stored for a swimmer. Returns documents deleted.
    fn delete_all(&self, tiref: &str) -> impl Future<Output = Result<usize>> + Send;
}

/// Shared ordering for [`SwimStore::get_personal_bests`].
pub(crate) fn sort_personal_bests(bests: &mut [PersonalBest]) {
    bests.sort_by(|a, b| {
        (a.stroke.as_str(), a.distance, a.pool_type.code())
            .cmp(&(b.stroke.as_str(), b.distance, b.pool_type.code()))
    });
}

/// Store selected at startup.
#[derive(Clone)]
pub enum StoreBackend {
    Firestore(FirestoreDb),
    Memory(MemoryStore),
}

impl SwimStore for StoreBackend {
    async fn get_identity(&self, tiref: &str) -> Result<Option<SwimmerIdentity>> {
        match self {
            Self::Firestore(db) => db.get_identity(tiref).await,
            Self::Memory(db) => db.get_identity(tiref).await,
        }
    }

    async fn save_identity(&self, identity: &SwimmerIdentity) -> Result<()> {
        match self {
            Self::Firestore(db) => db.save_identity(identity).await,
            Self::Memory(db) => db.save_identity(identity).await,
        }
    }

    async fn list_identities(&self) -> Result<Vec<SwimmerIdentity>> {
        match self {
            Self::Firestore(db) => db.list_identities().await,
            Self::Memory(db) => db.list_identities().await,
        }
    }

    async fn get_records(&self, tiref: &str, limit: Option<usize>) -> Result<Vec<SwimRecord>> {
        match self {
            Self::Firestore(db) => db.get_records(tiref, limit).await,
            Self::Memory(db) => db.get_records(tiref, limit).await,
        }
    }

    async fn save_records(&self, tiref: &str, records: &[SwimRecord]) -> Result<usize> {
        match self {
            Self::Firestore(db) => db.save_records(tiref, records).await,
            Self::Memory(db) => db.save_records(tiref, records).await,
        }
    }

    async fn get_personal_bests(&self, tiref: &str) -> Result<Vec<PersonalBest>> {
        match self {
            Self::Firestore(db) => db.get_personal_bests(tiref).await,
            Self::Memory(db) => db.get_personal_bests(tiref).await,
        }
    }

    async fn replace_personal_bests(&self, tiref: &str, bests: &[PersonalBest]) -> Result<()> {
        match self {
            Self::Firestore(db) => db.replace_personal_bests(tiref, bests).await,
            Self::Memory(db) => db.replace_personal_bests(tiref, bests).await,
        }
    }

    async fn get_cache_metadata(&self, tiref: &str) -> Result<Option<CacheMetadata>> {
        match self {
            Self::Firestore(db) => db.get_cache_metadata(tiref).await,
            Self::Memory(db) => db.get_cache_metadata(tiref).await,
        }
    }

    async fn put_cache_metadata(&self, meta: &CacheMetadata) -> Result<()> {
        match self {
            Self::Firestore(db) => db.put_cache_metadata(meta).await,
            Self::Memory(db) => db.put_cache_metadata(meta).await,
        }
    }

    async fn delete_all(&self, tiref: &str) -> Result<usize> {
        match self {
            Self::Firestore(db) => db.delete_all(tiref).await,
            Self::Memory(db) => db.delete_all(tiref).await,
        }
    }
}
