// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides the [`SwimStore`] operations over four collections:
//! - Swimmers (identity, keyed by tiref)
//! - Swim records (one document per swim)
//! - Personal bests (one document per swimmer and event)
//! - Cache metadata (last sync outcome, keyed by tiref)

use crate::db::{collections, sort_personal_bests, SwimStore};
use crate::error::AppError;
use crate::models::{CacheMetadata, PersonalBest, SwimRecord, SwimmerIdentity};
use futures_util::{stream, StreamExt};
use std::collections::HashSet;

const MAX_CONCURRENT_DB_OPS: usize = 50;
// Firestore limits batch/transaction writes to 500 operations.
// We use a safe limit of 400 to allow headroom.
const BATCH_SIZE: usize = 400;

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // The emulator needs no credentials; skip the credential lookup entirely.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create an offline client. Every operation returns a database error.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    /// All documents in `collection` whose `tiref` field matches.
    async fn query_by_tiref<T>(&self, collection: &str, tiref: &str) -> Result<Vec<T>, AppError>
    where
        T: for<'de> serde::Deserialize<'de> + Send,
    {
        let tiref = tiref.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collection)
            .filter(move |q| q.for_all([q.field("tiref").eq(tiref.clone())]))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn delete_doc(&self, collection: &str, id: &str) -> Result<(), AppError> {
        self.get_client()?
            .fluent()
            .delete()
            .from(collection)
            .document_id(id)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── Helper Methods ────────────────────────────────────────────

    /// Helper to batch delete documents using transactions.
    async fn batch_delete<T, F>(
        &self,
        items: &[T],
        collection: &str,
        id_extractor: F,
    ) -> Result<(), AppError>
    where
        F: Fn(&T) -> String,
    {
        let client = self.get_client()?;

        for chunk in items.chunks(BATCH_SIZE) {
            let mut transaction = client
                .begin_transaction()
                .await
                .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

            for item in chunk {
                let doc_id = id_extractor(item);
                client
                    .fluent()
                    .delete()
                    .from(collection)
                    .document_id(&doc_id)
                    .add_to_transaction(&mut transaction)
                    .map_err(|e| {
                        AppError::Database(format!(
                            "Failed to add deletion to transaction for {}: {}",
                            collection, e
                        ))
                    })?;
            }

            transaction.commit().await.map_err(|e| {
                AppError::Database(format!("Failed to commit batch deletion: {}", e))
            })?;
        }

        Ok(())
    }
}

impl SwimStore for FirestoreDb {
    // ─── Swimmer Operations ──────────────────────────────────────

    async fn get_identity(&self, tiref: &str) -> Result<Option<SwimmerIdentity>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::SWIMMERS)
            .obj()
            .one(tiref)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn save_identity(&self, identity: &SwimmerIdentity) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::SWIMMERS)
            .document_id(&identity.tiref)
            .object(identity)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    async fn list_identities(&self) -> Result<Vec<SwimmerIdentity>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::SWIMMERS)
            .order_by([(
                "last_updated",
                firestore::FirestoreQueryDirection::Descending,
            )])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── Swim Record Operations ──────────────────────────────────

    async fn get_records(
        &self,
        tiref: &str,
        limit: Option<usize>,
    ) -> Result<Vec<SwimRecord>, AppError> {
        let tiref = tiref.to_string();
        let query = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::SWIM_RECORDS)
            .filter(move |q| q.for_all([q.field("tiref").eq(tiref.clone())]))
            // ISO dates sort lexicographically
            .order_by([("meet_date", firestore::FirestoreQueryDirection::Descending)]);

        let query = match limit {
            Some(limit) => query.limit(u32::try_from(limit).unwrap_or(u32::MAX)),
            None => query,
        };

        query
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Store records that are not already present.
    ///
    /// Uses concurrent writes with a limit to avoid overloading Firestore.
    async fn save_records(&self, tiref: &str, records: &[SwimRecord]) -> Result<usize, AppError> {
        let client = self.get_client()?;

        let inserted = stream::iter(records.to_vec())
            .map(|record| async move {
                let doc_id = record.storage_id();

                let existing: Option<SwimRecord> = client
                    .fluent()
                    .select()
                    .by_id_in(collections::SWIM_RECORDS)
                    .obj()
                    .one(&doc_id)
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;
                if existing.is_some() {
                    return Ok::<_, AppError>(0usize);
                }

                let _: () = client
                    .fluent()
                    .update()
                    .in_col(collections::SWIM_RECORDS)
                    .document_id(&doc_id)
                    .object(&record)
                    .execute()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;

                Ok(1)
            })
            .buffer_unordered(MAX_CONCURRENT_DB_OPS)
            .collect::<Vec<Result<usize, AppError>>>()
            .await
            .into_iter()
            .sum::<Result<usize, AppError>>()?;

        tracing::debug!(tiref, inserted, total = records.len(), "Saved swim records");
        Ok(inserted)
    }

    // ─── Personal Best Operations ────────────────────────────────

    async fn get_personal_bests(&self, tiref: &str) -> Result<Vec<PersonalBest>, AppError> {
        let mut bests: Vec<PersonalBest> = self
            .query_by_tiref(collections::PERSONAL_BESTS, tiref)
            .await?;
        sort_personal_bests(&mut bests);
        Ok(bests)
    }

    /// Atomically swap in a new personal best set.
    ///
    /// Bests for events that no longer have one are deleted in the same
    /// transaction as the writes.
    async fn replace_personal_bests(
        &self,
        tiref: &str,
        bests: &[PersonalBest],
    ) -> Result<(), AppError> {
        let existing: Vec<PersonalBest> = self
            .query_by_tiref(collections::PERSONAL_BESTS, tiref)
            .await?;
        let keep: HashSet<String> = bests.iter().map(PersonalBest::storage_id).collect();
        let stale: Vec<String> = existing
            .iter()
            .map(PersonalBest::storage_id)
            .filter(|id| !keep.contains(id))
            .collect();

        let client = self.get_client()?;
        let mut transaction = client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        for doc_id in &stale {
            client
                .fluent()
                .delete()
                .from(collections::PERSONAL_BESTS)
                .document_id(doc_id)
                .add_to_transaction(&mut transaction)
                .map_err(|e| {
                    AppError::Database(format!("Failed to add deletion to transaction: {}", e))
                })?;
        }

        for best in bests {
            client
                .fluent()
                .update()
                .in_col(collections::PERSONAL_BESTS)
                .document_id(best.storage_id())
                .object(best)
                .add_to_transaction(&mut transaction)
                .map_err(|e| {
                    AppError::Database(format!(
                        "Failed to add personal best to transaction: {}",
                        e
                    ))
                })?;
        }

        transaction
            .commit()
            .await
            .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;

        tracing::debug!(
            tiref,
            written = bests.len(),
            removed = stale.len(),
            "Personal bests replaced"
        );
        Ok(())
    }

    // ─── Cache Metadata Operations ───────────────────────────────

    async fn get_cache_metadata(&self, tiref: &str) -> Result<Option<CacheMetadata>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::CACHE_METADATA)
            .obj()
            .one(tiref)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn put_cache_metadata(&self, meta: &CacheMetadata) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::CACHE_METADATA)
            .document_id(&meta.tiref)
            .object(meta)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    // ─── Swimmer Data Deletion ───────────────────────────────────

    /// Delete everything stored for a swimmer.
    ///
    /// Children go first and the swimmer document last, so an interrupted
    /// delete leaves the swimmer listed and retryable.
    async fn delete_all(&self, tiref: &str) -> Result<usize, AppError> {
        let mut deleted_count = 0;

        // 1. Cache metadata
        if self.get_cache_metadata(tiref).await?.is_some() {
            self.delete_doc(collections::CACHE_METADATA, tiref).await?;
            deleted_count += 1;
        }

        // 2. Personal bests
        let bests: Vec<PersonalBest> = self
            .query_by_tiref(collections::PERSONAL_BESTS, tiref)
            .await?;
        self.batch_delete(&bests, collections::PERSONAL_BESTS, PersonalBest::storage_id)
            .await?;
        deleted_count += bests.len();
        tracing::debug!(tiref, count = bests.len(), "Deleted personal bests");

        // 3. Swim records
        let records: Vec<SwimRecord> = self
            .query_by_tiref(collections::SWIM_RECORDS, tiref)
            .await?;
        self.batch_delete(&records, collections::SWIM_RECORDS, SwimRecord::storage_id)
            .await?;
        deleted_count += records.len();
        tracing::debug!(tiref, count = records.len(), "Deleted swim records");

        // 4. Swimmer
        if self.get_identity(tiref).await?.is_some() {
            self.delete_doc(collections::SWIMMERS, tiref).await?;
            deleted_count += 1;
        }

        tracing::info!(tiref, deleted_count, "Swimmer data deletion complete");

        Ok(deleted_count)
    }
}
