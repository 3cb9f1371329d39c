// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Swim-Tracker: competitive swimming history synced from swimmingresults.org
//!
//! This crate provides the backend API that fetches a swimmer's results,
//! reconciles them into a local store and serves them with derived
//! personal bests and statistics.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use std::sync::Arc;

use config::{Config, StoreKind};
use db::{FirestoreDb, MemoryStore, StoreBackend};
use error::AppError;
use services::{
    Fetcher, ReqwestTransport, RequestGate, RetryPolicy, SwimmerService, SystemClock,
    UserAgentPool,
};

/// Shared application state.
pub struct AppState<S = StoreBackend, T = ReqwestTransport> {
    pub config: Config,
    pub service: SwimmerService<S, T>,
}

impl AppState {
    /// Wire up the production store, transport and request gate.
    pub async fn from_config(config: Config) -> Result<Self, AppError> {
        let store = match config.store {
            StoreKind::Firestore => {
                StoreBackend::Firestore(FirestoreDb::new(&config.gcp_project_id).await?)
            }
            StoreKind::Memory => {
                tracing::warn!("Using in-memory store; data is lost on restart");
                StoreBackend::Memory(MemoryStore::new())
            }
        };

        let agents = match &config.user_agents_file {
            Some(path) => UserAgentPool::from_file(path),
            None => UserAgentPool::fallback(),
        };
        tracing::info!(
            user_agents = agents.len(),
            min_interval_ms = config.min_request_interval.as_millis() as u64,
            "Request gate initialized"
        );
        let gate = Arc::new(RequestGate::new(config.min_request_interval, agents));

        let transport = ReqwestTransport::new(config.request_timeout)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("HTTP client setup failed: {}", e)))?;

        let service = SwimmerService::new(
            store,
            Fetcher::new(transport, gate, RetryPolicy::default()),
            Arc::new(SystemClock),
            config.results_base_url.clone(),
            config.cache_ttl,
        );

        Ok(Self { config, service })
    }
}
