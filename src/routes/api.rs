// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API routes over stored swimmer data.

use crate::db::SwimStore;
use crate::error::Result;
use crate::models::{SwimRecord, SwimmerIdentity};
use crate::services::freshness::CacheState;
use crate::services::swimmer::{CacheInfo, PersonalBestCards, PersonalBestView};
use crate::services::{HttpTransport, SwimmerProfile};
use crate::time_utils::format_utc_rfc3339;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Largest page of records a single request may ask for.
const MAX_RECORDS_LIMIT: usize = 1000;

pub fn routes<S, T>() -> Router<Arc<AppState<S, T>>>
where
    S: SwimStore + 'static,
    T: HttpTransport + 'static,
{
    Router::new()
        .route("/api/swimmers", get(list_swimmers::<S, T>))
        .route(
            "/api/swimmers/{tiref}",
            get(get_swimmer::<S, T>).delete(delete_swimmer::<S, T>),
        )
        .route("/api/swimmers/{tiref}/complete", get(get_complete::<S, T>))
        .route("/api/swimmers/{tiref}/records", get(get_records::<S, T>))
        .route(
            "/api/swimmers/{tiref}/personal-bests",
            get(get_personal_bests::<S, T>),
        )
        .route(
            "/api/swimmers/{tiref}/personal-bests-cards",
            get(get_personal_best_cards::<S, T>),
        )
        .route("/api/swimmers/{tiref}/cache-info", get(get_cache_info::<S, T>))
        .route(
            "/api/swimmers/{tiref}/update-personal-bests",
            post(update_personal_bests::<S, T>),
        )
}

// ─── Swimmers ────────────────────────────────────────────────

#[derive(Serialize)]
pub struct SwimmerListResponse {
    pub swimmers: Vec<SwimmerIdentity>,
    pub total: usize,
}

async fn list_swimmers<S: SwimStore, T: HttpTransport>(
    State(state): State<Arc<AppState<S, T>>>,
) -> Result<Json<SwimmerListResponse>> {
    let swimmers = state.service.list_known_swimmers().await?;
    Ok(Json(SwimmerListResponse {
        total: swimmers.len(),
        swimmers,
    }))
}

async fn get_swimmer<S: SwimStore, T: HttpTransport>(
    State(state): State<Arc<AppState<S, T>>>,
    Path(tiref): Path<String>,
) -> Result<Json<SwimmerIdentity>> {
    Ok(Json(state.service.get_swimmer(&tiref).await?))
}

async fn get_complete<S: SwimStore, T: HttpTransport>(
    State(state): State<Arc<AppState<S, T>>>,
    Path(tiref): Path<String>,
) -> Result<Json<SwimmerProfile>> {
    Ok(Json(state.service.swimmer_profile(&tiref).await?))
}

#[derive(Serialize)]
pub struct DeleteSwimmerResponse {
    pub success: bool,
    pub deleted: usize,
}

async fn delete_swimmer<S: SwimStore, T: HttpTransport>(
    State(state): State<Arc<AppState<S, T>>>,
    Path(tiref): Path<String>,
) -> Result<Json<DeleteSwimmerResponse>> {
    tracing::info!(tiref = %tiref, "Deleting swimmer");
    let deleted = state.service.delete_swimmer(&tiref).await?;
    Ok(Json(DeleteSwimmerResponse {
        success: true,
        deleted,
    }))
}

// ─── Records ─────────────────────────────────────────────────

#[derive(Deserialize)]
struct RecordsQuery {
    limit: Option<usize>,
}

#[derive(Serialize)]
pub struct RecordsResponse {
    pub tiref: String,
    pub total_records: usize,
    pub records: Vec<SwimRecord>,
}

async fn get_records<S: SwimStore, T: HttpTransport>(
    State(state): State<Arc<AppState<S, T>>>,
    Path(tiref): Path<String>,
    Query(params): Query<RecordsQuery>,
) -> Result<Json<RecordsResponse>> {
    if params.limit == Some(0) {
        return Err(crate::error::AppError::BadRequest(
            "Limit must be greater than 0".to_string(),
        ));
    }
    let limit = params.limit.map(|l| l.min(MAX_RECORDS_LIMIT));

    let records = state.service.records(&tiref, limit).await?;
    Ok(Json(RecordsResponse {
        total_records: records.len(),
        tiref,
        records,
    }))
}

// ─── Personal Bests ──────────────────────────────────────────

#[derive(Serialize)]
pub struct PersonalBestsResponse {
    pub tiref: String,
    pub personal_bests: Vec<PersonalBestView>,
}

async fn get_personal_bests<S: SwimStore, T: HttpTransport>(
    State(state): State<Arc<AppState<S, T>>>,
    Path(tiref): Path<String>,
) -> Result<Json<PersonalBestsResponse>> {
    let personal_bests = state.service.personal_bests(&tiref).await?;
    Ok(Json(PersonalBestsResponse {
        tiref,
        personal_bests,
    }))
}

async fn get_personal_best_cards<S: SwimStore, T: HttpTransport>(
    State(state): State<Arc<AppState<S, T>>>,
    Path(tiref): Path<String>,
) -> Result<Json<PersonalBestCards>> {
    Ok(Json(state.service.personal_best_cards(&tiref).await?))
}

#[derive(Serialize)]
pub struct UpdatePersonalBestsResponse {
    pub tiref: String,
    pub updated_count: usize,
}

async fn update_personal_bests<S: SwimStore, T: HttpTransport>(
    State(state): State<Arc<AppState<S, T>>>,
    Path(tiref): Path<String>,
) -> Result<Json<UpdatePersonalBestsResponse>> {
    let updated_count = state.service.recompute_personal_bests(&tiref).await?;
    Ok(Json(UpdatePersonalBestsResponse {
        tiref,
        updated_count,
    }))
}

// ─── Cache ───────────────────────────────────────────────────

#[derive(Serialize)]
pub struct CacheInfoResponse {
    pub tiref: String,
    pub state: CacheState,
    pub is_fresh: bool,
    pub ttl_hours: u64,
    pub last_scraped: Option<String>,
    pub records_count: Option<u32>,
    pub scrape_success: Option<bool>,
    pub error_message: Option<String>,
}

impl From<CacheInfo> for CacheInfoResponse {
    fn from(info: CacheInfo) -> Self {
        let meta = info.metadata;
        Self {
            tiref: info.tiref,
            is_fresh: info.state == CacheState::Fresh,
            state: info.state,
            ttl_hours: info.ttl_hours,
            last_scraped: meta.as_ref().map(|m| format_utc_rfc3339(m.last_scraped)),
            records_count: meta.as_ref().map(|m| m.records_count),
            scrape_success: meta.as_ref().map(|m| m.scrape_success),
            error_message: meta.and_then(|m| m.error_message),
        }
    }
}

async fn get_cache_info<S: SwimStore, T: HttpTransport>(
    State(state): State<Arc<AppState<S, T>>>,
    Path(tiref): Path<String>,
) -> Result<Json<CacheInfoResponse>> {
    Ok(Json(state.service.cache_info(&tiref).await?.into()))
}
