// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Routes that reach out to the results site.

use crate::db::SwimStore;
use crate::error::Result;
use crate::services::{HttpTransport, SwimmerService, SyncOutcome};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub fn routes<S, T>() -> Router<Arc<AppState<S, T>>>
where
    S: SwimStore + 'static,
    T: HttpTransport + 'static,
{
    Router::new()
        .route("/api/validate", post(validate::<S, T>))
        .route("/api/scrape/{tiref}", post(scrape::<S, T>))
        .route("/api/refresh/{tiref}", post(refresh::<S, T>))
}

// ─── Validation ──────────────────────────────────────────────

#[derive(Deserialize)]
pub struct ValidateRequest {
    pub tiref: String,
}

#[derive(Serialize)]
pub struct ValidateResponse {
    pub valid: bool,
    pub message: String,
    pub tiref: String,
}

/// Check a tiref's format, then whether the results site knows it.
///
/// A badly formatted tiref is a normal `valid: false` answer here, not an
/// error, and costs no request to the site.
async fn validate<S: SwimStore, T: HttpTransport>(
    State(state): State<Arc<AppState<S, T>>>,
    Json(request): Json<ValidateRequest>,
) -> Result<Json<ValidateResponse>> {
    let tiref = request.tiref.trim().to_string();

    if !SwimmerService::<S, T>::validate_external_id(&tiref) {
        return Ok(Json(ValidateResponse {
            valid: false,
            message: "Invalid tiref format. Must be 4-8 digits.".to_string(),
            tiref,
        }));
    }

    let valid = state.service.check_exists(&tiref).await?;
    Ok(Json(ValidateResponse {
        valid,
        message: if valid {
            "Valid tiref".to_string()
        } else {
            "Tiref not found on swimming results website".to_string()
        },
        tiref,
    }))
}

// ─── Sync ────────────────────────────────────────────────────

#[derive(Deserialize, Default)]
pub struct ScrapeQuery {
    #[serde(default)]
    pub force_refresh: bool,
}

async fn scrape<S: SwimStore, T: HttpTransport>(
    State(state): State<Arc<AppState<S, T>>>,
    Path(tiref): Path<String>,
    Query(params): Query<ScrapeQuery>,
) -> Result<Json<SyncOutcome>> {
    let outcome = state
        .service
        .sync_swimmer(&tiref, params.force_refresh)
        .await?;
    Ok(Json(outcome))
}

/// Same as a forced scrape.
async fn refresh<S: SwimStore, T: HttpTransport>(
    State(state): State<Arc<AppState<S, T>>>,
    Path(tiref): Path<String>,
) -> Result<Json<SyncOutcome>> {
    Ok(Json(state.service.sync_swimmer(&tiref, true).await?))
}
