// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP status facade.
//!
//! Thin read-only surface over the event cache and the metrics registry.
//! Probing state lives entirely in the scanner; these handlers never block
//! on anything but the cache lock.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use ow_core::{ServiceId, Status};
use ow_scanner::Cache;
use prometheus::{Encoder, Registry, TextEncoder};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Clone)]
struct AppState {
    cache: Arc<Cache>,
    registry: Registry,
}

/// Build the facade router.
pub fn router(cache: Arc<Cache>, registry: Registry) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .route("/api/services/:id", get(service))
        .route("/api/lookup", get(lookup))
        .with_state(AppState { cache, registry })
}

async fn health() -> &'static str {
    "ok"
}

async fn metrics(State(state): State<AppState>) -> Result<String, StatusCode> {
    let mut buffer = Vec::new();
    TextEncoder::new()
        .encode(&state.registry.gather(), &mut buffer)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    String::from_utf8(buffer).map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ServiceResponse {
    /// Last observed status per address.
    pub addresses: BTreeMap<String, Status>,
    /// Addresses currently observed online.
    pub online: Vec<String>,
}

async fn service(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<ServiceResponse>, StatusCode> {
    let id = ServiceId::new(id);
    let addresses = state.cache.get_addresses(&id).ok_or(StatusCode::NOT_FOUND)?;
    let online = state.cache.get_online_addresses(&id).unwrap_or_default();
    Ok(Json(ServiceResponse { addresses: addresses.into_iter().collect(), online }))
}

#[derive(Debug, Deserialize)]
struct LookupQuery {
    url: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LookupResponse {
    pub service_id: ServiceId,
}

async fn lookup(
    Query(query): Query<LookupQuery>,
    State(state): State<AppState>,
) -> Result<Json<LookupResponse>, StatusCode> {
    state
        .cache
        .get_service_id(&query.url)
        .map(|service_id| Json(LookupResponse { service_id }))
        .ok_or(StatusCode::NOT_FOUND)
}

#[cfg(test)]
#[path = "http_tests.rs"]
mod tests;
