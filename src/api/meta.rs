// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Server meta endpoints (health, liveness, version, info).

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::state::AppState;

/// Simple health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

/// Liveness probe response.
#[derive(Debug, Serialize, ToSchema)]
pub struct LiveResponse {
    pub live: bool,
    /// When the process started serving.
    pub since: DateTime<Utc>,
}

/// Build information.
#[derive(Debug, Serialize, ToSchema)]
pub struct VersionResponse {
    pub version: String,
    pub commit: String,
    pub env: String,
}

/// Human-oriented service description.
#[derive(Debug, Serialize, ToSchema)]
pub struct InfoResponse {
    pub name: String,
    pub description: String,
    pub uptime_seconds: i64,
}

#[utoipa::path(
    get,
    path = "/api/meta/health",
    tag = "Server Meta",
    responses((status = 200, description = "Service is healthy", body = HealthResponse))
)]
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

#[utoipa::path(
    get,
    path = "/api/meta/live",
    tag = "Server Meta",
    responses((status = 200, description = "Service is alive", body = LiveResponse))
)]
pub async fn liveness(State(state): State<AppState>) -> Json<LiveResponse> {
    Json(LiveResponse {
        live: true,
        since: state.started_at,
    })
}

#[utoipa::path(
    get,
    path = "/api/meta/version",
    tag = "Server Meta",
    responses((status = 200, description = "Build information", body = VersionResponse))
)]
pub async fn version(State(state): State<AppState>) -> Json<VersionResponse> {
    Json(VersionResponse {
        version: state.build.version.clone(),
        commit: state.build.commit.clone(),
        env: state.build.env.clone(),
    })
}

#[utoipa::path(
    get,
    path = "/api/meta/info",
    tag = "Server Meta",
    responses((status = 200, description = "Service description", body = InfoResponse))
)]
pub async fn info(State(state): State<AppState>) -> Json<InfoResponse> {
    Json(InfoResponse {
        name: "Agent Builder API".to_string(),
        description: "Server meta endpoints (health/live/version/info).".to_string(),
        uptime_seconds: state.uptime_seconds(),
    })
}
