//! Health check handlers
//!
//! Provides welcome, health and readiness endpoints for monitoring and orchestration.

use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::state::AppState;

/// GET / - Welcome message
#[utoipa::path(
    get,
    path = "/",
    tag = "Health",
    responses((status = 200, description = "Welcome message", body = String))
)]
pub async fn root() -> &'static str {
    "Welcome to the Shelfwise book recommender. POST a title to /recommend."
}

/// Health check response
#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    /// Service status: "healthy" or "degraded"
    #[schema(example = "healthy")]
    pub status: &'static str,
    /// Server version from Cargo.toml
    pub version: &'static str,
    /// Service name
    pub service: &'static str,
    /// Whether a trained model is loaded
    pub engine_ready: bool,
    /// Training run currently served
    pub run_id: Option<Uuid>,
    /// When that run finished
    pub trained_at: Option<DateTime<Utc>>,
    /// Titles in the served model
    pub books: usize,
}

/// GET /health - Health check endpoint
///
/// Returns JSON with service status, version, and engine readiness.
/// The server is "degraded" until a model has been trained.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses((status = 200, description = "Service health", body = HealthResponse))
)]
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let status = state.service.status();

    Json(HealthResponse {
        status: if status.ready { "healthy" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        service: "shelfwise-server",
        engine_ready: status.ready,
        run_id: status.run_id,
        trained_at: status.trained_at,
        books: status.books,
    })
}

/// Readiness response for Kubernetes
#[derive(Serialize, ToSchema)]
pub struct ReadyResponse {
    /// Whether the service is ready to accept traffic
    pub ready: bool,
    /// Optional message explaining status
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
}

/// GET /ready - Kubernetes readiness probe
///
/// Returns 200 once a trained snapshot is loaded, 503 before.
#[utoipa::path(
    get,
    path = "/ready",
    tag = "Health",
    responses(
        (status = 200, description = "Model loaded", body = ReadyResponse),
        (status = 503, description = "No model trained yet", body = ReadyResponse)
    )
)]
pub async fn ready(State(state): State<AppState>) -> (StatusCode, Json<ReadyResponse>) {
    if state.service.is_ready() {
        (
            StatusCode::OK,
            Json(ReadyResponse {
                ready: true,
                message: None,
            }),
        )
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ReadyResponse {
                ready: false,
                message: Some("No trained model loaded; POST /train first"),
            }),
        )
    }
}
