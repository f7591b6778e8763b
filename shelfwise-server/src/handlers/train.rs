//! Training handler
//!
//! Handles POST /train. Training reads the configured CSV files and writes a
//! new artifact generation; queries keep hitting the previous snapshot until
//! it finishes.

use axum::{extract::State, Json};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

/// Response for a completed training run.
#[derive(Debug, Serialize, ToSchema)]
pub struct TrainResponse {
    #[schema(example = "Training Completed!")]
    pub message: &'static str,
    /// Identifier of the new artifact generation
    pub run_id: Uuid,
    /// Rows in the cleaned rating table
    pub records: usize,
    /// Titles in the model
    pub books: usize,
    /// Users in the model
    pub users: usize,
    /// Wall time of the run
    pub duration_ms: u64,
}

/// Retrain the model from the configured dataset.
#[utoipa::path(
    post,
    path = "/train",
    tag = "Training",
    responses(
        (status = 200, description = "Training completed", body = TrainResponse),
        (status = 422, description = "Dataset is missing columns or filters down to nothing"),
        (status = 500, description = "Dataset or artifacts could not be read or written")
    )
)]
pub async fn train_handler(State(state): State<AppState>) -> Result<Json<TrainResponse>, ApiError> {
    let service = state.service.clone();
    let report = tokio::task::spawn_blocking(move || service.retrain())
        .await
        .map_err(|e| ApiError::internal(format!("Training task failed: {e}")))??;

    Ok(Json(TrainResponse {
        message: "Training Completed!",
        run_id: report.run_id,
        records: report.records,
        books: report.books,
        users: report.users,
        duration_ms: report.duration_ms,
    }))
}
