//! Recommendation handler
//!
//! Handles POST /recommend requests.

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::{Deserialize, Serialize};
use shelfwise_core::{QueryResult, RecommenderError};
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::state::AppState;

/// Request body for a recommendation query.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RecommendRequest {
    /// Title typed by the user; exact titles get neighbors, anything else
    /// gets suggestions.
    #[serde(default)]
    #[schema(example = "The Hobbit")]
    pub book_name: Option<String>,
}

/// Outcome of a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RecommendStatus {
    Found,
    Suggestions,
    NoMatch,
}

/// Response for a recommendation query.
///
/// All lists are always present; the ones that do not apply to `status` are empty.
#[derive(Debug, Serialize, ToSchema)]
pub struct RecommendResponse {
    pub status: RecommendStatus,

    /// The title as received.
    #[schema(example = "The Hobbit")]
    pub input_book: String,

    /// Prompt shown with suggestions.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "Do you mean 'hobbit'?")]
    pub message: Option<String>,

    /// Nearest books, closest first. Never contains `input_book`.
    pub recommended_books: Vec<String>,

    /// Catalog titles resembling `input_book`, at most five.
    pub suggestions: Vec<String>,

    /// Cover image per returned title, or "URL not available".
    pub poster_urls: Vec<String>,
}

impl RecommendResponse {
    fn from_result(input_book: String, result: QueryResult) -> Self {
        match result {
            QueryResult::Found {
                recommended_books,
                poster_urls,
            } => Self {
                status: RecommendStatus::Found,
                input_book,
                message: None,
                recommended_books,
                suggestions: Vec::new(),
                poster_urls,
            },
            QueryResult::Suggestions {
                suggestions,
                poster_urls,
            } => Self {
                status: RecommendStatus::Suggestions,
                message: Some(format!("Do you mean '{input_book}'?")),
                input_book,
                recommended_books: Vec::new(),
                suggestions,
                poster_urls,
            },
            QueryResult::NoMatch => Self {
                status: RecommendStatus::NoMatch,
                input_book,
                message: None,
                recommended_books: Vec::new(),
                suggestions: Vec::new(),
                poster_urls: Vec::new(),
            },
        }
    }
}

/// Recommend books similar to a title.
#[utoipa::path(
    post,
    path = "/recommend",
    tag = "Recommendations",
    request_body = RecommendRequest,
    responses(
        (status = 200, description = "Neighbors, suggestions or no match", body = RecommendResponse),
        (status = 400, description = "Missing or blank book_name"),
        (status = 503, description = "No model trained yet")
    )
)]
pub async fn recommend_handler(
    State(state): State<AppState>,
    payload: Result<Json<RecommendRequest>, JsonRejection>,
) -> Result<Json<RecommendResponse>, ApiError> {
    let Json(request) =
        payload.map_err(|e| ApiError::bad_request(format!("Invalid request body: {e}")))?;

    let book_name = request
        .book_name
        .filter(|name| !name.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("book_name is required"))?;

    // Title resolution scans every title, so keep it off the async workers
    let service = state.service.clone();
    let query = book_name.clone();
    let result = tokio::task::spawn_blocking(move || service.recommend(&query))
        .await
        .map_err(|e| ApiError::internal(format!("Recommendation task failed: {e}")))?
        .map_err(|e| match e {
            RecommenderError::NotReady(reason) => ApiError::not_ready(reason),
            other => ApiError::from(other),
        })?;
    tracing::debug!(book_name = %book_name, result = ?result, "Answered recommendation query");

    Ok(Json(RecommendResponse::from_result(book_name, result)))
}
