//! OpenAPI documentation configuration
//!
//! Generates the OpenAPI 3 document served at `/api-docs/openapi.json`.

use axum::Json;
use utoipa::OpenApi;

use crate::handlers::{
    HealthResponse, ReadyResponse, RecommendRequest, RecommendResponse, RecommendStatus,
    TrainResponse,
};

/// Shelfwise Recommendation API - OpenAPI Documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Shelfwise - Book Recommendation API",
        version = "0.1.0",
        description = r#"
## Item-item collaborative filtering for books

Shelfwise learns which books are rated alike by the same readers and serves
"more like this" lists.

### How It Works

1. **Train** via `POST /train`: ratings are cleaned to active readers and
   popular titles, pivoted into a title-by-reader matrix, and indexed
2. **Query** via `POST /recommend` with a title
3. An exact title returns its five nearest books; a partial or misspelled one
   returns up to five suggestions to pick from
"#,
        license(name = "MIT OR Apache-2.0")
    ),
    servers(
        (url = "http://localhost:8501", description = "Local development server")
    ),
    tags(
        (name = "Recommendations", description = "Query similar books by title"),
        (name = "Training", description = "Rebuild the model from the dataset"),
        (name = "Health", description = "Service health and readiness endpoints")
    ),
    paths(
        crate::handlers::health::root,
        crate::handlers::health::health,
        crate::handlers::health::ready,
        crate::handlers::recommend::recommend_handler,
        crate::handlers::train::train_handler,
    ),
    components(
        schemas(
            HealthResponse,
            ReadyResponse,
            RecommendRequest,
            RecommendResponse,
            RecommendStatus,
            TrainResponse,
        )
    )
)]
pub struct ApiDoc;

/// GET /api-docs/openapi.json
pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
