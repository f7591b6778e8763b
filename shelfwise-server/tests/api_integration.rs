//! API integration tests for shelfwise-server.
//!
//! These tests drive the router with real requests against a temporary
//! dataset and artifact directory, covering the train/recommend flow.

use std::fs;
use std::path::Path;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use shelfwise_core::{CleaningConfig, EngineConfig, RecommendationService};
use shelfwise_server::{create_router, create_router_with_config, AppState, Config};
use tempfile::TempDir;
use tower::ServiceExt;

const BOOKS_CSV: &str = "ISBN,Book-Title,Book-Author,Year-Of-Publication,Publisher,Image-URL-L
0001,The Hobbit,J. R. R. Tolkien,1937,Allen & Unwin,http://covers/hobbit.jpg
0002,The Fellowship of the Ring,J. R. R. Tolkien,1954,Allen & Unwin,http://covers/fellowship.jpg
0003,The Two Towers,J. R. R. Tolkien,1954,Allen & Unwin,http://covers/towers.jpg
0004,Harry Potter and the Chamber of Secrets,J. K. Rowling,1998,Bloomsbury,http://covers/chamber.jpg
0005,Harry Potter and the Sorcerer's Stone,J. K. Rowling,1997,Bloomsbury,http://covers/stone.jpg
0006,Dune,Frank Herbert,1965,Chilton,
";

const RATINGS_CSV: &str = "User-ID,ISBN,Book-Rating
10,0001,9
10,0002,9
10,0003,8
11,0001,8
11,0002,8
11,0003,7
11,0006,9
12,0001,7
12,0002,6
12,0005,2
13,0004,9
13,0005,9
13,0006,1
14,0004,8
14,0005,9
14,0006,6
";

/// Engine config pointing at fixture CSVs inside `dir`.
fn engine_config(dir: &Path) -> EngineConfig {
    let ratings = dir.join("Ratings.csv");
    let books = dir.join("Books.csv");
    fs::write(&ratings, RATINGS_CSV).unwrap();
    fs::write(&books, BOOKS_CSV).unwrap();

    let mut config = EngineConfig::with_artifacts_dir(dir.join("artifacts"));
    config.ratings_csv = ratings;
    config.books_csv = books;
    config.cleaning = CleaningConfig {
        min_user_ratings: 2,
        min_book_ratings: 2,
    };
    config
}

/// Build the test router using the library's create_router function
fn create_test_app(config: EngineConfig) -> Router {
    let service = RecommendationService::open(config).unwrap();
    create_router(AppState::new(service))
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn train() -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/train")
        .body(Body::empty())
        .unwrap()
}

/// A router that has already been trained on the fixture.
async fn trained_app(dir: &TempDir) -> Router {
    let app = create_test_app(engine_config(dir.path()));
    let (status, _) = send(&app, train()).await;
    assert_eq!(status, StatusCode::OK);
    app
}

// ============================================================================
// Health & Readiness Tests
// ============================================================================

#[tokio::test]
async fn test_root_returns_welcome() {
    let dir = TempDir::new().unwrap();
    let app = create_test_app(engine_config(dir.path()));

    let response = app.oneshot(get("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert!(String::from_utf8_lossy(&body).contains("Welcome"));
}

#[tokio::test]
async fn test_health_reports_untrained_engine() {
    let dir = TempDir::new().unwrap();
    let app = create_test_app(engine_config(dir.path()));

    let (status, json) = send(&app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "degraded");
    assert_eq!(json["engine_ready"], false);
    assert!(json["version"].is_string());
    assert!(json["run_id"].is_null());
}

#[tokio::test]
async fn test_ready_flips_after_training() {
    let dir = TempDir::new().unwrap();
    let app = create_test_app(engine_config(dir.path()));

    let (status, json) = send(&app, get("/ready")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["ready"], false);

    let (status, _) = send(&app, train()).await;
    assert_eq!(status, StatusCode::OK);

    let (status, json) = send(&app, get("/ready")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["ready"], true);

    let (_, health) = send(&app, get("/health")).await;
    assert_eq!(health["status"], "healthy");
    assert_eq!(health["books"], 6);
}

// ============================================================================
// Training Endpoint Tests
// ============================================================================

#[tokio::test]
async fn test_train_returns_report() {
    let dir = TempDir::new().unwrap();
    let app = create_test_app(engine_config(dir.path()));

    let (status, json) = send(&app, train()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "Training Completed!");
    assert!(json["run_id"].is_string());
    assert_eq!(json["books"], 6);
    assert_eq!(json["users"], 5);
}

#[tokio::test]
async fn test_train_with_unusable_data_is_422_and_keeps_old_model() {
    let dir = TempDir::new().unwrap();
    let app = trained_app(&dir).await;
    let (_, before) = send(&app, post_json("/recommend", json!({"book_name": "The Hobbit"}))).await;

    // the books file loses its title column
    fs::write(dir.path().join("Books.csv"), "ISBN,Book-Author\n0001,nobody\n").unwrap();
    let (status, json) = send(&app, train()).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["code"], "DATA_ERROR");

    let (status, after) = send(&app, post_json("/recommend", json!({"book_name": "The Hobbit"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(after, before);
}

#[tokio::test]
async fn test_train_is_not_cut_off_by_query_timeout() {
    let dir = TempDir::new().unwrap();
    let service = RecommendationService::open(engine_config(dir.path())).unwrap();
    let state = AppState::new(service);
    let config = Config {
        timeout_secs: 0,
        ..Config::default()
    };
    let app = create_router_with_config(&config, state.clone());

    // a caller only sees success once the new model is live
    let (status, json) = send(&app, train()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "Training Completed!");
    assert_eq!(
        state.service.status().run_id.map(|id| id.to_string()),
        json["run_id"].as_str().map(str::to_string)
    );
}

#[tokio::test]
async fn test_train_with_missing_files_is_io_error() {
    let dir = TempDir::new().unwrap();
    let mut config = engine_config(dir.path());
    config.ratings_csv = dir.path().join("nope.csv");
    let app = create_test_app(config);

    let (status, json) = send(&app, train()).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["code"], "IO_ERROR");
    // no filesystem paths leak to clients
    assert!(!json["error"].as_str().unwrap().contains("nope.csv"));
}

// ============================================================================
// Recommendation Endpoint Tests
// ============================================================================

#[tokio::test]
async fn test_recommend_before_training_is_503() {
    let dir = TempDir::new().unwrap();
    let app = create_test_app(engine_config(dir.path()));

    let (status, json) = send(&app, post_json("/recommend", json!({"book_name": "Dune"}))).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["code"], "NOT_READY");
}

#[tokio::test]
async fn test_recommend_exact_title() {
    let dir = TempDir::new().unwrap();
    let app = trained_app(&dir).await;

    let (status, json) = send(&app, post_json("/recommend", json!({"book_name": "The Hobbit"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "found");
    assert_eq!(json["input_book"], "The Hobbit");

    let books = json["recommended_books"].as_array().unwrap();
    assert_eq!(books.len(), 5);
    assert_eq!(books[0], "The Fellowship of the Ring");
    assert!(!books.iter().any(|b| b == "The Hobbit"));

    let posters = json["poster_urls"].as_array().unwrap();
    assert_eq!(posters.len(), books.len());
    assert_eq!(posters[0], "http://covers/fellowship.jpg");
    assert!(json["suggestions"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_recommend_missing_cover_uses_placeholder() {
    let dir = TempDir::new().unwrap();
    let app = trained_app(&dir).await;

    let (_, json) = send(&app, post_json("/recommend", json!({"book_name": "dune"}))).await;
    assert_eq!(json["status"], "suggestions");
    assert_eq!(json["suggestions"], json!(["Dune"]));
    assert_eq!(json["poster_urls"], json!(["URL not available"]));
}

#[tokio::test]
async fn test_recommend_partial_title_suggests() {
    let dir = TempDir::new().unwrap();
    let app = trained_app(&dir).await;

    let (status, json) =
        send(&app, post_json("/recommend", json!({"book_name": "harry potter"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "suggestions");
    assert_eq!(json["message"], "Do you mean 'harry potter'?");
    assert_eq!(
        json["suggestions"],
        json!([
            "Harry Potter and the Chamber of Secrets",
            "Harry Potter and the Sorcerer's Stone"
        ])
    );
    assert!(json["recommended_books"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_recommend_unknown_title_is_no_match() {
    let dir = TempDir::new().unwrap();
    let app = trained_app(&dir).await;

    let (status, json) =
        send(&app, post_json("/recommend", json!({"book_name": "qqqqzzzz"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "no_match");
    assert!(json["recommended_books"].as_array().unwrap().is_empty());
    assert!(json["suggestions"].as_array().unwrap().is_empty());
    assert!(json["poster_urls"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_recommend_rejects_missing_or_blank_title() {
    let dir = TempDir::new().unwrap();
    let app = trained_app(&dir).await;

    for body in [json!({}), json!({"book_name": ""}), json!({"book_name": "   "})] {
        let (status, json) = send(&app, post_json("/recommend", body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["code"], "INVALID_INPUT");
    }
}

#[tokio::test]
async fn test_recommend_rejects_malformed_json() {
    let dir = TempDir::new().unwrap();
    let app = trained_app(&dir).await;

    let request = Request::builder()
        .method("POST")
        .uri("/recommend")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, json) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "INVALID_INPUT");
}

// ============================================================================
// OpenAPI Tests
// ============================================================================

#[tokio::test]
async fn test_openapi_document_lists_endpoints() {
    let dir = TempDir::new().unwrap();
    let app = create_test_app(engine_config(dir.path()));

    let (status, json) = send(&app, get("/api-docs/openapi.json")).await;
    assert_eq!(status, StatusCode::OK);
    for path in ["/recommend", "/train", "/health", "/ready"] {
        assert!(json["paths"][path].is_object(), "missing {path}");
    }
}
