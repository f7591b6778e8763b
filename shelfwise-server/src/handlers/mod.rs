//! HTTP request handlers
//!
//! This module contains all the request handlers for the API endpoints.

pub mod health;
pub mod recommend;
pub mod train;

pub use crate::state::AppState;
pub use health::{health, ready, root, HealthResponse, ReadyResponse};
pub use recommend::{recommend_handler, RecommendRequest, RecommendResponse, RecommendStatus};
pub use train::{train_handler, TrainResponse};
