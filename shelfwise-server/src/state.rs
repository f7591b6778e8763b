//! Application state module
//!
//! Defines shared state accessible across all request handlers.

use std::sync::Arc;

use shelfwise_core::RecommendationService;

/// Application state containing shared resources.
#[derive(Clone)]
pub struct AppState {
    /// Recommendation engine serving the current snapshot
    pub service: Arc<RecommendationService>,
}

impl AppState {
    pub fn new(service: RecommendationService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }
}
