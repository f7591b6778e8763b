//! Common utility functions shared across CLI commands.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use shelfwise_core::{EngineConfig, RecommendationService};

/// Engine configuration from the environment, with the artifacts directory
/// taken from the command line when given.
pub fn engine_config(artifacts_dir: Option<PathBuf>) -> EngineConfig {
    let mut config = EngineConfig::from_env();
    if let Some(dir) = artifacts_dir {
        config.artifacts_dir = dir;
    }
    config
}

/// Open the recommendation service off the async runtime.
pub async fn open_service(config: EngineConfig) -> Result<RecommendationService> {
    let dir = config.artifacts_dir.clone();
    tokio::task::spawn_blocking(move || RecommendationService::open(config))
        .await
        .context("Service task panicked")?
        .with_context(|| format!("Failed to open artifacts in {}", dir.display()))
}

/// Format a training time as a human-readable UTC string.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}
