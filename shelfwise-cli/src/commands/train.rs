//! Train command implementation.

use std::path::PathBuf;

use anyhow::{Context, Result};
use colored::Colorize;
use shelfwise_core::EngineConfig;
use tracing::info;

use crate::utils::open_service;

/// Command-line overrides for the training inputs.
pub struct TrainOverrides {
    pub ratings: Option<PathBuf>,
    pub books: Option<PathBuf>,
    pub min_user_ratings: Option<usize>,
    pub min_book_ratings: Option<usize>,
}

impl TrainOverrides {
    fn apply(self, config: &mut EngineConfig) {
        if let Some(path) = self.ratings {
            config.ratings_csv = path;
        }
        if let Some(path) = self.books {
            config.books_csv = path;
        }
        if let Some(min) = self.min_user_ratings {
            config.cleaning.min_user_ratings = min;
        }
        if let Some(min) = self.min_book_ratings {
            config.cleaning.min_book_ratings = min;
        }
    }
}

/// Execute the train command.
pub async fn execute(mut config: EngineConfig, overrides: TrainOverrides, quiet: bool) -> Result<()> {
    overrides.apply(&mut config);
    info!(
        ratings = %config.ratings_csv.display(),
        books = %config.books_csv.display(),
        min_user_ratings = config.cleaning.min_user_ratings,
        min_book_ratings = config.cleaning.min_book_ratings,
        "Training"
    );

    let artifacts_dir = config.artifacts_dir.clone();
    let service = open_service(config).await?;
    let report = tokio::task::spawn_blocking(move || service.retrain())
        .await
        .context("Training task panicked")?
        .context("Training failed")?;

    if !quiet {
        println!();
        println!("{}", "Training Completed!".green().bold());
        println!("   {} {}", "Run:".dimmed(), report.run_id);
        println!("   {} {}", "Books:".dimmed(), report.books);
        println!("   {} {}", "Users:".dimmed(), report.users);
        println!("   {} {}", "Ratings kept:".dimmed(), report.records);
        println!("   {} {} ms", "Duration:".dimmed(), report.duration_ms);
        println!("   {} {}", "Artifacts:".dimmed(), artifacts_dir.display());
    }

    Ok(())
}
