//! Ingest command implementation.

use anyhow::{Context, Result};
use colored::Colorize;
use shelfwise_core::{DatasetIngestor, EngineConfig};
use tracing::info;

/// Execute the ingest command.
pub async fn execute(config: EngineConfig, url: Option<String>, quiet: bool) -> Result<()> {
    let mut ingestion = config.ingestion;
    if url.is_some() {
        ingestion.dataset_url = url;
    }

    let ingestor = DatasetIngestor::new(ingestion.clone())?;
    let report = ingestor.ingest().await.context("Data ingestion failed")?;

    info!(
        archive = %report.archive.display(),
        bytes = report.bytes,
        files = report.extracted.len(),
        "Ingested dataset"
    );

    if !quiet {
        println!();
        println!("{}", "Dataset ingested".green().bold());
        println!(
            "   {} {} ({} bytes)",
            "Archive:".dimmed(),
            report.archive.display(),
            report.bytes
        );
        println!(
            "   {} {}",
            "Extracted to:".dimmed(),
            ingestion.ingested_dir.display()
        );
        for file in &report.extracted {
            println!("     {}", file.display());
        }
    }

    Ok(())
}
