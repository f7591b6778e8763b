//! Inspect command implementation.

use anyhow::Result;
use colored::Colorize;
use shelfwise_core::EngineConfig;

use crate::utils::{format_timestamp, open_service};

/// Execute the inspect command.
pub async fn execute(config: EngineConfig, quiet: bool) -> Result<()> {
    let service = open_service(config).await?;
    let Some(snapshot) = service.snapshot() else {
        println!("{}", "No trained model".yellow().bold());
        if !quiet {
            println!(
                "   {} {}",
                "Artifacts:".dimmed(),
                service.config().artifacts_dir.display()
            );
            println!("   Run `shelfwise train` to build one.");
        }
        return Ok(());
    };

    let manifest = snapshot.manifest();
    if quiet {
        println!("{}", manifest.run_id);
        return Ok(());
    }

    println!();
    println!("{}", "Trained model".green().bold());
    println!("   {} {}", "Run:".dimmed(), manifest.run_id);
    println!(
        "   {} {}",
        "Trained at:".dimmed(),
        format_timestamp(manifest.created_at)
    );
    println!("   {} {:?}", "Metric:".dimmed(), manifest.metric);
    println!("   {} {}", "Books:".dimmed(), manifest.books);
    println!("   {} {}", "Users:".dimmed(), manifest.users);
    println!("   {} {}", "Ratings kept:".dimmed(), manifest.records);
    println!(
        "   {} {}",
        "Location:".dimmed(),
        service
            .store()
            .generation_dir(&manifest.run_id.to_string())
            .display()
    );
    for (file, digest) in &manifest.checksums {
        println!("     {} {}", file, digest.get(..16).unwrap_or(digest).dimmed());
    }

    Ok(())
}
