//! Recommend command implementation.

use anyhow::{Context, Result};
use colored::Colorize;
use shelfwise_core::{EngineConfig, QueryResult};
use tracing::debug;

use crate::utils::open_service;
use crate::OutputFormat;

/// Execute the recommend command.
pub async fn execute(
    config: EngineConfig,
    title: String,
    format: OutputFormat,
    quiet: bool,
) -> Result<()> {
    let service = open_service(config).await?;
    let result = service.recommend(&title).context("Recommendation failed")?;
    debug!(title = %title, result = ?result, "Answered query");

    match format {
        OutputFormat::Json => {
            let mut value = serde_json::to_value(&result).context("Failed to serialize result")?;
            if let Some(object) = value.as_object_mut() {
                object.insert("input_book".to_string(), title.into());
            }
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        OutputFormat::Text => print_text(&title, &result, quiet),
    }

    Ok(())
}

fn print_text(title: &str, result: &QueryResult, quiet: bool) {
    match result {
        QueryResult::Found {
            recommended_books,
            poster_urls,
        } => {
            if !quiet {
                println!();
                println!("{} {}", "Books like".green().bold(), title.bold());
                println!();
            }
            print_titles(recommended_books, poster_urls, quiet);
        }
        QueryResult::Suggestions {
            suggestions,
            poster_urls,
        } => {
            if !quiet {
                println!();
                println!("{}", format!("Do you mean '{title}'?").yellow().bold());
                println!();
            }
            print_titles(suggestions, poster_urls, quiet);
        }
        QueryResult::NoMatch => {
            if !quiet {
                println!("{} {}", "No match found for".red(), title.bold());
            }
        }
    }
}

fn print_titles(titles: &[String], posters: &[String], quiet: bool) {
    for (i, (title, poster)) in titles.iter().zip(posters).enumerate() {
        if quiet {
            println!("{title}");
        } else {
            println!("   {}. {}", i + 1, title);
            println!("      {}", poster.dimmed());
        }
    }
}
