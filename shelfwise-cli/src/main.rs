//! Shelfwise CLI - Train and query the book recommender from a terminal.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use tracing_subscriber::EnvFilter;

mod commands;
mod exit_codes;
mod utils;

use exit_codes::ExitCode;

const EXIT_CODES_HELP: &str = "Exit codes:
  0   Success
  1   General error
  65  Dataset unusable (missing columns, nothing left after filtering)
  66  Input file not found
  69  No trained model, or dataset download failed
  74  Artifact read/write error";

#[derive(Parser)]
#[command(name = "shelfwise")]
#[command(author, version, about = "Collaborative-filtering book recommendations", long_about = None)]
#[command(after_help = EXIT_CODES_HELP)]
struct Cli {
    /// Directory holding trained model generations
    #[arg(long, global = true, env = "SHELFWISE_ARTIFACTS_DIR", value_name = "DIR")]
    artifacts_dir: Option<PathBuf>,

    /// Suppress decorated output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Log pipeline progress to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download and extract the rating dataset
    Ingest {
        /// Archive URL (defaults to SHELFWISE_DATASET_URL)
        #[arg(long)]
        url: Option<String>,
    },

    /// Clean the dataset, fit the neighbor model and publish it
    Train {
        /// Ratings CSV (User-ID, ISBN, Book-Rating)
        #[arg(long, value_name = "FILE")]
        ratings: Option<PathBuf>,

        /// Books CSV (ISBN, Book-Title, Image-URL-L, ...)
        #[arg(long, value_name = "FILE")]
        books: Option<PathBuf>,

        /// Keep users with more than this many ratings
        #[arg(long)]
        min_user_ratings: Option<usize>,

        /// Keep titles with at least this many ratings
        #[arg(long)]
        min_book_ratings: Option<usize>,
    },

    /// Recommend books similar to a title
    Recommend {
        /// Book title; unknown titles get suggestions
        #[arg(value_name = "TITLE")]
        title: String,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Show the model currently published
    Inspect,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "shelfwise=debug,shelfwise_core=debug"
    } else {
        "shelfwise=warn,shelfwise_core=warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let exit = match run(cli).await {
        Ok(()) => ExitCode::success(),
        Err(err) => ExitCode::from_anyhow(&err),
    };

    if let Some(message) = &exit.message {
        eprintln!("{} {}", "error:".red().bold(), message);
    }
    std::process::exit(exit.code);
}

async fn run(cli: Cli) -> Result<()> {
    let config = utils::engine_config(cli.artifacts_dir);
    let quiet = cli.quiet;

    match cli.command {
        Commands::Ingest { url } => commands::ingest::execute(config, url, quiet).await,
        Commands::Train {
            ratings,
            books,
            min_user_ratings,
            min_book_ratings,
        } => {
            let overrides = commands::train::TrainOverrides {
                ratings,
                books,
                min_user_ratings,
                min_book_ratings,
            };
            commands::train::execute(config, overrides, quiet).await
        }
        Commands::Recommend { title, format } => {
            commands::recommend::execute(config, title, format, quiet).await
        }
        Commands::Inspect => commands::inspect::execute(config, quiet).await,
    }
}
