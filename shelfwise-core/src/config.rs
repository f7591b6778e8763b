//! Engine configuration
//!
//! Loads file locations and pipeline thresholds from environment variables
//! with defaults matching the production dataset layout.

use std::path::PathBuf;
use std::time::Duration;

/// Users must have rated strictly more than this many books to be kept.
pub const DEFAULT_MIN_USER_RATINGS: usize = 200;

/// Titles need at least this many ratings to be kept.
pub const DEFAULT_MIN_BOOK_RATINGS: usize = 50;

/// Neighbors fetched per query, including the queried book itself.
pub const DEFAULT_NEIGHBORS: usize = 6;

/// Thresholds applied by the data cleaner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleaningConfig {
    /// Keep users whose raw rating count is greater than this value
    pub min_user_ratings: usize,
    /// Keep titles whose joined rating count is at least this value
    pub min_book_ratings: usize,
}

impl Default for CleaningConfig {
    fn default() -> Self {
        Self {
            min_user_ratings: DEFAULT_MIN_USER_RATINGS,
            min_book_ratings: DEFAULT_MIN_BOOK_RATINGS,
        }
    }
}

/// Where and how the raw dataset archive is fetched.
#[derive(Debug, Clone)]
pub struct IngestionConfig {
    /// URL of the zipped dataset (no default; must be configured)
    pub dataset_url: Option<String>,
    /// Directory receiving the downloaded archive
    pub raw_data_dir: PathBuf,
    /// Directory the archive is extracted into
    pub ingested_dir: PathBuf,
    /// Per-request timeout
    pub timeout: Duration,
    /// Maximum download attempts for transient failures
    pub max_retries: u32,
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            dataset_url: None,
            raw_data_dir: PathBuf::from("artifacts/dataset/raw_data"),
            ingested_dir: PathBuf::from("artifacts/dataset/ingested_data"),
            timeout: Duration::from_secs(300),
            max_retries: 3,
        }
    }
}

/// Configuration for the recommendation engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Root directory holding trained generations (default: artifacts/serialized_objects)
    pub artifacts_dir: PathBuf,
    /// Raw ratings CSV (User-ID, ISBN, Book-Rating)
    pub ratings_csv: PathBuf,
    /// Raw books CSV (ISBN, Book-Title, Book-Author, ...)
    pub books_csv: PathBuf,
    /// Field separator of both CSV files (default: ',')
    pub delimiter: u8,
    /// Cleaning thresholds
    pub cleaning: CleaningConfig,
    /// Neighbors per query including the self match (default: 6)
    pub n_neighbors: usize,
    /// Generations retained on disk after a successful retrain (default: 2)
    pub keep_generations: usize,
    /// Dataset download settings
    pub ingestion: IngestionConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let ingestion = IngestionConfig::default();
        Self {
            artifacts_dir: PathBuf::from("artifacts/serialized_objects"),
            ratings_csv: ingestion.ingested_dir.join("Ratings.csv"),
            books_csv: ingestion.ingested_dir.join("Books.csv"),
            delimiter: b',',
            cleaning: CleaningConfig::default(),
            n_neighbors: DEFAULT_NEIGHBORS,
            keep_generations: 2,
            ingestion,
        }
    }
}

impl EngineConfig {
    /// Build a config rooted at `artifacts_dir`, everything else default.
    pub fn with_artifacts_dir(artifacts_dir: impl Into<PathBuf>) -> Self {
        Self {
            artifacts_dir: artifacts_dir.into(),
            ..Self::default()
        }
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let ingested_dir = env_path("SHELFWISE_INGESTED_DIR")
            .unwrap_or_else(|| defaults.ingestion.ingested_dir.clone());

        let ingestion = IngestionConfig {
            dataset_url: std::env::var("SHELFWISE_DATASET_URL")
                .ok()
                .filter(|u| !u.trim().is_empty()),
            raw_data_dir: env_path("SHELFWISE_RAW_DATA_DIR")
                .unwrap_or_else(|| defaults.ingestion.raw_data_dir.clone()),
            ingested_dir: ingested_dir.clone(),
            timeout: env_parse("SHELFWISE_DOWNLOAD_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.ingestion.timeout),
            max_retries: env_parse("SHELFWISE_DOWNLOAD_RETRIES")
                .unwrap_or(defaults.ingestion.max_retries),
        };

        let delimiter = std::env::var("SHELFWISE_CSV_DELIMITER")
            .ok()
            .and_then(|d| d.bytes().next())
            .unwrap_or(defaults.delimiter);

        Self {
            artifacts_dir: env_path("SHELFWISE_ARTIFACTS_DIR").unwrap_or(defaults.artifacts_dir),
            ratings_csv: env_path("SHELFWISE_RATINGS_CSV")
                .unwrap_or_else(|| ingested_dir.join("Ratings.csv")),
            books_csv: env_path("SHELFWISE_BOOKS_CSV")
                .unwrap_or_else(|| ingested_dir.join("Books.csv")),
            delimiter,
            cleaning: CleaningConfig {
                min_user_ratings: env_parse("SHELFWISE_MIN_USER_RATINGS")
                    .unwrap_or(DEFAULT_MIN_USER_RATINGS),
                min_book_ratings: env_parse("SHELFWISE_MIN_BOOK_RATINGS")
                    .unwrap_or(DEFAULT_MIN_BOOK_RATINGS),
            },
            n_neighbors: env_parse("SHELFWISE_NEIGHBORS")
                .filter(|k: &usize| *k > 1)
                .unwrap_or(DEFAULT_NEIGHBORS),
            keep_generations: env_parse("SHELFWISE_KEEP_GENERATIONS")
                .filter(|k: &usize| *k > 0)
                .unwrap_or(defaults.keep_generations),
            ingestion,
        }
    }
}

fn env_path(key: &str) -> Option<PathBuf> {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from)
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}
