//! Shelfwise Core - item-item collaborative filtering for books
//!
//! This crate turns raw Book-Crossing style ratings into a nearest-neighbor
//! model and answers "books like this one" queries against it.
//!
//! # Pipeline
//!
//! - [`clean`] keeps active users and popular titles and joins ratings with
//!   book metadata
//! - [`matrix`] pivots the cleaned table into a title-by-user rating matrix
//! - [`model`] fits a brute-force Euclidean neighbor index over matrix rows
//! - [`artifacts`] persists each training run as an immutable generation
//! - [`service`] serves queries from the live snapshot and retrains
//!
//! # Example
//!
//! ```no_run
//! use shelfwise_core::{EngineConfig, QueryResult, RecommendationService};
//!
//! # fn example() -> shelfwise_core::Result<()> {
//! let service = RecommendationService::open(EngineConfig::from_env())?;
//! if !service.is_ready() {
//!     service.retrain()?;
//! }
//!
//! match service.recommend("The Hobbit")? {
//!     QueryResult::Found { recommended_books, .. } => println!("{recommended_books:?}"),
//!     QueryResult::Suggestions { suggestions, .. } => println!("Did you mean {suggestions:?}"),
//!     QueryResult::NoMatch => println!("No match"),
//! }
//! # Ok(())
//! # }
//! ```

pub mod artifacts;
pub mod clean;
pub mod config;
pub mod data;
pub mod error;
pub mod matrix;
pub mod model;
pub mod resolver;
pub mod service;
pub mod snapshot;

#[cfg(feature = "ingest")]
pub mod ingest;

// Re-export main types for convenience
pub use artifacts::ArtifactStore;
pub use clean::{clean, clean_files};
pub use config::{CleaningConfig, EngineConfig, IngestionConfig};
pub use data::{CleanedRatingTable, RatingRecord, RawTable};
pub use error::{ErrorKind, RecommenderError, Result};
pub use matrix::{build_matrix, RatingMatrix};
pub use model::{DistanceMetric, Neighbor, NeighborModel};
pub use resolver::{Resolution, TitleResolver};
pub use service::{RecommendationService, ServiceStatus, TrainingReport};
pub use snapshot::{ArtifactManifest, QueryResult, Snapshot, POSTER_PLACEHOLDER};

#[cfg(feature = "ingest")]
pub use ingest::{DatasetIngestor, IngestReport};
