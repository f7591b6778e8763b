//! A consistent (cleaned table, matrix, model) triple and the query logic
//! that runs against it.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::data::CleanedRatingTable;
use crate::error::{RecommenderError, Result};
use crate::matrix::RatingMatrix;
use crate::model::{DistanceMetric, NeighborModel};
use crate::resolver::{Resolution, TitleResolver};

/// Returned in place of a cover image the catalog has no URL for.
pub const POSTER_PLACEHOLDER: &str = "URL not available";

/// Description of one training generation, persisted as `manifest.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactManifest {
    /// Identifier of the training run that produced the generation
    pub run_id: Uuid,
    /// When the generation was written
    pub created_at: DateTime<Utc>,
    /// Metric the model was fit with
    pub metric: DistanceMetric,
    /// Rows in the cleaned rating table
    pub records: usize,
    /// Matrix rows (unique titles)
    pub books: usize,
    /// Matrix columns (unique users)
    pub users: usize,
    /// SHA3-256 hex digest per artifact file name
    pub checksums: BTreeMap<String, String>,
}

/// Answer to a recommendation query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum QueryResult {
    /// The title is in the catalog; its nearest neighbors, closest first.
    Found {
        recommended_books: Vec<String>,
        poster_urls: Vec<String>,
    },
    /// The title is unknown; these catalog titles look like it.
    Suggestions {
        suggestions: Vec<String>,
        poster_urls: Vec<String>,
    },
    /// Nothing in the catalog resembles the title.
    NoMatch,
}

impl QueryResult {
    pub fn poster_urls(&self) -> &[String] {
        match self {
            Self::Found { poster_urls, .. } | Self::Suggestions { poster_urls, .. } => poster_urls,
            Self::NoMatch => &[],
        }
    }
}

/// Immutable view of one trained generation.
#[derive(Debug)]
pub struct Snapshot {
    manifest: ArtifactManifest,
    table: CleanedRatingTable,
    matrix: RatingMatrix,
    model: NeighborModel,
    posters: HashMap<String, String>,
}

impl Snapshot {
    /// Assemble a snapshot, checking that every part describes the same rows.
    ///
    /// `titles` is the persisted row order; it must equal the matrix row index
    /// and the model must hold exactly one vector per title.
    pub fn new(
        manifest: ArtifactManifest,
        table: CleanedRatingTable,
        matrix: RatingMatrix,
        titles: &[String],
        model: NeighborModel,
    ) -> Result<Self> {
        let (rows, cols) = matrix.shape();
        if titles != matrix.titles() {
            return Err(RecommenderError::ArtifactError(format!(
                "Title list ({} entries) does not match the matrix row index ({} rows)",
                titles.len(),
                rows
            )));
        }
        if model.len() != rows || model.dim() != cols {
            return Err(RecommenderError::ArtifactError(format!(
                "Model shape {} x {} does not match matrix shape {} x {}",
                model.len(),
                model.dim(),
                rows,
                cols
            )));
        }
        if manifest.books != rows || manifest.users != cols || manifest.records != table.len() {
            return Err(RecommenderError::ArtifactError(format!(
                "Manifest of run {} does not describe the loaded artifacts",
                manifest.run_id
            )));
        }

        let mut posters = HashMap::new();
        for record in table.records() {
            posters
                .entry(record.title.clone())
                .or_insert_with(|| record.image_url.clone());
        }

        Ok(Self {
            manifest,
            table,
            matrix,
            model,
            posters,
        })
    }

    pub fn manifest(&self) -> &ArtifactManifest {
        &self.manifest
    }

    pub fn table(&self) -> &CleanedRatingTable {
        &self.table
    }

    pub fn matrix(&self) -> &RatingMatrix {
        &self.matrix
    }

    pub fn model(&self) -> &NeighborModel {
        &self.model
    }

    /// Cover URL of the first cleaned record with this title, or the placeholder.
    pub fn poster_url(&self, title: &str) -> &str {
        self.posters
            .get(title)
            .map(String::as_str)
            .filter(|url| !url.is_empty())
            .unwrap_or(POSTER_PLACEHOLDER)
    }

    fn posters_for(&self, titles: &[String]) -> Vec<String> {
        titles
            .iter()
            .map(|t| self.poster_url(t).to_string())
            .collect()
    }

    /// Resolve `book_name` and answer with neighbors or suggestions.
    ///
    /// `k` counts the queried book itself, which is never returned.
    pub fn recommend(
        &self,
        book_name: &str,
        resolver: &TitleResolver,
        k: usize,
    ) -> Result<QueryResult> {
        match resolver.resolve(book_name, self.matrix.titles()) {
            Resolution::Exact(row) => {
                let vector = self.matrix.row(row).ok_or_else(|| {
                    RecommenderError::ArtifactError(format!("Matrix has no row {row}"))
                })?;
                let hits = self.model.query(vector, k)?;
                let own = hits.iter().position(|h| h.row == row).unwrap_or(0);

                let recommended_books: Vec<String> = hits
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| *i != own)
                    .filter_map(|(_, h)| self.matrix.title(h.row))
                    .map(str::to_string)
                    .collect();
                let poster_urls = self.posters_for(&recommended_books);

                Ok(QueryResult::Found {
                    recommended_books,
                    poster_urls,
                })
            }
            Resolution::Approximate(suggestions) => {
                let poster_urls = self.posters_for(&suggestions);
                Ok(QueryResult::Suggestions {
                    suggestions,
                    poster_urls,
                })
            }
            Resolution::NoMatch => Ok(QueryResult::NoMatch),
        }
    }
}
