//! Book-by-user rating matrix ("pivot").
//!
//! Rows are unique titles in ascending order, columns unique user ids in
//! ascending order. The row order is the only link between a neighbor-index
//! result and a title, so it is derived purely from sorting and never from
//! hash iteration order.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::data::CleanedRatingTable;
use crate::error::{RecommenderError, Result};

/// Dense row-major rating matrix. Unrated cells hold `0.0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingMatrix {
    titles: Vec<String>,
    user_ids: Vec<u64>,
    values: Vec<f32>,
}

impl RatingMatrix {
    pub fn titles(&self) -> &[String] {
        &self.titles
    }

    pub fn user_ids(&self) -> &[u64] {
        &self.user_ids
    }

    /// (rows, columns)
    pub fn shape(&self) -> (usize, usize) {
        (self.titles.len(), self.user_ids.len())
    }

    pub fn row(&self, index: usize) -> Option<&[f32]> {
        let width = self.user_ids.len();
        (index < self.titles.len()).then(|| &self.values[index * width..(index + 1) * width])
    }

    /// Row position of a title, by exact match.
    pub fn row_of(&self, title: &str) -> Option<usize> {
        self.titles
            .binary_search_by(|t| t.as_str().cmp(title))
            .ok()
    }

    pub fn title(&self, index: usize) -> Option<&str> {
        self.titles.get(index).map(String::as_str)
    }

    /// Check internal consistency of a deserialized matrix.
    pub fn validate(&self) -> Result<()> {
        let (rows, cols) = self.shape();
        if self.values.len() != rows * cols {
            return Err(RecommenderError::ArtifactError(format!(
                "Rating matrix has {} cells, expected {} x {}",
                self.values.len(),
                rows,
                cols
            )));
        }
        if self.titles.windows(2).any(|w| w[0] >= w[1]) {
            return Err(RecommenderError::ArtifactError(
                "Rating matrix titles are not strictly sorted".into(),
            ));
        }
        if self.user_ids.windows(2).any(|w| w[0] >= w[1]) {
            return Err(RecommenderError::ArtifactError(
                "Rating matrix user ids are not strictly sorted".into(),
            ));
        }
        Ok(())
    }

    /// Serialize the matrix to CBOR bytes.
    pub fn to_cbor(&self) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        ciborium::into_writer(self, &mut bytes)
            .map_err(|e| RecommenderError::SerializationError(e.to_string()))?;
        Ok(bytes)
    }

    /// Deserialize and validate a matrix from CBOR bytes.
    pub fn from_cbor(bytes: &[u8]) -> Result<Self> {
        let matrix: Self = ciborium::from_reader(bytes)
            .map_err(|e| RecommenderError::SerializationError(e.to_string()))?;
        matrix.validate()?;
        Ok(matrix)
    }
}

/// Pivot the cleaned table into titles x users.
///
/// A (user, title) pair that appears more than once is averaged.
pub fn build_matrix(table: &CleanedRatingTable) -> Result<RatingMatrix> {
    if table.is_empty() {
        return Err(RecommenderError::DataError(
            "Cannot build a rating matrix from an empty table".into(),
        ));
    }

    let titles: Vec<String> = table
        .records()
        .iter()
        .map(|r| r.title.as_str())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect();
    let user_ids: Vec<u64> = table
        .records()
        .iter()
        .map(|r| r.user_id)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let row_of: BTreeMap<&str, usize> = titles
        .iter()
        .enumerate()
        .map(|(i, t)| (t.as_str(), i))
        .collect();
    let col_of: BTreeMap<u64, usize> = user_ids.iter().enumerate().map(|(i, &u)| (u, i)).collect();

    let width = user_ids.len();
    let mut sums = vec![0.0f32; titles.len() * width];
    let mut counts = vec![0u32; titles.len() * width];
    for record in table.records() {
        let cell = row_of[record.title.as_str()] * width + col_of[&record.user_id];
        sums[cell] += record.rating;
        counts[cell] += 1;
    }
    let values = sums
        .into_iter()
        .zip(counts)
        .map(|(sum, n)| if n > 1 { sum / n as f32 } else { sum })
        .collect();

    let matrix = RatingMatrix {
        titles,
        user_ids,
        values,
    };
    let (rows, cols) = matrix.shape();
    info!(rows, cols, "Built rating matrix");
    Ok(matrix)
}
