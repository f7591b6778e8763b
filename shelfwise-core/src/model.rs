//! Brute-force nearest-neighbor index over rating-matrix rows.
//!
//! The model stores the vectors it was fit on and answers k-nearest queries
//! by scanning all of them. The metric is fixed to Euclidean distance; it is
//! recorded in the serialized model and in the generation manifest because
//! changing it changes neighbor order.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{RecommenderError, Result};
use crate::matrix::RatingMatrix;

/// Distance metric used by the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceMetric {
    /// sqrt(sum((a_i - b_i)^2))
    #[default]
    Euclidean,
}

impl DistanceMetric {
    pub fn distance(&self, a: &[f32], b: &[f32]) -> f32 {
        match self {
            Self::Euclidean => a
                .iter()
                .zip(b)
                .map(|(x, y)| (x - y) * (x - y))
                .sum::<f32>()
                .sqrt(),
        }
    }
}

impl std::fmt::Display for DistanceMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Euclidean => write!(f, "euclidean"),
        }
    }
}

/// One query hit: a matrix row and its distance from the query vector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub row: usize,
    pub distance: f32,
}

/// Trained nearest-neighbor index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeighborModel {
    metric: DistanceMetric,
    dim: usize,
    rows: usize,
    vectors: Vec<f32>,
}

impl NeighborModel {
    /// Fit the index on every row of the matrix.
    pub fn train(matrix: &RatingMatrix) -> Result<Self> {
        let (rows, dim) = matrix.shape();
        if rows == 0 || dim == 0 {
            return Err(RecommenderError::DataError(format!(
                "Cannot train on a {rows} x {dim} matrix"
            )));
        }

        let mut vectors = Vec::with_capacity(rows * dim);
        for row in 0..rows {
            // rows < shape().0, so row() is always Some
            if let Some(values) = matrix.row(row) {
                vectors.extend_from_slice(values);
            }
        }

        info!(rows, dim, metric = %DistanceMetric::default(), "Trained neighbor model");
        Ok(Self {
            metric: DistanceMetric::default(),
            dim,
            rows,
            vectors,
        })
    }

    pub fn metric(&self) -> DistanceMetric {
        self.metric
    }

    /// Number of indexed vectors.
    pub fn len(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// Vector dimension (number of users).
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Return the `k` rows closest to `vector`, nearest first.
    ///
    /// Equal distances are ordered by row index, so a row queried with its own
    /// vector comes first unless an identical vector sits at a lower row.
    pub fn query(&self, vector: &[f32], k: usize) -> Result<Vec<Neighbor>> {
        if vector.len() != self.dim {
            return Err(RecommenderError::DataError(format!(
                "Query vector has {} dimensions, model expects {}",
                vector.len(),
                self.dim
            )));
        }

        let mut hits: Vec<Neighbor> = self
            .vectors
            .chunks_exact(self.dim)
            .enumerate()
            .map(|(row, candidate)| Neighbor {
                row,
                distance: self.metric.distance(vector, candidate),
            })
            .collect();

        hits.sort_by(|a, b| {
            a.distance
                .total_cmp(&b.distance)
                .then_with(|| a.row.cmp(&b.row))
        });
        hits.truncate(k);
        Ok(hits)
    }

    pub fn validate(&self) -> Result<()> {
        if self.vectors.len() != self.rows * self.dim {
            return Err(RecommenderError::ArtifactError(format!(
                "Neighbor model holds {} values, expected {} x {}",
                self.vectors.len(),
                self.rows,
                self.dim
            )));
        }
        Ok(())
    }

    /// Serialize the model to CBOR bytes.
    pub fn to_cbor(&self) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        ciborium::into_writer(self, &mut bytes)
            .map_err(|e| RecommenderError::SerializationError(e.to_string()))?;
        Ok(bytes)
    }

    /// Deserialize and validate a model from CBOR bytes.
    pub fn from_cbor(bytes: &[u8]) -> Result<Self> {
        let model: Self = ciborium::from_reader(bytes)
            .map_err(|e| RecommenderError::SerializationError(e.to_string()))?;
        model.validate()?;
        Ok(model)
    }
}
