//! On-disk artifact store.
//!
//! Layout under the artifacts root:
//!
//! ```text
//! CURRENT                      run id of the live generation
//! generations/<run_id>/        one directory per successful training run
//!     clean_data.csv           cleaned table for inspection
//!     final_rating.cbor        cleaned table for the query path
//!     book_pivot.cbor          rating matrix
//!     model.cbor               neighbor model
//!     titles.json              matrix row order
//!     manifest.json            counts, metric and SHA3-256 digests
//! staging-<run_id>/            generation being written
//! ```
//!
//! A generation is written completely into its staging directory, renamed
//! into `generations/`, and only then published by atomically replacing
//! `CURRENT`. Readers always go through `CURRENT`, so they see either the old
//! generation or the new one, never a mix.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{ErrorKind as IoErrorKind, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use sha3::{Digest, Sha3_256};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::data::CleanedRatingTable;
use crate::error::{RecommenderError, Result};
use crate::matrix::RatingMatrix;
use crate::model::NeighborModel;
use crate::snapshot::{ArtifactManifest, Snapshot};

pub const CURRENT_FILE: &str = "CURRENT";
pub const GENERATIONS_DIR: &str = "generations";
pub const STAGING_PREFIX: &str = "staging-";

pub const CLEAN_DATA_CSV: &str = "clean_data.csv";
pub const FINAL_RATING: &str = "final_rating.cbor";
pub const BOOK_PIVOT: &str = "book_pivot.cbor";
pub const MODEL: &str = "model.cbor";
pub const TITLES: &str = "titles.json";
pub const MANIFEST: &str = "manifest.json";

/// Reads and writes trained generations below a root directory.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
    keep_generations: usize,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>, keep_generations: usize) -> Self {
        Self {
            root: root.into(),
            keep_generations: keep_generations.max(1),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn generation_dir(&self, run_id: &str) -> PathBuf {
        self.root.join(GENERATIONS_DIR).join(run_id)
    }

    /// Run id named by `CURRENT`, if any generation has been published.
    pub fn current_run(&self) -> Result<Option<String>> {
        let path = self.root.join(CURRENT_FILE);
        match fs::read_to_string(&path) {
            Ok(contents) => {
                let run_id = contents.trim();
                if run_id.is_empty() {
                    Err(RecommenderError::ArtifactError(format!(
                        "{} is empty",
                        path.display()
                    )))
                } else {
                    Ok(Some(run_id.to_string()))
                }
            }
            Err(e) if e.kind() == IoErrorKind::NotFound => Ok(None),
            Err(e) => Err(RecommenderError::io(path, e)),
        }
    }

    /// Manifest of the live generation without loading its artifacts.
    pub fn current_manifest(&self) -> Result<Option<ArtifactManifest>> {
        match self.current_run()? {
            Some(run_id) => self.read_manifest(&self.generation_dir(&run_id)).map(Some),
            None => Ok(None),
        }
    }

    /// Write a new generation and publish it.
    ///
    /// On failure the staging directory is removed and `CURRENT` still names
    /// the previous generation.
    pub fn commit(
        &self,
        table: &CleanedRatingTable,
        matrix: &RatingMatrix,
        model: &NeighborModel,
    ) -> Result<ArtifactManifest> {
        let run_id = Uuid::new_v4();
        let staging = self.root.join(format!("{STAGING_PREFIX}{run_id}"));
        fs::create_dir_all(&staging).map_err(|e| RecommenderError::io(&staging, e))?;

        let manifest = match write_generation(&staging, run_id, table, matrix, model) {
            Ok(manifest) => manifest,
            Err(e) => {
                discard(&staging);
                return Err(e);
            }
        };

        let generations = self.root.join(GENERATIONS_DIR);
        let target = generations.join(run_id.to_string());
        if let Err(e) = fs::create_dir_all(&generations).and_then(|_| fs::rename(&staging, &target))
        {
            discard(&staging);
            return Err(RecommenderError::io(&target, e));
        }

        self.publish(&run_id.to_string())?;
        info!(
            run_id = %run_id,
            dir = %target.display(),
            "Published artifact generation"
        );

        self.prune(&run_id.to_string());
        Ok(manifest)
    }

    /// Load the live generation, or `None` before the first training run.
    pub fn load_current(&self) -> Result<Option<Snapshot>> {
        match self.current_run()? {
            Some(run_id) => self.load_generation(&run_id).map(Some),
            None => Ok(None),
        }
    }

    /// Load and cross-check every artifact of one generation.
    pub fn load_generation(&self, run_id: &str) -> Result<Snapshot> {
        let dir = self.generation_dir(run_id);
        let manifest = self.read_manifest(&dir)?;

        let table = CleanedRatingTable::from_cbor(&read_verified(&dir, FINAL_RATING, &manifest)?)?;
        let matrix = RatingMatrix::from_cbor(&read_verified(&dir, BOOK_PIVOT, &manifest)?)?;
        let model = NeighborModel::from_cbor(&read_verified(&dir, MODEL, &manifest)?)?;
        let titles: Vec<String> = serde_json::from_slice(&read_verified(&dir, TITLES, &manifest)?)
            .map_err(|e| RecommenderError::SerializationError(e.to_string()))?;

        let snapshot = Snapshot::new(manifest, table, matrix, &titles, model)?;
        debug!(run_id, books = titles.len(), "Loaded artifact generation");
        Ok(snapshot)
    }

    fn read_manifest(&self, dir: &Path) -> Result<ArtifactManifest> {
        let path = dir.join(MANIFEST);
        let bytes = fs::read(&path).map_err(|e| match e.kind() {
            IoErrorKind::NotFound => RecommenderError::ArtifactError(format!(
                "Generation {} has no manifest",
                dir.display()
            )),
            _ => RecommenderError::io(&path, e),
        })?;
        serde_json::from_slice(&bytes)
            .map_err(|e| RecommenderError::SerializationError(e.to_string()))
    }

    /// Atomically point `CURRENT` at `run_id`.
    fn publish(&self, run_id: &str) -> Result<()> {
        let tmp = self.root.join(format!("{CURRENT_FILE}.{run_id}.tmp"));
        write_file(&tmp, run_id.as_bytes())?;
        let current = self.root.join(CURRENT_FILE);
        fs::rename(&tmp, &current).map_err(|e| {
            discard_file(&tmp);
            RecommenderError::io(&current, e)
        })
    }

    /// Remove generations beyond `keep_generations`, never the live one.
    fn prune(&self, live: &str) {
        let generations = self.root.join(GENERATIONS_DIR);
        let entries = match fs::read_dir(&generations) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(error = %e, "Cannot list generations for pruning");
                return;
            }
        };

        let mut others: Vec<(Option<chrono::DateTime<Utc>>, PathBuf)> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_dir() && path.file_name().and_then(|n| n.to_str()) != Some(live))
            .map(|path| {
                let created = self.read_manifest(&path).ok().map(|m| m.created_at);
                (created, path)
            })
            .collect();

        // newest first; unreadable generations sort last
        others.sort_by(|a, b| b.0.cmp(&a.0));
        for (_, path) in others.into_iter().skip(self.keep_generations - 1) {
            match fs::remove_dir_all(&path) {
                Ok(()) => debug!(dir = %path.display(), "Pruned old generation"),
                Err(e) => warn!(dir = %path.display(), error = %e, "Failed to prune generation"),
            }
        }
    }
}

fn write_generation(
    dir: &Path,
    run_id: Uuid,
    table: &CleanedRatingTable,
    matrix: &RatingMatrix,
    model: &NeighborModel,
) -> Result<ArtifactManifest> {
    let mut checksums = BTreeMap::new();

    let mut csv = Vec::new();
    table.write_csv(&mut csv)?;
    write_artifact(dir, CLEAN_DATA_CSV, &csv, &mut checksums)?;
    write_artifact(dir, FINAL_RATING, &table.to_cbor()?, &mut checksums)?;
    write_artifact(dir, BOOK_PIVOT, &matrix.to_cbor()?, &mut checksums)?;
    write_artifact(dir, MODEL, &model.to_cbor()?, &mut checksums)?;
    let titles = serde_json::to_vec_pretty(matrix.titles())
        .map_err(|e| RecommenderError::SerializationError(e.to_string()))?;
    write_artifact(dir, TITLES, &titles, &mut checksums)?;

    let (books, users) = matrix.shape();
    let manifest = ArtifactManifest {
        run_id,
        created_at: Utc::now(),
        metric: model.metric(),
        records: table.len(),
        books,
        users,
        checksums,
    };
    let bytes = serde_json::to_vec_pretty(&manifest)
        .map_err(|e| RecommenderError::SerializationError(e.to_string()))?;
    write_file(&dir.join(MANIFEST), &bytes)?;
    Ok(manifest)
}

fn write_artifact(
    dir: &Path,
    name: &str,
    bytes: &[u8],
    checksums: &mut BTreeMap<String, String>,
) -> Result<()> {
    write_file(&dir.join(name), bytes)?;
    checksums.insert(name.to_string(), digest(bytes));
    Ok(())
}

fn read_verified(dir: &Path, name: &str, manifest: &ArtifactManifest) -> Result<Vec<u8>> {
    let path = dir.join(name);
    let bytes = fs::read(&path).map_err(|e| RecommenderError::io(&path, e))?;
    let expected = manifest.checksums.get(name).ok_or_else(|| {
        RecommenderError::ArtifactError(format!("Manifest has no checksum for {name}"))
    })?;
    if digest(&bytes) != *expected {
        return Err(RecommenderError::ArtifactError(format!(
            "Checksum mismatch for {}",
            path.display()
        )));
    }
    Ok(bytes)
}

/// Write and fsync a file.
fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut file = File::create(path).map_err(|e| RecommenderError::io(path, e))?;
    file.write_all(bytes)
        .and_then(|_| file.sync_all())
        .map_err(|e| RecommenderError::io(path, e))
}

fn digest(bytes: &[u8]) -> String {
    hex::encode(Sha3_256::digest(bytes))
}

fn discard(dir: &Path) {
    if let Err(e) = fs::remove_dir_all(dir) {
        warn!(dir = %dir.display(), error = %e, "Failed to remove staging directory");
    }
}

fn discard_file(path: &Path) {
    if let Err(e) = fs::remove_file(path) {
        warn!(path = %path.display(), error = %e, "Failed to remove temporary file");
    }
}
