//! Recommendation service: owns the live snapshot, answers queries and
//! retrains.

use std::sync::{Arc, PoisonError, RwLock};
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::artifacts::ArtifactStore;
use crate::clean::clean;
use crate::config::EngineConfig;
use crate::data::RawTable;
use crate::error::{RecommenderError, Result};
use crate::matrix::build_matrix;
use crate::model::NeighborModel;
use crate::resolver::TitleResolver;
use crate::snapshot::{QueryResult, Snapshot};

/// Summary of a successful training run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrainingReport {
    pub run_id: Uuid,
    pub records: usize,
    pub books: usize,
    pub users: usize,
    pub duration_ms: u64,
}

/// Point-in-time view of what the service is serving.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceStatus {
    pub ready: bool,
    pub run_id: Option<Uuid>,
    pub trained_at: Option<DateTime<Utc>>,
    pub records: usize,
    pub books: usize,
    pub users: usize,
}

pub struct RecommendationService {
    config: EngineConfig,
    store: ArtifactStore,
    resolver: TitleResolver,
    current: RwLock<Option<Arc<Snapshot>>>,
}

impl RecommendationService {
    /// Open the artifact store and load the current generation, if any.
    ///
    /// An empty store gives a service that is not ready; a corrupt generation
    /// is an error.
    pub fn open(config: EngineConfig) -> Result<Self> {
        let store = ArtifactStore::new(&config.artifacts_dir, config.keep_generations);
        let current = store.load_current()?.map(Arc::new);

        match &current {
            Some(snapshot) => info!(
                run_id = %snapshot.manifest().run_id,
                books = snapshot.manifest().books,
                "Loaded trained snapshot"
            ),
            None => warn!(
                dir = %config.artifacts_dir.display(),
                "No trained snapshot found; train before querying"
            ),
        }

        Ok(Self {
            config,
            store,
            resolver: TitleResolver::default(),
            current: RwLock::new(current),
        })
    }

    #[must_use]
    pub fn with_resolver(mut self, resolver: TitleResolver) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// Re-read the current generation from disk. Returns whether one exists.
    ///
    /// On error the in-memory snapshot is left as it was.
    pub fn reload(&self) -> Result<bool> {
        match self.store.load_current()? {
            Some(snapshot) => {
                self.install(Arc::new(snapshot));
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.snapshot().is_some()
    }

    /// The snapshot in effect right now.
    pub fn snapshot(&self) -> Option<Arc<Snapshot>> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn status(&self) -> ServiceStatus {
        match self.snapshot() {
            Some(snapshot) => {
                let manifest = snapshot.manifest();
                ServiceStatus {
                    ready: true,
                    run_id: Some(manifest.run_id),
                    trained_at: Some(manifest.created_at),
                    records: manifest.records,
                    books: manifest.books,
                    users: manifest.users,
                }
            }
            None => ServiceStatus {
                ready: false,
                run_id: None,
                trained_at: None,
                records: 0,
                books: 0,
                users: 0,
            },
        }
    }

    pub fn recommend(&self, book_name: &str) -> Result<QueryResult> {
        let snapshot = self.snapshot().ok_or_else(|| {
            RecommenderError::NotReady("no model has been trained yet".to_string())
        })?;
        snapshot.recommend(book_name, &self.resolver, self.config.n_neighbors)
    }

    /// Retrain from the configured CSV files.
    pub fn retrain(&self) -> Result<TrainingReport> {
        info!(
            ratings = %self.config.ratings_csv.display(),
            books = %self.config.books_csv.display(),
            "Data validation stage started"
        );
        let ratings = RawTable::from_csv_path(&self.config.ratings_csv, self.config.delimiter)?;
        let books = RawTable::from_csv_path(&self.config.books_csv, self.config.delimiter)?;
        if ratings.skipped_rows() + books.skipped_rows() > 0 {
            warn!(
                ratings = ratings.skipped_rows(),
                books = books.skipped_rows(),
                "Skipped malformed CSV rows"
            );
        }
        self.train_from_tables(&ratings, &books)
    }

    /// Clean, pivot, fit, persist, then swap the live snapshot.
    ///
    /// Nothing is published unless every stage succeeds.
    pub fn train_from_tables(&self, ratings: &RawTable, books: &RawTable) -> Result<TrainingReport> {
        let started = Instant::now();

        let table = clean(ratings, books, &self.config.cleaning)?;
        info!("Data transformation stage started");
        let matrix = build_matrix(&table)?;
        info!("Model trainer stage started");
        let model = NeighborModel::train(&matrix)?;

        let manifest = self.store.commit(&table, &matrix, &model)?;
        let titles = matrix.titles().to_vec();
        let snapshot = Snapshot::new(manifest, table, matrix, &titles, model)?;

        let manifest = snapshot.manifest();
        let report = TrainingReport {
            run_id: manifest.run_id,
            records: manifest.records,
            books: manifest.books,
            users: manifest.users,
            duration_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        };
        self.install(Arc::new(snapshot));

        info!(
            run_id = %report.run_id,
            books = report.books,
            users = report.users,
            duration_ms = report.duration_ms,
            "Training completed"
        );
        Ok(report)
    }

    fn install(&self, snapshot: Arc<Snapshot>) {
        *self
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(snapshot);
    }
}
