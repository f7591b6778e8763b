use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RecommenderError {
    #[error("Data error: {0}")]
    DataError(String),

    #[error("I/O error at {}: {source}", path.display())]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Artifact error: {0}")]
    ArtifactError(String),

    #[error("Recommendation engine is not ready: {0}")]
    NotReady(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Download error: {0}")]
    DownloadError(String),
}

/// Coarse classification used by callers to branch on failures without
/// inspecting messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Input data is missing required columns or filters down to nothing.
    Data,
    /// Artifacts or inputs could not be read, written or decoded.
    Io,
    /// No trained snapshot is available yet.
    NotReady,
    /// The dataset could not be fetched.
    Network,
}

impl RecommenderError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::IoError {
            path: path.into(),
            source,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::DataError(_) => ErrorKind::Data,
            Self::IoError { .. } | Self::ArtifactError(_) | Self::SerializationError(_) => {
                ErrorKind::Io
            }
            Self::NotReady(_) => ErrorKind::NotReady,
            Self::DownloadError(_) => ErrorKind::Network,
        }
    }
}

pub type Result<T> = std::result::Result<T, RecommenderError>;
