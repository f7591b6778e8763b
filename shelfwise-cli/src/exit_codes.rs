//! Exit codes following sysexits.h conventions.
//!
//! Engine failures are classified by [`ErrorKind`] so scripts can tell a
//! missing model from a bad dataset without parsing messages.

use shelfwise_core::{ErrorKind, RecommenderError};

/// Successful execution.
pub const SUCCESS: i32 = 0;

/// General error (catch-all).
pub const GENERAL_ERROR: i32 = 1;

/// Dataset is unusable (missing columns, filtered down to nothing).
/// Maps to EX_DATAERR from sysexits.h.
pub const DATA_ERROR: i32 = 65;

/// Cannot open input file.
/// Maps to EX_NOINPUT from sysexits.h.
pub const INPUT_ERROR: i32 = 66;

/// Service unavailable (no trained model, dataset download failed).
/// Maps to EX_UNAVAILABLE from sysexits.h.
pub const UNAVAILABLE: i32 = 69;

/// I/O error (artifacts unreadable or unwritable).
/// Maps to EX_IOERR from sysexits.h.
pub const IO_ERROR: i32 = 74;

/// Represents an exit code with optional error context.
pub struct ExitCode {
    pub code: i32,
    pub message: Option<String>,
}

impl ExitCode {
    pub const fn success() -> Self {
        Self {
            code: SUCCESS,
            message: None,
        }
    }

    pub fn from_anyhow(err: &anyhow::Error) -> Self {
        let code = err
            .chain()
            .find_map(|cause| cause.downcast_ref::<RecommenderError>())
            .map_or(GENERAL_ERROR, code_for);

        Self {
            code,
            message: Some(format!("{err:#}")),
        }
    }
}

fn code_for(err: &RecommenderError) -> i32 {
    match err {
        RecommenderError::IoError { source, .. }
            if source.kind() == std::io::ErrorKind::NotFound =>
        {
            INPUT_ERROR
        }
        other => match other.kind() {
            ErrorKind::Data => DATA_ERROR,
            ErrorKind::Io => IO_ERROR,
            ErrorKind::NotReady | ErrorKind::Network => UNAVAILABLE,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_errors_map_to_sysexits() {
        let cases = [
            (RecommenderError::DataError("empty".into()), DATA_ERROR),
            (RecommenderError::NotReady("untrained".into()), UNAVAILABLE),
            (RecommenderError::DownloadError("503".into()), UNAVAILABLE),
            (RecommenderError::ArtifactError("checksum".into()), IO_ERROR),
            (
                RecommenderError::io(
                    "Ratings.csv",
                    std::io::Error::from(std::io::ErrorKind::NotFound),
                ),
                INPUT_ERROR,
            ),
            (
                RecommenderError::io(
                    "artifacts",
                    std::io::Error::from(std::io::ErrorKind::PermissionDenied),
                ),
                IO_ERROR,
            ),
        ];

        for (err, expected) in cases {
            let err = anyhow::Error::new(err);
            assert_eq!(ExitCode::from_anyhow(&err).code, expected, "{err}");
        }
    }

    #[test]
    fn test_context_keeps_classification() {
        let err = anyhow::Error::new(RecommenderError::DataError("no rows".into()))
            .context("Training failed");
        let exit = ExitCode::from_anyhow(&err);
        assert_eq!(exit.code, DATA_ERROR);
        assert!(exit.message.unwrap().contains("no rows"));
    }

    #[test]
    fn test_other_errors_are_general() {
        let err = anyhow::anyhow!("something else");
        assert_eq!(ExitCode::from_anyhow(&err).code, GENERAL_ERROR);
    }
}
