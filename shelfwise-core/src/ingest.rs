//! Dataset download and extraction.
//!
//! The dataset ships as a zip archive holding `Ratings.csv`, `Books.csv` and
//! friends. The archive is streamed to `raw_data_dir` with exponential
//! backoff on transient failures, then unpacked into `ingested_dir`.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use backoff::{future::retry_notify, ExponentialBackoff};
use reqwest::{Client, StatusCode};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::config::IngestionConfig;
use crate::error::{RecommenderError, Result};

const FALLBACK_ARCHIVE_NAME: &str = "dataset.zip";

/// Where an ingestion run left its files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestReport {
    pub archive: PathBuf,
    pub bytes: u64,
    pub extracted: Vec<PathBuf>,
}

pub struct DatasetIngestor {
    client: Client,
    config: IngestionConfig,
}

impl DatasetIngestor {
    pub fn new(config: IngestionConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                RecommenderError::DownloadError(format!("Failed to create HTTP client: {e}"))
            })?;
        Ok(Self { client, config })
    }

    /// Download the configured archive and extract it.
    pub async fn ingest(&self) -> Result<IngestReport> {
        let url = self.config.dataset_url.as_deref().ok_or_else(|| {
            RecommenderError::DownloadError(
                "No dataset URL configured (set SHELFWISE_DATASET_URL)".to_string(),
            )
        })?;

        info!(url, "Data ingestion stage started");
        let (archive, bytes) = self.download(url).await?;

        let dest = self.config.ingested_dir.clone();
        let source = archive.clone();
        let extracted = tokio::task::spawn_blocking(move || extract(&source, &dest))
            .await
            .map_err(|e| {
                RecommenderError::DownloadError(format!("Extraction task failed: {e}"))
            })??;

        info!(
            archive = %archive.display(),
            files = extracted.len(),
            dir = %self.config.ingested_dir.display(),
            "Data ingestion completed"
        );
        Ok(IngestReport {
            archive,
            bytes,
            extracted,
        })
    }

    /// Stream `url` into `raw_data_dir`, retrying transient failures.
    pub async fn download(&self, url: &str) -> Result<(PathBuf, u64)> {
        let dir = &self.config.raw_data_dir;
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| RecommenderError::io(dir, e))?;
        let target = dir.join(archive_name(url));

        let backoff = ExponentialBackoff {
            initial_interval: Duration::from_millis(500),
            max_interval: Duration::from_secs(10),
            max_elapsed_time: Some(self.config.timeout * self.config.max_retries.max(1)),
            ..Default::default()
        };

        let start = Instant::now();
        let bytes = retry_notify(
            backoff,
            || async { self.download_once(url, &target).await },
            |err: RecommenderError, duration: Duration| {
                warn!(
                    error = %err,
                    retry_after_ms = duration.as_millis() as u64,
                    "Retry scheduled"
                );
            },
        )
        .await?;

        info!(
            path = %target.display(),
            bytes,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Downloaded dataset archive"
        );
        Ok((target, bytes))
    }

    async fn download_once(
        &self,
        url: &str,
        target: &Path,
    ) -> std::result::Result<u64, backoff::Error<RecommenderError>> {
        let mut response = self.client.get(url).send().await.map_err(|e| {
            let err = RecommenderError::DownloadError(format!("Request to {url} failed: {e}"));
            if is_transient_error(&e) {
                backoff::Error::transient(err)
            } else {
                backoff::Error::permanent(err)
            }
        })?;

        let status = response.status();
        debug!(status = %status, "Received HTTP response");
        if !status.is_success() {
            let err = RecommenderError::DownloadError(format!("{url} returned status: {status}"));
            return if is_transient_status(status) {
                Err(backoff::Error::transient(err))
            } else {
                Err(backoff::Error::permanent(err))
            };
        }

        // each attempt starts the file over
        let mut file = tokio::fs::File::create(target)
            .await
            .map_err(|e| backoff::Error::permanent(RecommenderError::io(target, e)))?;

        let mut written = 0u64;
        loop {
            let chunk = response.chunk().await.map_err(|e| {
                let err = RecommenderError::DownloadError(format!("Download interrupted: {e}"));
                if is_transient_error(&e) || e.is_body() {
                    backoff::Error::transient(err)
                } else {
                    backoff::Error::permanent(err)
                }
            })?;
            let Some(chunk) = chunk else { break };
            file.write_all(&chunk)
                .await
                .map_err(|e| backoff::Error::permanent(RecommenderError::io(target, e)))?;
            written += chunk.len() as u64;
        }
        file.sync_all()
            .await
            .map_err(|e| backoff::Error::permanent(RecommenderError::io(target, e)))?;

        Ok(written)
    }
}

/// Unpack `archive` into `dest`, returning the paths of the extracted files.
pub fn extract(archive: &Path, dest: &Path) -> Result<Vec<PathBuf>> {
    let file = File::open(archive).map_err(|e| RecommenderError::io(archive, e))?;
    let mut zip = zip::ZipArchive::new(file).map_err(|e| {
        RecommenderError::DownloadError(format!("{} is not a zip archive: {e}", archive.display()))
    })?;

    std::fs::create_dir_all(dest).map_err(|e| RecommenderError::io(dest, e))?;

    let mut files = Vec::new();
    for i in 0..zip.len() {
        let entry = zip.by_index(i).map_err(|e| {
            RecommenderError::DownloadError(format!("Corrupt entry in {}: {e}", archive.display()))
        })?;
        if let Some(name) = entry.enclosed_name().filter(|_| entry.is_file()) {
            files.push(dest.join(name));
        }
    }

    zip.extract(dest).map_err(|e| {
        RecommenderError::DownloadError(format!("Failed to extract {}: {e}", archive.display()))
    })?;

    debug!(files = files.len(), dir = %dest.display(), "Extracted archive");
    Ok(files)
}

/// File name for the downloaded archive: the last URL path segment.
pub fn archive_name(url: &str) -> String {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    path.rsplit('/')
        .next()
        .filter(|name| !name.is_empty() && !name.contains(':'))
        .unwrap_or(FALLBACK_ARCHIVE_NAME)
        .to_string()
}

/// Check if a reqwest error is transient and should be retried.
pub fn is_transient_error(error: &reqwest::Error) -> bool {
    error.is_timeout() || error.is_connect() || error.is_request()
}

/// Check if an HTTP status code indicates a transient error.
pub fn is_transient_status(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::TOO_MANY_REQUESTS
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT
            | StatusCode::BAD_GATEWAY
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;
    use zip::write::SimpleFileOptions;

    fn write_zip(path: &Path, entries: &[(&str, &str)]) {
        let mut zip = zip::ZipWriter::new(File::create(path).unwrap());
        let options =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
        for (name, contents) in entries {
            zip.start_file(*name, options).unwrap();
            zip.write_all(contents.as_bytes()).unwrap();
        }
        zip.finish().unwrap();
    }

    #[test]
    fn test_archive_name() {
        assert_eq!(
            archive_name("https://example.com/data/book_data.zip"),
            "book_data.zip"
        );
        assert_eq!(
            archive_name("https://example.com/data/book_data.zip?raw=true"),
            "book_data.zip"
        );
        assert_eq!(archive_name("https://example.com/"), FALLBACK_ARCHIVE_NAME);
        assert_eq!(archive_name("https:"), FALLBACK_ARCHIVE_NAME);
    }

    #[test]
    fn test_transient_status_codes() {
        assert!(is_transient_status(StatusCode::TOO_MANY_REQUESTS));
        assert!(is_transient_status(StatusCode::SERVICE_UNAVAILABLE));
        assert!(is_transient_status(StatusCode::GATEWAY_TIMEOUT));
        assert!(is_transient_status(StatusCode::BAD_GATEWAY));
        assert!(!is_transient_status(StatusCode::NOT_FOUND));
        assert!(!is_transient_status(StatusCode::INTERNAL_SERVER_ERROR));
    }

    #[test]
    fn test_extract_unpacks_csv_files() {
        let dir = TempDir::new().unwrap();
        let archive = dir.path().join("book_data.zip");
        write_zip(
            &archive,
            &[
                ("Ratings.csv", "User-ID,ISBN,Book-Rating\n1,0001,5\n"),
                ("Books.csv", "ISBN,Book-Title\n0001,Dune\n"),
            ],
        );

        let dest = dir.path().join("ingested");
        let files = extract(&archive, &dest).unwrap();
        assert_eq!(files.len(), 2);
        assert!(dest.join("Ratings.csv").exists());
        let books = std::fs::read_to_string(dest.join("Books.csv")).unwrap();
        assert!(books.contains("Dune"));
    }

    #[test]
    fn test_extract_rejects_non_zip() {
        let dir = TempDir::new().unwrap();
        let archive = dir.path().join("not.zip");
        std::fs::write(&archive, b"plain text").unwrap();
        let err = extract(&archive, &dir.path().join("out")).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Network);
    }

    #[tokio::test]
    async fn test_ingest_without_url_fails() {
        let dir = TempDir::new().unwrap();
        let config = IngestionConfig {
            dataset_url: None,
            raw_data_dir: dir.path().join("raw"),
            ingested_dir: dir.path().join("ingested"),
            ..IngestionConfig::default()
        };
        let ingestor = DatasetIngestor::new(config).unwrap();
        let err = ingestor.ingest().await.unwrap_err();
        assert!(matches!(err, RecommenderError::DownloadError(_)));
    }
}
