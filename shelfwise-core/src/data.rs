//! Tabular inputs and the cleaned rating table.
//!
//! Raw CSV files are read as Latin-1 byte records, which is how the
//! Book-Crossing dumps are encoded. Rows that cannot be parsed are skipped
//! and counted instead of aborting the whole load.

use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{RecommenderError, Result};

/// A raw CSV table: header names plus string cells.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    skipped: usize,
}

impl RawTable {
    /// Build a table from in-memory rows.
    ///
    /// Rows whose width differs from the header are dropped and counted as
    /// skipped, the same as when reading from a file.
    pub fn new<H, R>(headers: H, rows: R) -> Self
    where
        H: IntoIterator,
        H::Item: Into<String>,
        R: IntoIterator<Item = Vec<String>>,
    {
        let headers: Vec<String> = headers.into_iter().map(Into::into).collect();
        let mut skipped = 0;
        let rows = rows
            .into_iter()
            .filter(|row| {
                let keep = row.len() == headers.len();
                if !keep {
                    skipped += 1;
                }
                keep
            })
            .collect();
        Self {
            headers,
            rows,
            skipped,
        }
    }

    /// Read a CSV file with the given field separator.
    pub fn from_csv_path(path: &Path, delimiter: u8) -> Result<Self> {
        let file = File::open(path).map_err(|e| RecommenderError::io(path, e))?;
        let table = read_csv(BufReader::new(file), delimiter, path)?;
        debug!(
            path = %path.display(),
            rows = table.len(),
            columns = table.headers.len(),
            skipped = table.skipped,
            "Loaded CSV"
        );
        Ok(table)
    }

    /// Read CSV data from any reader.
    pub fn from_reader<R: Read>(reader: R, delimiter: u8) -> Result<Self> {
        read_csv(reader, delimiter, Path::new("<reader>"))
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of malformed rows dropped while loading.
    pub fn skipped_rows(&self) -> usize {
        self.skipped
    }
}

fn read_csv<R: Read>(reader: R, delimiter: u8, origin: &Path) -> Result<RawTable> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = reader
        .byte_headers()
        .map_err(|e| csv_error(e, origin))?
        .iter()
        .map(decode_latin1)
        .collect();

    let mut rows = Vec::new();
    let mut skipped = 0;
    for record in reader.byte_records() {
        match record {
            Ok(record) if record.len() == headers.len() => {
                rows.push(record.iter().map(decode_latin1).collect());
            }
            Ok(record) => {
                skipped += 1;
                debug!(
                    line = record.position().map(|p| p.line()),
                    fields = record.len(),
                    expected = headers.len(),
                    "Skipping row with wrong field count"
                );
            }
            Err(e) if e.is_io_error() => return Err(csv_error(e, origin)),
            Err(e) => {
                skipped += 1;
                debug!(error = %e, "Skipping unparsable CSV row");
            }
        }
    }

    if skipped > 0 {
        warn!(path = %origin.display(), skipped, "Skipped malformed CSV rows");
    }

    Ok(RawTable {
        headers,
        rows,
        skipped,
    })
}

fn csv_error(err: csv::Error, origin: &Path) -> RecommenderError {
    match err.into_kind() {
        csv::ErrorKind::Io(source) => RecommenderError::io(origin, source),
        other => RecommenderError::DataError(format!(
            "Failed to read CSV header from {}: {:?}",
            origin.display(),
            other
        )),
    }
}

/// Latin-1 maps every byte to the code point of the same value.
fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

/// One rating joined with its book metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingRecord {
    pub user_id: u64,
    /// Opaque identifier; never parsed as a number so leading zeros survive
    pub isbn: String,
    pub rating: f32,
    pub title: String,
    pub author: String,
    pub year: String,
    pub publisher: String,
    pub image_url: String,
    /// Ratings the title received after the ISBN join, before deduplication
    pub num_of_rating: usize,
}

/// Ratings restricted to active users and popular titles, one row per
/// (user, title).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CleanedRatingTable {
    records: Vec<RatingRecord>,
}

impl CleanedRatingTable {
    pub fn new(records: Vec<RatingRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[RatingRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Image URL of the first record with this title, if it has one.
    pub fn poster_url(&self, title: &str) -> Option<&str> {
        self.records
            .iter()
            .find(|r| r.title == title)
            .map(|r| r.image_url.as_str())
            .filter(|url| !url.is_empty())
    }

    /// Write the table as CSV with a header row.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut writer = csv::Writer::from_writer(writer);
        for record in &self.records {
            writer
                .serialize(record)
                .map_err(|e| RecommenderError::SerializationError(e.to_string()))?;
        }
        writer
            .flush()
            .map_err(|e| RecommenderError::SerializationError(e.to_string()))
    }

    /// Serialize the table to CBOR bytes.
    pub fn to_cbor(&self) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        ciborium::into_writer(self, &mut bytes)
            .map_err(|e| RecommenderError::SerializationError(e.to_string()))?;
        Ok(bytes)
    }

    /// Deserialize a table from CBOR bytes.
    pub fn from_cbor(bytes: &[u8]) -> Result<Self> {
        ciborium::from_reader(bytes)
            .map_err(|e| RecommenderError::SerializationError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(user_id: u64, title: &str, image_url: &str) -> RatingRecord {
        RatingRecord {
            user_id,
            isbn: "0195153448".into(),
            rating: 5.0,
            title: title.into(),
            author: "Author".into(),
            year: "2002".into(),
            publisher: "Publisher".into(),
            image_url: image_url.into(),
            num_of_rating: 1,
        }
    }

    #[test]
    fn test_reader_keeps_isbn_as_text() {
        let csv = "User-ID,ISBN,Book-Rating\n276725,034545104X,0\n276726,0155061224,5\n";
        let table = RawTable::from_reader(csv.as_bytes(), b',').unwrap();
        assert_eq!(table.headers(), ["User-ID", "ISBN", "Book-Rating"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows()[1][1], "0155061224");
    }

    #[test]
    fn test_reader_skips_rows_with_wrong_width() {
        let csv = "a,b,c\n1,2,3\n1,2\n1,2,3,4\n4,5,6\n";
        let table = RawTable::from_reader(csv.as_bytes(), b',').unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.skipped_rows(), 2);
    }

    #[test]
    fn test_reader_handles_quotes_and_latin1() {
        let mut csv = b"ISBN,Book-Title\n".to_vec();
        csv.extend_from_slice(b"0001,\"Caf\xe9, Society\"\n");
        let table = RawTable::from_reader(csv.as_slice(), b',').unwrap();
        assert_eq!(table.rows()[0][1], "Café, Society");
    }

    #[test]
    fn test_reader_custom_delimiter() {
        let csv = "\"User-ID\";\"ISBN\";\"Book-Rating\"\n\"1\";\"0002\";\"7\"\n";
        let table = RawTable::from_reader(csv.as_bytes(), b';').unwrap();
        assert_eq!(table.rows()[0], ["1", "0002", "7"]);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = RawTable::from_csv_path(Path::new("/nonexistent/ratings.csv"), b',')
            .expect_err("file does not exist");
        assert_eq!(err.kind(), crate::ErrorKind::Io);
    }

    #[test]
    fn test_new_drops_ragged_rows() {
        let table = RawTable::new(
            ["a", "b"],
            vec![
                vec!["1".to_string(), "2".to_string()],
                vec!["3".to_string()],
            ],
        );
        assert_eq!(table.len(), 1);
        assert_eq!(table.skipped_rows(), 1);
    }

    #[test]
    fn test_poster_url_takes_first_match() {
        let table = CleanedRatingTable::new(vec![
            record(1, "Dune", "http://img/dune-1.jpg"),
            record(2, "Dune", "http://img/dune-2.jpg"),
            record(3, "Emma", ""),
        ]);
        assert_eq!(table.poster_url("Dune"), Some("http://img/dune-1.jpg"));
        assert_eq!(table.poster_url("Emma"), None);
        assert_eq!(table.poster_url("Missing"), None);
    }

    #[test]
    fn test_write_csv_has_header() {
        let table = CleanedRatingTable::new(vec![record(7, "Dune", "http://img/dune.jpg")]);
        let mut out = Vec::new();
        table.write_csv(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("user_id,isbn,rating,title,author,year,publisher,image_url,num_of_rating")
        );
        assert!(lines.next().unwrap().starts_with("7,0195153448,5.0,Dune,"));
    }
}
