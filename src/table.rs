//! # Tabular Loader
//!
//! Reads a delimited study file (CSV or TSV) with a header row into string
//! records. Column interpretation happens later, once the user has picked the
//! group, time and measurement columns (see [`crate::dataset`]).

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Errors that can occur while loading a study table
#[derive(Debug, thiserror::Error)]
pub enum TableError {
    /// I/O error reading the study file
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    /// CSV/TSV parsing error
    #[error("CSV parsing error: {0}")]
    CsvError(#[from] csv::Error),

    /// The file has no header row
    #[error("Study file is empty")]
    Empty,
}

/// A study file held as a header row plus string records
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    headers: Vec<String>,
    records: Vec<Vec<String>>,
}

impl Table {
    /// Build a table directly from headers and records.
    ///
    /// Short records are padded with empty cells; cells beyond the header
    /// width are dropped.
    pub fn new(headers: Vec<String>, records: Vec<Vec<String>>) -> Self {
        let width = headers.len();
        let records = records
            .into_iter()
            .map(|mut record| {
                record.resize(width, String::new());
                record
            })
            .collect();
        Self { headers, records }
    }

    /// Load a table from a file, picking the delimiter from the extension
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, TableError> {
        let path = path.as_ref();
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file), delimiter_for(path))
    }

    /// Parse a table from any reader
    pub fn from_reader<R: Read>(reader: R, delimiter: u8) -> Result<Self, TableError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .flexible(true)
            .has_headers(true)
            .from_reader(reader);

        let headers: Vec<String> = csv_reader
            .headers()?
            .iter()
            .map(|s| s.trim().trim_start_matches('\u{feff}').to_string())
            .collect();

        if headers.is_empty() || headers.iter().all(|h| h.is_empty()) {
            return Err(TableError::Empty);
        }

        let mut records = Vec::new();
        for record in csv_reader.records() {
            let record = record?;
            if record.iter().all(|v| v.trim().is_empty()) {
                continue;
            }
            records.push(record.iter().map(|v| v.trim().to_string()).collect());
        }

        Ok(Self::new(headers, records))
    }

    /// Column names in file order
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Position of a column, if present
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Whether a column with this name exists
    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Data rows, each padded to the header width
    pub fn records(&self) -> &[Vec<String>] {
        &self.records
    }

    /// Number of data rows
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True if the table has no data rows
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Delimiter used for a study file: tab for `.tsv`/`.tab`, comma otherwise
pub fn delimiter_for(path: &Path) -> u8 {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("tsv") | Some("tab") => b'\t',
        _ => b',',
    }
}
