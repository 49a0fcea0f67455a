//! Prospect rows read from CSV exports.
//!
//! Parsing never rejects a row: cells are trimmed, empty cells become `None`, and a record
//! the reader cannot decode is kept as a row with every field cleared.

mod parser;

use std::io::Read;
use std::path::Path;

use super::domain::ProspectRow;

/// Failure to read the prospect source itself.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("failed to read prospect export: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid prospect CSV data: {0}")]
    Csv(#[from] csv::Error),
}

pub struct ProspectCsvReader;

impl ProspectCsvReader {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Vec<ProspectRow>, IngestError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Vec<ProspectRow>, IngestError> {
        Ok(parser::parse_rows(reader)?)
    }
}
