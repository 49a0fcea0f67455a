use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;

/// Failure to read one of the JSON configuration documents.
#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid JSON in {origin}: {source}")]
    Json {
        origin: String,
        #[source]
        source: serde_json::Error,
    },
}

pub(crate) fn read_json_path<T: DeserializeOwned>(path: &Path) -> Result<T, DataLoadError> {
    let file = File::open(path).map_err(|source| DataLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    read_json(BufReader::new(file), &path.display().to_string())
}

pub(crate) fn read_json<T: DeserializeOwned, R: Read>(
    reader: R,
    origin: &str,
) -> Result<T, DataLoadError> {
    serde_json::from_reader(reader).map_err(|source| DataLoadError::Json {
        origin: origin.to_string(),
        source,
    })
}
