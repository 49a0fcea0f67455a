use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::batch::{BatchQualifier, BatchReport};
use super::data::DataLoadError;
use super::domain::Location;
use super::ingest::{IngestError, ProspectCsvReader};
use super::regions::{RegionIndex, RegionMapping};
use super::repository::{ProspectRepository, RepositoryError, StoredProspect};
use super::rules::UserRules;

/// Service composing the region index, the user rules, and the repository for batch runs.
pub struct ProspectQualificationService<R> {
    qualifier: BatchQualifier<R>,
    index: Arc<RegionIndex>,
    rules: Arc<UserRules>,
    repository: Arc<R>,
    prospects_path: PathBuf,
}

impl<R> ProspectQualificationService<R>
where
    R: ProspectRepository + 'static,
{
    pub fn new(
        index: Arc<RegionIndex>,
        rules: Arc<UserRules>,
        repository: Arc<R>,
        prospects_path: impl Into<PathBuf>,
    ) -> Self {
        let qualifier = BatchQualifier::new(index.clone(), repository.clone());
        Self {
            qualifier,
            index,
            rules,
            repository,
            prospects_path: prospects_path.into(),
        }
    }

    /// Loads the mapping and preference documents and builds the service around them.
    pub fn from_files(
        regions_path: impl AsRef<Path>,
        preferences_path: impl AsRef<Path>,
        repository: Arc<R>,
        prospects_path: impl Into<PathBuf>,
    ) -> Result<Self, DataLoadError> {
        let mapping = RegionMapping::from_path(regions_path)?;
        let rules = UserRules::from_path(preferences_path)?;
        Ok(Self::new(
            Arc::new(RegionIndex::build(&mapping)),
            Arc::new(rules),
            repository,
            prospects_path,
        ))
    }

    pub fn prospects_path(&self) -> &Path {
        &self.prospects_path
    }

    /// Qualifies the configured prospect export.
    pub fn run(&self) -> Result<BatchReport, QualificationServiceError> {
        let rows = ProspectCsvReader::from_path(&self.prospects_path)?;
        Ok(self.qualifier.qualify(rows, &self.rules)?)
    }

    /// Qualifies rows read from any CSV source.
    pub fn run_reader<T: Read>(&self, reader: T) -> Result<BatchReport, QualificationServiceError> {
        let rows = ProspectCsvReader::from_reader(reader)?;
        Ok(self.qualifier.qualify(rows, &self.rules)?)
    }

    pub fn qualified(&self, limit: usize) -> Result<Vec<StoredProspect>, QualificationServiceError> {
        Ok(self.repository.qualified(limit)?)
    }

    /// Regions resolved for a location, sorted by name.
    pub fn regions_for(&self, location: &Location) -> Vec<String> {
        self.index
            .regions_for(location)
            .into_iter()
            .map(str::to_string)
            .collect()
    }
}

/// Error raised by the qualification service.
#[derive(Debug, thiserror::Error)]
pub enum QualificationServiceError {
    #[error(transparent)]
    Ingest(#[from] IngestError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
