use chrono::Utc;
use metrics_exporter_prometheus::PrometheusHandle;
use prospect_qualify::config::DataConfig;
use prospect_qualify::error::AppError;
use prospect_qualify::qualification::{
    Prospect, ProspectId, ProspectQualificationService, ProspectRepository,
    QualificationServiceError, RepositoryError, SqliteProspectRepository, StoredProspect,
    UpsertReport, UserId,
};
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

type RecordMap = HashMap<(UserId, ProspectId), StoredProspect>;

/// Process-local store used when no database file is configured.
#[derive(Default, Clone)]
pub(crate) struct InMemoryProspectRepository {
    records: Arc<Mutex<RecordMap>>,
}

impl InMemoryProspectRepository {
    fn records(&self) -> Result<MutexGuard<'_, RecordMap>, RepositoryError> {
        self.records
            .lock()
            .map_err(|_| RepositoryError::Unavailable("repository mutex poisoned".to_string()))
    }
}

impl ProspectRepository for InMemoryProspectRepository {
    fn upsert_batch(&self, prospects: &[Prospect]) -> Result<UpsertReport, RepositoryError> {
        let mut guard = self.records()?;
        let mut report = UpsertReport::default();
        let now = Utc::now();

        for prospect in prospects {
            let Some((user_id, prospect_id)) = prospect.key() else {
                report.skipped += 1;
                continue;
            };
            let key = (user_id.clone(), prospect_id.clone());
            if let Some(existing) = guard.get_mut(&key) {
                existing.apply(prospect, now);
                report.updated += 1;
            } else if let Some(record) = StoredProspect::from_prospect(prospect, now) {
                guard.insert(key, record);
                report.inserted += 1;
            }
        }

        Ok(report)
    }

    fn qualified(&self, limit: usize) -> Result<Vec<StoredProspect>, RepositoryError> {
        let guard = self.records()?;
        let mut records: Vec<StoredProspect> = guard
            .values()
            .filter(|record| record.qualified)
            .cloned()
            .collect();
        records.sort_by(|a, b| (&a.user_id, &a.prospect_id).cmp(&(&b.user_id, &b.prospect_id)));
        records.truncate(limit);
        Ok(records)
    }

    fn count(&self) -> Result<usize, RepositoryError> {
        Ok(self.records()?.len())
    }
}

/// Repository selected from configuration: SQLite when a database path is set.
pub(crate) enum ConfiguredRepository {
    Memory(InMemoryProspectRepository),
    Sqlite(SqliteProspectRepository),
}

impl ConfiguredRepository {
    pub(crate) fn from_config(config: &DataConfig) -> Result<Self, RepositoryError> {
        match &config.database_path {
            Some(path) => {
                info!(path = %path.display(), "using sqlite prospect store");
                Ok(Self::Sqlite(SqliteProspectRepository::open(
                    path,
                    config.batch_size,
                )?))
            }
            None => {
                info!("using in-memory prospect store");
                Ok(Self::Memory(InMemoryProspectRepository::default()))
            }
        }
    }
}

impl ProspectRepository for ConfiguredRepository {
    fn upsert_batch(&self, prospects: &[Prospect]) -> Result<UpsertReport, RepositoryError> {
        match self {
            Self::Memory(repository) => repository.upsert_batch(prospects),
            Self::Sqlite(repository) => repository.upsert_batch(prospects),
        }
    }

    fn qualified(&self, limit: usize) -> Result<Vec<StoredProspect>, RepositoryError> {
        match self {
            Self::Memory(repository) => repository.qualified(limit),
            Self::Sqlite(repository) => repository.qualified(limit),
        }
    }

    fn count(&self) -> Result<usize, RepositoryError> {
        match self {
            Self::Memory(repository) => repository.count(),
            Self::Sqlite(repository) => repository.count(),
        }
    }
}

pub(crate) type QualificationService = ProspectQualificationService<ConfiguredRepository>;

/// Loads the reference data named in `config` and wires the configured repository.
pub(crate) fn build_service(config: &DataConfig) -> Result<Arc<QualificationService>, AppError> {
    let repository =
        ConfiguredRepository::from_config(config).map_err(QualificationServiceError::from)?;
    let service = ProspectQualificationService::from_files(
        &config.regions_path,
        &config.preferences_path,
        Arc::new(repository),
        config.prospects_path.clone(),
    )?;
    Ok(Arc::new(service))
}
