use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{Location, Prospect, ProspectId, UserId};

/// Persisted prospect with its bookkeeping timestamps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredProspect {
    pub user_id: UserId,
    pub prospect_id: ProspectId,
    pub location: Location,
    pub qualified: bool,
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

impl StoredProspect {
    /// Builds a fresh record for a keyed prospect; `None` when the key is incomplete.
    pub fn from_prospect(prospect: &Prospect, now: DateTime<Utc>) -> Option<Self> {
        let (user_id, prospect_id) = prospect.key()?;
        Some(Self {
            user_id: user_id.clone(),
            prospect_id: prospect_id.clone(),
            location: prospect.location.clone(),
            qualified: prospect.qualified,
            created_at: now,
            last_updated: now,
        })
    }

    /// Overwrites location and outcome, keeping the creation time.
    pub fn apply(&mut self, prospect: &Prospect, now: DateTime<Utc>) {
        self.location = prospect.location.clone();
        self.qualified = prospect.qualified;
        self.last_updated = now;
    }
}

/// Counts reported by one `upsert_batch` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpsertReport {
    pub inserted: usize,
    pub updated: usize,
    /// Prospects without a user or prospect id; they cannot be keyed and are not stored.
    pub skipped: usize,
}

impl UpsertReport {
    pub fn written(&self) -> usize {
        self.inserted + self.updated
    }
}

/// Storage abstraction for qualification results.
///
/// `upsert_batch` is idempotent per `(user_id, prospect_id)`: a repeated key overwrites the
/// stored location and outcome instead of adding a record.
pub trait ProspectRepository: Send + Sync {
    fn upsert_batch(&self, prospects: &[Prospect]) -> Result<UpsertReport, RepositoryError>;
    fn qualified(&self, limit: usize) -> Result<Vec<StoredProspect>, RepositoryError>;
    fn count(&self) -> Result<usize, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("storage failure: {0}")]
    Storage(String),
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

impl From<rusqlite::Error> for RepositoryError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Storage(err.to_string())
    }
}
