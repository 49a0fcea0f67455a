//! Location-based prospect qualification.
//!
//! Region mapping and user rules are loaded once per run and shared read-only. Every row
//! is evaluated independently, and missing or unknown data always degrades to "not
//! qualified" instead of an error. Only the repository call can fail a batch.

pub mod batch;
mod data;
pub mod domain;
pub mod evaluation;
pub mod ingest;
pub mod regions;
pub mod repository;
pub mod router;
pub mod rules;
pub mod service;
pub mod storage;

#[cfg(test)]
mod tests;

pub use batch::{BatchOutcome, BatchQualifier, BatchReport};
pub use data::DataLoadError;
pub use domain::{BatchSummary, Location, Prospect, ProspectId, ProspectRow, UserId};
pub use evaluation::{
    DisqualifyReason, QualificationDecision, QualificationEvaluator, QualifyingMatch,
};
pub use ingest::{IngestError, ProspectCsvReader};
pub use regions::{RegionIndex, RegionMapping};
pub use repository::{ProspectRepository, RepositoryError, StoredProspect, UpsertReport};
pub use router::{qualification_router, QualifyResponse};
pub use rules::{QualificationRule, RuleLookup, UserRules, ALL_LOCATIONS};
pub use service::{ProspectQualificationService, QualificationServiceError};
pub use storage::SqliteProspectRepository;
