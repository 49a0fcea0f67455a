use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::Utc;
use serde_json::Value;

use crate::qualification::domain::{Location, Prospect, ProspectId, ProspectRow, UserId};
use crate::qualification::evaluation::QualificationEvaluator;
use crate::qualification::regions::{RegionIndex, RegionMapping};
use crate::qualification::repository::{
    ProspectRepository, RepositoryError, StoredProspect, UpsertReport,
};
use crate::qualification::rules::{QualificationRule, UserRules};

pub(super) fn region_mapping() -> RegionMapping {
    RegionMapping::from_json_str(
        r#"{
            "US": ["North America"],
            "US-CA": ["West Coast", "California"],
            "US-WA": ["West Coast", "Washington"],
            "US-NY": ["East Coast", "New York"],
            "US-TX": ["South", "Texas"],
            "CA": ["North America", "Canada"],
            "MX": ["North America", "Latin America"],
            "UK": ["Europe", "United Kingdom"],
            "FR": ["Europe", "European Union"],
            "DE": ["Europe", "European Union"],
            "NG": ["Africa", "Nigeria"],
            "JP": ["Asia", "Japan"],
            "": []
        }"#,
    )
    .expect("fixture mapping parses")
}

pub(super) fn region_index() -> Arc<RegionIndex> {
    Arc::new(RegionIndex::build(&region_mapping()))
}

pub(super) fn evaluator() -> QualificationEvaluator {
    QualificationEvaluator::new(region_index())
}

pub(super) fn rule(include: &[&str], exclude: &[&str]) -> QualificationRule {
    QualificationRule::new(include.iter().copied(), exclude.iter().copied())
}

pub(super) fn user_rules() -> UserRules {
    UserRules::from_json_str(
        r#"{
            "us_california_with_ny_exclusion": {
                "location_include": ["US-CA", "North America"],
                "location_exclude": ["US-NY"]
            },
            "europe_only_with_africa_exclusion": {
                "location_include": ["Europe"],
                "location_exclude": ["Africa"]
            },
            "empty_preferences": {
                "location_include": [],
                "location_exclude": []
            },
            "null_preferences": {
                "location_include": null,
                "location_exclude": null
            },
            "everywhere_but_asia": {
                "location_include": ["All"],
                "location_exclude": ["Asia"]
            }
        }"#,
    )
    .expect("fixture preferences parse")
}

pub(super) fn us(state: &str) -> Location {
    Location::subdivision("US", state)
}

pub(super) fn csv_row(user: &str, prospect: &str, country: &str, state: &str) -> ProspectRow {
    let cell = |value: &str| Some(value.to_string()).filter(|value| !value.is_empty());
    ProspectRow {
        user_id: cell(user),
        prospect_id: cell(prospect),
        country: cell(country),
        state: cell(state),
    }
}

/// In-memory repository that also records the size of every batch it receives.
#[derive(Default, Clone)]
pub(super) struct MemoryRepository {
    pub(super) records: Arc<Mutex<HashMap<(UserId, ProspectId), StoredProspect>>>,
    pub(super) calls: Arc<Mutex<Vec<usize>>>,
}

impl MemoryRepository {
    pub(super) fn calls(&self) -> Vec<usize> {
        self.calls.lock().expect("calls mutex poisoned").clone()
    }

    pub(super) fn stored(&self, user: &str, prospect: &str) -> Option<StoredProspect> {
        let key = (UserId(user.to_string()), ProspectId(prospect.to_string()));
        self.records
            .lock()
            .expect("repository mutex poisoned")
            .get(&key)
            .cloned()
    }
}

impl ProspectRepository for MemoryRepository {
    fn upsert_batch(&self, prospects: &[Prospect]) -> Result<UpsertReport, RepositoryError> {
        self.calls
            .lock()
            .expect("calls mutex poisoned")
            .push(prospects.len());

        let mut guard = self.records.lock().expect("repository mutex poisoned");
        let mut report = UpsertReport::default();
        let now = Utc::now();
        for prospect in prospects {
            let Some((user_id, prospect_id)) = prospect.key() else {
                report.skipped += 1;
                continue;
            };
            let key = (user_id.clone(), prospect_id.clone());
            match guard.get_mut(&key) {
                Some(existing) => {
                    existing.apply(prospect, now);
                    report.updated += 1;
                }
                None => {
                    if let Some(record) = StoredProspect::from_prospect(prospect, now) {
                        guard.insert(key, record);
                        report.inserted += 1;
                    }
                }
            }
        }
        Ok(report)
    }

    fn qualified(&self, limit: usize) -> Result<Vec<StoredProspect>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        let mut records: Vec<StoredProspect> = guard
            .values()
            .filter(|record| record.qualified)
            .cloned()
            .collect();
        records.sort_by(|a, b| {
            (&a.user_id, &a.prospect_id).cmp(&(&b.user_id, &b.prospect_id))
        });
        records.truncate(limit);
        Ok(records)
    }

    fn count(&self) -> Result<usize, RepositoryError> {
        Ok(self.records.lock().expect("repository mutex poisoned").len())
    }
}

pub(super) struct UnavailableRepository;

impl ProspectRepository for UnavailableRepository {
    fn upsert_batch(&self, _prospects: &[Prospect]) -> Result<UpsertReport, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn qualified(&self, _limit: usize) -> Result<Vec<StoredProspect>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn count(&self) -> Result<usize, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
