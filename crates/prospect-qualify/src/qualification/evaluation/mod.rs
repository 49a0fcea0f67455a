mod policy;

pub use policy::{DisqualifyReason, QualificationDecision, QualifyingMatch};

use std::sync::Arc;

use super::domain::Location;
use super::regions::RegionIndex;
use super::rules::QualificationRule;
use policy::decide_outcome;

/// Stateless evaluator applying a user's rule to a location through the shared region index.
#[derive(Debug, Clone)]
pub struct QualificationEvaluator {
    index: Arc<RegionIndex>,
}

impl QualificationEvaluator {
    pub fn new(index: Arc<RegionIndex>) -> Self {
        Self { index }
    }

    pub fn index(&self) -> &RegionIndex {
        &self.index
    }

    pub fn evaluate(&self, location: &Location, rule: &QualificationRule) -> QualificationDecision {
        let Some(canonical) = location.canonical() else {
            return QualificationDecision::NotQualified(DisqualifyReason::MissingCountry);
        };

        let regions = self.index.regions_for(location);
        decide_outcome(&canonical, &regions, rule)
    }

    pub fn is_qualified(&self, location: &Location, rule: &QualificationRule) -> bool {
        self.evaluate(location, rule).is_qualified()
    }
}
