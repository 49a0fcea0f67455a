use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::super::rules::QualificationRule;

/// Verdict for one location under one rule, with the step that settled it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum QualificationDecision {
    Qualified(QualifyingMatch),
    NotQualified(DisqualifyReason),
}

impl QualificationDecision {
    pub fn is_qualified(&self) -> bool {
        matches!(self, QualificationDecision::Qualified(_))
    }

    pub fn summary(&self) -> String {
        match self {
            QualificationDecision::Qualified(matched) => matched.summary(),
            QualificationDecision::NotQualified(reason) => reason.summary(),
        }
    }
}

/// Include entry that qualified a location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum QualifyingMatch {
    DirectInclusion { location: String },
    Wildcard,
    Region { region: String },
}

impl QualifyingMatch {
    pub fn summary(&self) -> String {
        match self {
            QualifyingMatch::DirectInclusion { location } => {
                format!("qualified: {location} is included directly")
            }
            QualifyingMatch::Wildcard => "qualified: all locations are included".to_string(),
            QualifyingMatch::Region { region } => {
                format!("qualified: region {region} is included")
            }
        }
    }
}

/// Why a location did not qualify.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DisqualifyReason {
    MissingCountry,
    DirectExclusion { location: String },
    RegionExclusion { region: String },
    NoMatchingInclusion,
}

impl DisqualifyReason {
    pub fn summary(&self) -> String {
        match self {
            DisqualifyReason::MissingCountry => "not qualified: no country on record".to_string(),
            DisqualifyReason::DirectExclusion { location } => {
                format!("not qualified: {location} is excluded directly")
            }
            DisqualifyReason::RegionExclusion { region } => {
                format!("not qualified: region {region} is excluded")
            }
            DisqualifyReason::NoMatchingInclusion => {
                "not qualified: no include entry matches".to_string()
            }
        }
    }
}

/// Applies the precedence ladder to a located prospect.
///
/// Exclusion of the exact location wins over everything, then direct inclusion, then the
/// wildcard, then region inclusion. Wildcard and region matches are both cancelled by any
/// excluded region of the location.
pub(crate) fn decide_outcome(
    location: &str,
    regions: &BTreeSet<&str>,
    rule: &QualificationRule,
) -> QualificationDecision {
    if rule.excludes(location) {
        return QualificationDecision::NotQualified(DisqualifyReason::DirectExclusion {
            location: location.to_string(),
        });
    }

    if rule.includes(location) {
        return QualificationDecision::Qualified(QualifyingMatch::DirectInclusion {
            location: location.to_string(),
        });
    }

    let mut regions = regions.iter().copied().filter(|region| *region != location);
    let excluded_region = regions.clone().find(|region| rule.excludes(region));

    let matched = if rule.includes_all() {
        Some(QualifyingMatch::Wildcard)
    } else {
        regions
            .find(|region| rule.includes(region))
            .map(|region| QualifyingMatch::Region {
                region: region.to_string(),
            })
    };

    match (matched, excluded_region) {
        (Some(_), Some(region)) => {
            QualificationDecision::NotQualified(DisqualifyReason::RegionExclusion {
                region: region.to_string(),
            })
        }
        (Some(matched), None) => QualificationDecision::Qualified(matched),
        (None, _) => QualificationDecision::NotQualified(DisqualifyReason::NoMatchingInclusion),
    }
}
