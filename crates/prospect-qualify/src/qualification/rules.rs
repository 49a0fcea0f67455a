use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};

use super::data::{read_json, read_json_path, DataLoadError};
use super::domain::UserId;

/// Include-list token that matches every location not otherwise excluded.
pub const ALL_LOCATIONS: &str = "All";

/// One user's location policy.
///
/// Both lists keep their configured order for display, but matching treats them as sets.
/// A `null` or missing list in the source document is read as empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualificationRule {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub location_include: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub location_exclude: Vec<String>,
}

impl QualificationRule {
    pub fn new<I, E, S, T>(include: I, exclude: E) -> Self
    where
        I: IntoIterator<Item = S>,
        E: IntoIterator<Item = T>,
        S: Into<String>,
        T: Into<String>,
    {
        Self {
            location_include: include.into_iter().map(Into::into).collect(),
            location_exclude: exclude.into_iter().map(Into::into).collect(),
        }
    }

    pub fn includes(&self, key: &str) -> bool {
        self.location_include.iter().any(|entry| entry == key)
    }

    pub fn excludes(&self, key: &str) -> bool {
        self.location_exclude.iter().any(|entry| entry == key)
    }

    pub fn includes_all(&self) -> bool {
        self.includes(ALL_LOCATIONS)
    }

    pub fn is_empty(&self) -> bool {
        self.location_include.is_empty() && self.location_exclude.is_empty()
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<Vec<String>>::deserialize(deserializer)?;
    Ok(opt.unwrap_or_default())
}

/// Outcome of resolving a user's rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleLookup<'a> {
    Found(&'a QualificationRule),
    NotFound,
}

impl<'a> RuleLookup<'a> {
    /// The rule to evaluate with; unknown users get the empty rule, which qualifies nothing.
    pub fn rule(self) -> &'a QualificationRule {
        static EMPTY: QualificationRule = QualificationRule {
            location_include: Vec::new(),
            location_exclude: Vec::new(),
        };

        match self {
            RuleLookup::Found(rule) => rule,
            RuleLookup::NotFound => &EMPTY,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, RuleLookup::Found(_))
    }
}

/// Every user's rule, loaded once per batch run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct UserRules {
    rules: BTreeMap<String, QualificationRule>,
}

impl UserRules {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, DataLoadError> {
        read_json_path(path.as_ref())
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, DataLoadError> {
        read_json(reader, "user preferences")
    }

    pub fn from_json_str(raw: &str) -> Result<Self, DataLoadError> {
        Self::from_reader(raw.as_bytes())
    }

    pub fn with_rule(mut self, user_id: impl Into<String>, rule: QualificationRule) -> Self {
        self.rules.insert(user_id.into(), rule);
        self
    }

    pub fn lookup(&self, user_id: Option<&UserId>) -> RuleLookup<'_> {
        match user_id.and_then(|id| self.rules.get(&id.0)) {
            Some(rule) => RuleLookup::Found(rule),
            None => RuleLookup::NotFound,
        }
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
