use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of the user whose location policy applies to a prospect.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub String);

/// Identifier of a prospect, unique per user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProspectId(pub String);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for ProspectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A country code with an optional state or subdivision code.
///
/// Codes are matched case-sensitively and are never normalized. Empty strings are folded to
/// `None` on construction so every consumer sees a single "absent" representation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    pub country: Option<String>,
    pub state: Option<String>,
}

impl Location {
    pub fn new(country: Option<String>, state: Option<String>) -> Self {
        Self {
            country: country.filter(|value| !value.is_empty()),
            state: state.filter(|value| !value.is_empty()),
        }
    }

    pub fn country(country: impl Into<String>) -> Self {
        Self::new(Some(country.into()), None)
    }

    pub fn subdivision(country: impl Into<String>, state: impl Into<String>) -> Self {
        Self::new(Some(country.into()), Some(state.into()))
    }

    /// `"{COUNTRY}-{STATE}"` when a state is present, `"{COUNTRY}"` otherwise, and `None`
    /// when the country is missing.
    pub fn canonical(&self) -> Option<String> {
        let country = self.country.as_deref()?;
        Some(canonical_key(country, self.state.as_deref()))
    }
}

pub(crate) fn canonical_key(country: &str, state: Option<&str>) -> String {
    match state {
        Some(state) => format!("{country}-{state}"),
        None => country.to_string(),
    }
}

/// One ingested row after tolerant parsing; every field may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProspectRow {
    pub user_id: Option<String>,
    pub prospect_id: Option<String>,
    pub country: Option<String>,
    pub state: Option<String>,
}

/// A prospect together with its qualification outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prospect {
    pub user_id: Option<UserId>,
    pub prospect_id: Option<ProspectId>,
    pub location: Location,
    pub qualified: bool,
}

impl Prospect {
    pub fn from_row(row: ProspectRow) -> Self {
        let ProspectRow {
            user_id,
            prospect_id,
            country,
            state,
        } = row;

        Self {
            user_id: user_id.filter(|id| !id.is_empty()).map(UserId),
            prospect_id: prospect_id.filter(|id| !id.is_empty()).map(ProspectId),
            location: Location::new(country, state),
            qualified: false,
        }
    }

    /// Persistence key; `None` when either half is missing.
    pub fn key(&self) -> Option<(&UserId, &ProspectId)> {
        Some((self.user_id.as_ref()?, self.prospect_id.as_ref()?))
    }
}

/// Aggregate counts reported for one batch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total: usize,
    pub qualified: usize,
    pub unqualified: usize,
}

impl BatchSummary {
    pub(crate) fn record(&mut self, qualified: bool) {
        self.total += 1;
        if qualified {
            self.qualified += 1;
        } else {
            self.unqualified += 1;
        }
    }
}
