use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::io::Read;
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use super::data::{read_json, read_json_path, DataLoadError};
use super::domain::Location;

/// Country and state membership of named regions, as supplied by configuration.
///
/// The JSON document is a flat object keyed by canonical location strings. Keys of the form
/// `"{COUNTRY}-{STATE}"` carry the regions a state belongs to in addition to its country's
/// regions; every other key carries country-level regions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "BTreeMap<String, Option<Vec<String>>>")]
pub struct RegionMapping {
    countries: BTreeMap<String, Vec<String>>,
    subdivisions: BTreeMap<String, BTreeMap<String, Vec<String>>>,
}

impl RegionMapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, DataLoadError> {
        read_json_path(path.as_ref())
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, DataLoadError> {
        read_json(reader, "region mapping")
    }

    pub fn from_json_str(raw: &str) -> Result<Self, DataLoadError> {
        Self::from_reader(raw.as_bytes())
    }

    pub fn with_country<I, S>(mut self, country: &str, regions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.countries
            .entry(country.to_string())
            .or_default()
            .extend(regions.into_iter().map(Into::into));
        self
    }

    pub fn with_subdivision<I, S>(mut self, country: &str, state: &str, regions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.subdivisions
            .entry(country.to_string())
            .or_default()
            .entry(state.to_string())
            .or_default()
            .extend(regions.into_iter().map(Into::into));
        self
    }
}

impl From<BTreeMap<String, Option<Vec<String>>>> for RegionMapping {
    fn from(entries: BTreeMap<String, Option<Vec<String>>>) -> Self {
        entries
            .into_iter()
            .fold(Self::default(), |mapping, (key, regions)| {
                let regions = regions.unwrap_or_default();
                match key.split_once('-') {
                    Some((country, state)) if !country.is_empty() && !state.is_empty() => {
                        mapping.with_subdivision(country, state, regions)
                    }
                    _ => mapping.with_country(&key, regions),
                }
            })
    }
}

#[derive(Debug, Default)]
struct CountryRegions {
    regions: BTreeSet<String>,
    subdivisions: HashMap<String, BTreeSet<String>>,
}

/// Read-only lookup from a location to every region it belongs to.
#[derive(Debug, Default)]
pub struct RegionIndex {
    countries: HashMap<String, CountryRegions>,
}

impl RegionIndex {
    pub fn build(mapping: &RegionMapping) -> Self {
        let mut countries: HashMap<String, CountryRegions> = HashMap::new();

        for (country, regions) in &mapping.countries {
            countries
                .entry(country.clone())
                .or_default()
                .regions
                .extend(regions.iter().cloned());
        }

        for (country, states) in &mapping.subdivisions {
            let entry = countries.entry(country.clone()).or_default();
            for (state, regions) in states {
                entry
                    .subdivisions
                    .entry(state.clone())
                    .or_default()
                    .extend(regions.iter().cloned());
            }
        }

        debug!(
            countries = countries.len(),
            subdivisions = countries
                .values()
                .map(|entry| entry.subdivisions.len())
                .sum::<usize>(),
            "region index built"
        );

        Self { countries }
    }

    /// Regions for `location`. Unknown or missing countries resolve to nothing, and an
    /// unknown or missing state falls back to the country's own regions.
    pub fn regions_for(&self, location: &Location) -> BTreeSet<&str> {
        let Some(entry) = location
            .country
            .as_deref()
            .filter(|country| !country.is_empty())
            .and_then(|country| self.countries.get(country))
        else {
            return BTreeSet::new();
        };

        let mut regions: BTreeSet<&str> = entry.regions.iter().map(String::as_str).collect();
        if let Some(state_regions) = location
            .state
            .as_deref()
            .filter(|state| !state.is_empty())
            .and_then(|state| entry.subdivisions.get(state))
        {
            regions.extend(state_regions.iter().map(String::as_str));
        }

        regions
    }

    pub fn knows_country(&self, country: &str) -> bool {
        self.countries.contains_key(country)
    }

    pub fn country_count(&self) -> usize {
        self.countries.len()
    }
}

impl From<&RegionMapping> for RegionIndex {
    fn from(mapping: &RegionMapping) -> Self {
        Self::build(mapping)
    }
}
