use serde::{Deserialize, Deserializer};
use std::io::Read;
use tracing::warn;

use super::super::domain::ProspectRow;

pub(crate) fn parse_rows<R: Read>(reader: R) -> Result<Vec<ProspectRow>, csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);
    let mut rows = Vec::new();

    for (index, record) in csv_reader.deserialize::<ProspectCsvRow>().enumerate() {
        match record {
            Ok(row) => rows.push(row.into()),
            Err(err) if err.is_io_error() => return Err(err),
            Err(err) => {
                warn!(row = index + 1, error = %err, "unreadable prospect row, fields cleared");
                rows.push(ProspectRow::default());
            }
        }
    }

    Ok(rows)
}

#[derive(Debug, Deserialize)]
struct ProspectCsvRow {
    #[serde(default, deserialize_with = "empty_string_as_none")]
    user_id: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    prospect_id: Option<String>,
    #[serde(
        rename = "company_country",
        alias = "country",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    country: Option<String>,
    #[serde(
        rename = "company_state",
        alias = "state",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    state: Option<String>,
}

impl From<ProspectCsvRow> for ProspectRow {
    fn from(row: ProspectCsvRow) -> Self {
        Self {
            user_id: row.user_id,
            prospect_id: row.prospect_id,
            country: row.country,
            state: row.state,
        }
    }
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty()))
}
