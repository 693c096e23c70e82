//! Traffic volume samples.

use diesel::{QueryableByName, sql_types::Text};
use metrics_ingestor::models::radar::TrafficSeries;
use tracing::warn;

use crate::{
    db::statement::SqlValue,
    domains::{CountryScope, stored_timestamp},
    error::{FormatError, StorageError},
    sync::{Domain, KeyProbe},
    tz::{self, CanonicalTimestamp},
};

/// One row of `country_traffic`.
#[derive(Debug, Clone, PartialEq)]
pub struct TrafficSample {
    /// Country code.
    pub country_iso2: String,
    /// Sample instant.
    pub sample_timestamp: CanonicalTimestamp,
    /// Normalized traffic value.
    pub traffic: f64,
}

/// Zips the parallel arrays of a series. Surplus entries of the longer array
/// are dropped.
pub fn samples_from(
    country_iso2: &str,
    series: &TrafficSeries,
) -> Result<Vec<TrafficSample>, FormatError> {
    if series.timestamps.len() != series.values.len() {
        warn!(
            country = country_iso2,
            timestamps = series.timestamps.len(),
            values = series.values.len(),
            "traffic arrays differ in length, truncating"
        );
    }
    series
        .timestamps
        .iter()
        .zip(&series.values)
        .map(|(ts, value)| {
            Ok(TrafficSample {
                country_iso2: country_iso2.to_string(),
                sample_timestamp: tz::normalize_timestamp(ts)?,
                traffic: *value,
            })
        })
        .collect()
}

/// Key columns shared by the per-country sample tables.
#[derive(Debug, QueryableByName)]
pub struct StoredSampleKey {
    #[diesel(sql_type = Text)]
    pub(crate) country_iso2: String,
    #[diesel(sql_type = Text)]
    pub(crate) sample_timestamp: String,
}

pub(crate) fn sample_probe(scope: &CountryScope, timestamps: Vec<String>) -> KeyProbe {
    KeyProbe {
        select: &["country_iso2", "sample_timestamp"],
        filters: vec![("country_iso2", SqlValue::Text(scope.country_iso2.clone()))],
        in_column: "sample_timestamp",
        in_values: timestamps,
    }
}

pub(crate) fn sample_key(
    table: &'static str,
    stored: StoredSampleKey,
) -> Result<(String, CanonicalTimestamp), StorageError> {
    let ts = stored_timestamp(table, "sample_timestamp", &stored.sample_timestamp)?;
    Ok((stored.country_iso2, ts))
}

/// Descriptor for the `country_traffic` table.
pub struct CountryTraffic;

impl Domain for CountryTraffic {
    type Row = TrafficSample;
    type Key = (String, CanonicalTimestamp);
    type Stored = StoredSampleKey;
    type Scope = CountryScope;

    const TABLE: &'static str = "country_traffic";
    const COLUMNS: &'static [&'static str] = &["country_iso2", "sample_timestamp", "traffic"];
    const AUDIT_LABEL: &'static str = "traffic";

    fn key(row: &TrafficSample) -> Self::Key {
        (row.country_iso2.clone(), row.sample_timestamp)
    }

    fn values(row: &TrafficSample) -> Vec<SqlValue> {
        vec![
            SqlValue::Text(row.country_iso2.clone()),
            SqlValue::Text(row.sample_timestamp.to_string()),
            SqlValue::Double(row.traffic),
        ]
    }

    fn probe(scope: &CountryScope, rows: &[TrafficSample]) -> KeyProbe {
        sample_probe(scope, rows.iter().map(|r| r.sample_timestamp.to_string()).collect())
    }

    fn key_from_stored(stored: StoredSampleKey) -> Result<Self::Key, StorageError> {
        sample_key(Self::TABLE, stored)
    }

    fn audit_tag(scope: &CountryScope) -> String {
        scope.country_iso2.clone()
    }
}
