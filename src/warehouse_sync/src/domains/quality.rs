//! Bandwidth percentiles (p25/p50/p75) per country.

use metrics_ingestor::models::radar::QualitySeries;
use tracing::warn;

use crate::{
    db::statement::SqlValue,
    domains::{
        CountryScope,
        traffic::{StoredSampleKey, sample_key, sample_probe},
    },
    error::{FormatError, StorageError},
    sync::{Domain, KeyProbe},
    tz::{self, CanonicalTimestamp},
};

/// One row of `country_internet_quality`.
#[derive(Debug, Clone, PartialEq)]
pub struct QualitySample {
    /// Country code.
    pub country_iso2: String,
    /// Sample instant.
    pub sample_timestamp: CanonicalTimestamp,
    /// 75th percentile bandwidth.
    pub p75: f64,
    /// Median bandwidth.
    pub p50: f64,
    /// 25th percentile bandwidth.
    pub p25: f64,
}

/// Zips the four parallel arrays, truncating to the shortest.
pub fn samples_from(
    country_iso2: &str,
    series: &QualitySeries,
) -> Result<Vec<QualitySample>, FormatError> {
    let lengths = array_lengths(series);
    let n = lengths.iter().copied().min().unwrap_or(0);
    if lengths.iter().any(|&len| len != n) {
        warn!(
            country = country_iso2,
            timestamps = lengths[0],
            p75 = lengths[1],
            p50 = lengths[2],
            p25 = lengths[3],
            kept = n,
            "quality arrays differ in length, truncating"
        );
    }

    (0..n)
        .map(|i| {
            Ok(QualitySample {
                country_iso2: country_iso2.to_string(),
                sample_timestamp: tz::normalize_timestamp(&series.timestamps[i])?,
                p75: series.p75[i],
                p50: series.p50[i],
                p25: series.p25[i],
            })
        })
        .collect()
}

fn array_lengths(series: &QualitySeries) -> [usize; 4] {
    [
        series.timestamps.len(),
        series.p75.len(),
        series.p50.len(),
        series.p25.len(),
    ]
}

/// Descriptor for the `country_internet_quality` table.
pub struct InternetQuality;

impl Domain for InternetQuality {
    type Row = QualitySample;
    type Key = (String, CanonicalTimestamp);
    type Stored = StoredSampleKey;
    type Scope = CountryScope;

    const TABLE: &'static str = "country_internet_quality";
    const COLUMNS: &'static [&'static str] =
        &["country_iso2", "sample_timestamp", "p75", "p50", "p25"];
    const AUDIT_LABEL: &'static str = "internet_quality";

    fn key(row: &QualitySample) -> Self::Key {
        (row.country_iso2.clone(), row.sample_timestamp)
    }

    fn values(row: &QualitySample) -> Vec<SqlValue> {
        vec![
            SqlValue::Text(row.country_iso2.clone()),
            SqlValue::Text(row.sample_timestamp.to_string()),
            SqlValue::Double(row.p75),
            SqlValue::Double(row.p50),
            SqlValue::Double(row.p25),
        ]
    }

    fn probe(scope: &CountryScope, rows: &[QualitySample]) -> KeyProbe {
        sample_probe(scope, rows.iter().map(|r| r.sample_timestamp.to_string()).collect())
    }

    fn key_from_stored(stored: StoredSampleKey) -> Result<Self::Key, StorageError> {
        sample_key(Self::TABLE, stored)
    }

    fn audit_tag(scope: &CountryScope) -> String {
        scope.country_iso2.clone()
    }
}
