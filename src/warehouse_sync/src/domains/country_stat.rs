//! Routing statistics per country, at daily or five-minute resolution.
//!
//! The key timestamp of an upstream entry is the start of its first timeline
//! slot. Entries without a timeline have no key and are skipped.

use diesel::{QueryableByName, sql_types::Text};
use metrics_ingestor::models::registry::{ResourceStat, StatsResolution};
use tracing::warn;

use crate::{
    db::statement::SqlValue,
    domains::stored_timestamp,
    error::{FormatError, StorageError},
    sync::{Domain, KeyProbe},
    tz::{self, CanonicalTimestamp},
};

/// One row of `country_stat`. Absent measures stay `None` and are stored as
/// NULL, never 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountryStat {
    /// Country the statistics describe.
    pub country_iso2: String,
    /// Start of the sampling slot.
    pub stats_timestamp: CanonicalTimestamp,
    /// Sampling resolution.
    pub resolution: StatsResolution,
    /// IPv4 prefixes seen by RIS.
    pub v4_prefixes_ris: Option<i64>,
    /// IPv6 prefixes seen by RIS.
    pub v6_prefixes_ris: Option<i64>,
    /// ASNs seen by RIS.
    pub asns_ris: Option<i64>,
    /// IPv4 prefixes in registry delegation stats.
    pub v4_prefixes_stats: Option<i64>,
    /// IPv6 prefixes in registry delegation stats.
    pub v6_prefixes_stats: Option<i64>,
    /// ASNs in registry delegation stats.
    pub asns_stats: Option<i64>,
}

/// Batch scope: every probe filters on both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatScope {
    /// Country code.
    pub country_iso2: String,
    /// Resolution of every row in the batch.
    pub resolution: StatsResolution,
}

/// Maps upstream entries to rows.
pub fn stats_from(
    country_iso2: &str,
    resolution: StatsResolution,
    entries: &[ResourceStat],
) -> Result<Vec<CountryStat>, FormatError> {
    let mut rows = Vec::with_capacity(entries.len());
    for entry in entries {
        let Some(start) = entry.first_start() else {
            warn!(country = country_iso2, %resolution, "stats entry without timeline skipped");
            continue;
        };
        rows.push(CountryStat {
            country_iso2: country_iso2.to_string(),
            stats_timestamp: tz::normalize_timestamp(start)?,
            resolution,
            v4_prefixes_ris: entry.v4_prefixes_ris,
            v6_prefixes_ris: entry.v6_prefixes_ris,
            asns_ris: entry.asns_ris,
            v4_prefixes_stats: entry.v4_prefixes_stats,
            v6_prefixes_stats: entry.v6_prefixes_stats,
            asns_stats: entry.asns_stats,
        });
    }
    Ok(rows)
}

/// `"1d"` / `"5m"` -> resolution.
pub fn parse_resolution(raw: &str) -> Option<StatsResolution> {
    match raw.trim() {
        "1d" => Some(StatsResolution::Daily),
        "5m" => Some(StatsResolution::FiveMinute),
        _ => None,
    }
}

/// Key columns of `country_stat`.
#[derive(Debug, QueryableByName)]
pub struct StoredStatKey {
    #[diesel(sql_type = Text)]
    country_iso2: String,
    #[diesel(sql_type = Text)]
    stats_timestamp: String,
    #[diesel(sql_type = Text)]
    resolution: String,
}

/// Descriptor for the `country_stat` table.
pub struct CountryStats;

impl Domain for CountryStats {
    type Row = CountryStat;
    type Key = (String, CanonicalTimestamp, StatsResolution);
    type Stored = StoredStatKey;
    type Scope = StatScope;

    const TABLE: &'static str = "country_stat";
    const COLUMNS: &'static [&'static str] = &[
        "country_iso2",
        "stats_timestamp",
        "resolution",
        "v4_prefixes_ris",
        "v6_prefixes_ris",
        "asns_ris",
        "v4_prefixes_stats",
        "v6_prefixes_stats",
        "asns_stats",
    ];
    const AUDIT_LABEL: &'static str = "country_stats";

    fn key(row: &CountryStat) -> Self::Key {
        (row.country_iso2.clone(), row.stats_timestamp, row.resolution)
    }

    fn values(row: &CountryStat) -> Vec<SqlValue> {
        vec![
            SqlValue::Text(row.country_iso2.clone()),
            SqlValue::Text(row.stats_timestamp.to_string()),
            SqlValue::Text(row.resolution.as_str().to_string()),
            SqlValue::NullableBigInt(row.v4_prefixes_ris),
            SqlValue::NullableBigInt(row.v6_prefixes_ris),
            SqlValue::NullableBigInt(row.asns_ris),
            SqlValue::NullableBigInt(row.v4_prefixes_stats),
            SqlValue::NullableBigInt(row.v6_prefixes_stats),
            SqlValue::NullableBigInt(row.asns_stats),
        ]
    }

    fn probe(scope: &StatScope, rows: &[CountryStat]) -> KeyProbe {
        KeyProbe {
            select: &["country_iso2", "stats_timestamp", "resolution"],
            filters: vec![
                ("country_iso2", SqlValue::Text(scope.country_iso2.clone())),
                ("resolution", SqlValue::Text(scope.resolution.as_str().to_string())),
            ],
            in_column: "stats_timestamp",
            in_values: rows.iter().map(|r| r.stats_timestamp.to_string()).collect(),
        }
    }

    fn key_from_stored(stored: StoredStatKey) -> Result<Self::Key, StorageError> {
        let ts = stored_timestamp(Self::TABLE, "stats_timestamp", &stored.stats_timestamp)?;
        let resolution =
            parse_resolution(&stored.resolution).ok_or_else(|| StorageError::Malformed {
                table: Self::TABLE,
                column: "resolution",
                source: FormatError {
                    input: stored.resolution.clone(),
                    expected: "a stats resolution (1d or 5m)",
                },
            })?;
        Ok((stored.country_iso2, ts, resolution))
    }

    fn audit_tag(scope: &StatScope) -> String {
        format!("{}_{}", scope.country_iso2, scope.resolution)
    }
}

#[cfg(test)]
mod tests {
    use metrics_ingestor::models::registry::TimelineSlot;

    use super::*;

    fn entry(start: Option<&str>) -> ResourceStat {
        ResourceStat {
            timeline: start
                .map(|s| {
                    vec![TimelineSlot {
                        starttime: s.to_string(),
                        endtime: None,
                    }]
                })
                .unwrap_or_default(),
            asns_ris: Some(7),
            ..Default::default()
        }
    }

    #[test]
    fn key_uses_first_timeline_start() {
        let rows = stats_from(
            "NL",
            StatsResolution::Daily,
            &[entry(Some("2023-01-01T00:00:00")), entry(None)],
        )
        .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].stats_timestamp.to_string(), "2023-01-01 00:00:00+00:00");
        assert_eq!(rows[0].v4_prefixes_ris, None);
        assert_eq!(rows[0].asns_ris, Some(7));
    }

    #[test]
    fn absent_measures_bind_as_null() {
        let rows = stats_from("NL", StatsResolution::FiveMinute, &[entry(Some("2023-01-01T00:05:00Z"))])
            .unwrap();
        let values = CountryStats::values(&rows[0]);
        assert_eq!(values[2], SqlValue::Text("5m".into()));
        assert_eq!(values[3], SqlValue::NullableBigInt(None));
        assert_eq!(values[5], SqlValue::NullableBigInt(Some(7)));
    }

    #[test]
    fn unparseable_start_is_a_format_error() {
        let err = stats_from("NL", StatsResolution::Daily, &[entry(Some("soon"))]).unwrap_err();
        assert_eq!(err.input, "soon");
    }
}
