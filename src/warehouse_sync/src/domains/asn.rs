//! ASN inventory: which ASNs a country has, routed or not, on a given date.

use chrono::NaiveDate;
use diesel::{QueryableByName, sql_types::{BigInt, Text}};
use metrics_ingestor::models::registry::CountryAsns;

use crate::{
    db::statement::SqlValue,
    domains::{CountryScope, stored_date},
    error::StorageError,
    sync::{Domain, KeyProbe},
    tz,
};

/// One row of `asn`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AsnRecord {
    /// Country the ASN is registered to.
    pub country_iso2: String,
    /// Registry snapshot date.
    pub as_of_date: NaiveDate,
    /// Autonomous system number.
    pub asn: i64,
    /// Announced in the global routing table on that date.
    pub is_routed: bool,
}

/// Rows for one registry snapshot, routed ASNs first.
pub fn records_from(country_iso2: &str, as_of_date: NaiveDate, asns: &CountryAsns) -> Vec<AsnRecord> {
    let routed = asns.routed.iter().map(|asn| (asn, true));
    let non_routed = asns.non_routed.iter().map(|asn| (asn, false));
    routed
        .chain(non_routed)
        .map(|(asn, is_routed)| AsnRecord {
            country_iso2: country_iso2.to_string(),
            as_of_date,
            asn: *asn,
            is_routed,
        })
        .collect()
}

/// Key columns of `asn`.
#[derive(Debug, QueryableByName)]
pub struct StoredAsnKey {
    #[diesel(sql_type = Text)]
    country_iso2: String,
    #[diesel(sql_type = Text)]
    as_of_date: String,
    #[diesel(sql_type = BigInt)]
    asn: i64,
}

/// Descriptor for the `asn` table.
pub struct AsnInventory;

impl Domain for AsnInventory {
    type Row = AsnRecord;
    type Key = (String, NaiveDate, i64);
    type Stored = StoredAsnKey;
    type Scope = CountryScope;

    const TABLE: &'static str = "asn";
    const COLUMNS: &'static [&'static str] = &["country_iso2", "as_of_date", "asn", "is_routed"];
    const AUDIT_LABEL: &'static str = "country_asns";

    fn key(row: &AsnRecord) -> Self::Key {
        (row.country_iso2.clone(), row.as_of_date, row.asn)
    }

    fn values(row: &AsnRecord) -> Vec<SqlValue> {
        vec![
            SqlValue::Text(row.country_iso2.clone()),
            SqlValue::Text(tz::format_date(row.as_of_date)),
            SqlValue::BigInt(row.asn),
            SqlValue::Bool(row.is_routed),
        ]
    }

    fn probe(scope: &CountryScope, rows: &[AsnRecord]) -> KeyProbe {
        KeyProbe {
            select: &["country_iso2", "as_of_date", "asn"],
            filters: vec![("country_iso2", SqlValue::Text(scope.country_iso2.clone()))],
            in_column: "as_of_date",
            in_values: rows.iter().map(|r| tz::format_date(r.as_of_date)).collect(),
        }
    }

    fn key_from_stored(stored: StoredAsnKey) -> Result<Self::Key, StorageError> {
        let date = stored_date(Self::TABLE, "as_of_date", &stored.as_of_date)?;
        Ok((stored.country_iso2, date, stored.asn))
    }

    fn audit_tag(scope: &CountryScope) -> String {
        scope.country_iso2.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn routed_flag_follows_source_set() {
        let date = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        let rows = records_from(
            "US",
            date,
            &CountryAsns {
                routed: vec![123],
                non_routed: vec![456],
            },
        );
        assert_eq!(rows.len(), 2);
        assert!(rows[0].is_routed && rows[0].asn == 123);
        assert!(!rows[1].is_routed && rows[1].asn == 456);
        assert_eq!(AsnInventory::key(&rows[1]), ("US".to_string(), date, 456));
    }
}
