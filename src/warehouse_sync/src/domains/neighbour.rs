//! ASN adjacency.
//!
//! The natural key is (asn, neighbour, date, relationship) and does not
//! include a country: an edge reported while walking two countries' ASNs is
//! stored once. The probe is therefore filtered by date only. The scope still
//! carries the country, for audit file naming.

use chrono::NaiveDate;
use diesel::{
    QueryableByName,
    sql_types::{BigInt, Text},
};
use metrics_ingestor::models::registry::Neighbour;

use crate::{
    db::statement::SqlValue,
    domains::{CountryScope, stored_date},
    error::StorageError,
    sync::{Domain, KeyProbe},
    tz,
};

/// One row of `asn_neighbour`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NeighbourEdge {
    /// ASN the registry was queried for.
    pub asn: i64,
    /// Adjacent ASN.
    pub neighbour: i64,
    /// Snapshot date.
    pub as_of_date: NaiveDate,
    /// Relationship as reported ("left", "right", "uncertain").
    pub relationship: String,
    /// Number of RIS peers seeing the adjacency.
    pub power: Option<i64>,
    /// IPv4 peers seeing it.
    pub v4_peers: Option<i64>,
    /// IPv6 peers seeing it.
    pub v6_peers: Option<i64>,
}

/// Rows for the neighbours of `requesting_asn` on `as_of_date`.
pub fn edges_from(
    requesting_asn: i64,
    as_of_date: NaiveDate,
    neighbours: &[Neighbour],
) -> Vec<NeighbourEdge> {
    neighbours
        .iter()
        .map(|n| NeighbourEdge {
            asn: requesting_asn,
            neighbour: n.asn,
            as_of_date,
            relationship: n.kind.clone(),
            power: n.power,
            v4_peers: n.v4_peers,
            v6_peers: n.v6_peers,
        })
        .collect()
}

/// Key columns of `asn_neighbour`.
#[derive(Debug, QueryableByName)]
pub struct StoredEdgeKey {
    #[diesel(sql_type = BigInt)]
    asn: i64,
    #[diesel(sql_type = BigInt)]
    neighbour: i64,
    #[diesel(sql_type = Text)]
    as_of_date: String,
    #[diesel(sql_type = Text)]
    relationship: String,
}

/// Descriptor for the `asn_neighbour` table.
pub struct AsnNeighbours;

impl Domain for AsnNeighbours {
    type Row = NeighbourEdge;
    type Key = (i64, i64, NaiveDate, String);
    type Stored = StoredEdgeKey;
    type Scope = CountryScope;

    const TABLE: &'static str = "asn_neighbour";
    const COLUMNS: &'static [&'static str] = &[
        "asn",
        "neighbour",
        "as_of_date",
        "relationship",
        "power",
        "v4_peers",
        "v6_peers",
    ];
    const AUDIT_LABEL: &'static str = "asn_neighbours";

    fn key(row: &NeighbourEdge) -> Self::Key {
        (row.asn, row.neighbour, row.as_of_date, row.relationship.clone())
    }

    fn values(row: &NeighbourEdge) -> Vec<SqlValue> {
        vec![
            SqlValue::BigInt(row.asn),
            SqlValue::BigInt(row.neighbour),
            SqlValue::Text(tz::format_date(row.as_of_date)),
            SqlValue::Text(row.relationship.clone()),
            SqlValue::NullableBigInt(row.power),
            SqlValue::NullableBigInt(row.v4_peers),
            SqlValue::NullableBigInt(row.v6_peers),
        ]
    }

    fn probe(_scope: &CountryScope, rows: &[NeighbourEdge]) -> KeyProbe {
        KeyProbe {
            select: &["asn", "neighbour", "as_of_date", "relationship"],
            filters: vec![],
            in_column: "as_of_date",
            in_values: rows.iter().map(|r| tz::format_date(r.as_of_date)).collect(),
        }
    }

    fn key_from_stored(stored: StoredEdgeKey) -> Result<Self::Key, StorageError> {
        let date = stored_date(Self::TABLE, "as_of_date", &stored.as_of_date)?;
        Ok((stored.asn, stored.neighbour, date, stored.relationship))
    }

    fn audit_tag(scope: &CountryScope) -> String {
        scope.country_iso2.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_ignores_country_scope() {
        let date = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        let n = Neighbour {
            asn: 200,
            kind: "peer".into(),
            power: Some(3),
            v4_peers: Some(2),
            v6_peers: None,
        };
        let edges = edges_from(100, date, &[n]);
        assert_eq!(
            AsnNeighbours::key(&edges[0]),
            (100, 200, date, "peer".to_string())
        );
        let p = AsnNeighbours::probe(&CountryScope::new("DE"), &edges);
        assert!(p.filters.is_empty());
        assert_eq!(p.in_values, vec!["2023-01-01".to_string()]);
    }
}
