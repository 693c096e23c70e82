//! Typed read-back of loaded rows, for verification and tests.
//!
//! Stored text columns go through the same parsers as probe results, so a
//! row read here compares equal to the row the adapter produced.

use diesel::prelude::*;
use metrics_ingestor::models::registry::StatsResolution;

use crate::{
    db::connection::{WarehousePool, with_conn},
    domains::{
        asn::AsnRecord,
        country_stat::{CountryStat, parse_resolution},
        neighbour::NeighbourEdge,
        quality::QualitySample,
        stored_date, stored_timestamp,
        traffic::TrafficSample,
    },
    error::{FormatError, StorageError},
    schema::{asn, asn_neighbour, country_internet_quality, country_stat, country_traffic},
};

/// Row count per table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[allow(missing_docs)]
pub struct TableCounts {
    pub asn: i64,
    pub country_stat: i64,
    pub asn_neighbour: i64,
    pub country_traffic: i64,
    pub country_internet_quality: i64,
}

/// Counts every table.
pub fn table_counts(pool: &WarehousePool) -> Result<TableCounts, StorageError> {
    with_conn!(pool, |conn, Db| {
        Ok(TableCounts {
            asn: asn::table.count().get_result(conn)?,
            country_stat: country_stat::table.count().get_result(conn)?,
            asn_neighbour: asn_neighbour::table.count().get_result(conn)?,
            country_traffic: country_traffic::table.count().get_result(conn)?,
            country_internet_quality: country_internet_quality::table.count().get_result(conn)?,
        })
    })
}

/// ASN inventory of one country, by date then ASN.
pub fn asn_records(pool: &WarehousePool, country_iso2: &str) -> Result<Vec<AsnRecord>, StorageError> {
    let raw = with_conn!(pool, |conn, Db| {
        asn::table
            .filter(asn::country_iso2.eq(country_iso2))
            .order_by((asn::as_of_date, asn::asn_number))
            .select((asn::country_iso2, asn::as_of_date, asn::asn_number, asn::is_routed))
            .load::<(String, String, i64, bool)>(conn)?
    });

    raw.into_iter()
        .map(|(country_iso2, date, asn, is_routed)| {
            Ok(AsnRecord {
                country_iso2,
                as_of_date: stored_date("asn", "as_of_date", &date)?,
                asn,
                is_routed,
            })
        })
        .collect()
}

type StatTuple = (
    String,
    String,
    String,
    Option<i64>,
    Option<i64>,
    Option<i64>,
    Option<i64>,
    Option<i64>,
    Option<i64>,
);

/// Routing statistics of one country, optionally restricted to one
/// resolution, by timestamp.
pub fn country_stats(
    pool: &WarehousePool,
    country_iso2: &str,
    resolution: Option<StatsResolution>,
) -> Result<Vec<CountryStat>, StorageError> {
    let raw = with_conn!(pool, |conn, Db| {
        let mut query = country_stat::table
            .filter(country_stat::country_iso2.eq(country_iso2))
            .into_boxed::<Db>();
        if let Some(resolution) = resolution {
            query = query.filter(country_stat::resolution.eq(resolution.as_str()));
        }
        query
            .order_by((country_stat::stats_timestamp, country_stat::resolution))
            .select((
                country_stat::country_iso2,
                country_stat::stats_timestamp,
                country_stat::resolution,
                country_stat::v4_prefixes_ris,
                country_stat::v6_prefixes_ris,
                country_stat::asns_ris,
                country_stat::v4_prefixes_stats,
                country_stat::v6_prefixes_stats,
                country_stat::asns_stats,
            ))
            .load::<StatTuple>(conn)?
    });

    raw.into_iter()
        .map(|(country_iso2, ts, res, v4r, v6r, ar, v4s, v6s, as_)| {
            let resolution = parse_resolution(&res).ok_or_else(|| StorageError::Malformed {
                table: "country_stat",
                column: "resolution",
                source: FormatError {
                    input: res.clone(),
                    expected: "a stats resolution (1d or 5m)",
                },
            })?;
            Ok(CountryStat {
                country_iso2,
                stats_timestamp: stored_timestamp("country_stat", "stats_timestamp", &ts)?,
                resolution,
                v4_prefixes_ris: v4r,
                v6_prefixes_ris: v6r,
                asns_ris: ar,
                v4_prefixes_stats: v4s,
                v6_prefixes_stats: v6s,
                asns_stats: as_,
            })
        })
        .collect()
}

type EdgeTuple = (i64, i64, String, String, Option<i64>, Option<i64>, Option<i64>);

/// Adjacencies stored for one requesting ASN.
pub fn neighbour_edges(pool: &WarehousePool, asn: i64) -> Result<Vec<NeighbourEdge>, StorageError> {
    let raw = with_conn!(pool, |conn, Db| {
        asn_neighbour::table
            .filter(asn_neighbour::asn.eq(asn))
            .order_by((asn_neighbour::as_of_date, asn_neighbour::neighbour))
            .select((
                asn_neighbour::asn,
                asn_neighbour::neighbour,
                asn_neighbour::as_of_date,
                asn_neighbour::relationship,
                asn_neighbour::power,
                asn_neighbour::v4_peers,
                asn_neighbour::v6_peers,
            ))
            .load::<EdgeTuple>(conn)?
    });

    raw.into_iter()
        .map(|(asn, neighbour, date, relationship, power, v4_peers, v6_peers)| {
            Ok(NeighbourEdge {
                asn,
                neighbour,
                as_of_date: stored_date("asn_neighbour", "as_of_date", &date)?,
                relationship,
                power,
                v4_peers,
                v6_peers,
            })
        })
        .collect()
}

/// Traffic series of one country, by timestamp.
pub fn traffic_samples(
    pool: &WarehousePool,
    country_iso2: &str,
) -> Result<Vec<TrafficSample>, StorageError> {
    let raw = with_conn!(pool, |conn, Db| {
        country_traffic::table
            .filter(country_traffic::country_iso2.eq(country_iso2))
            .order_by(country_traffic::sample_timestamp)
            .select((
                country_traffic::country_iso2,
                country_traffic::sample_timestamp,
                country_traffic::traffic,
            ))
            .load::<(String, String, f64)>(conn)?
    });

    raw.into_iter()
        .map(|(country_iso2, ts, traffic)| {
            Ok(TrafficSample {
                country_iso2,
                sample_timestamp: stored_timestamp("country_traffic", "sample_timestamp", &ts)?,
                traffic,
            })
        })
        .collect()
}

/// Bandwidth percentiles of one country, by timestamp.
pub fn quality_samples(
    pool: &WarehousePool,
    country_iso2: &str,
) -> Result<Vec<QualitySample>, StorageError> {
    let raw = with_conn!(pool, |conn, Db| {
        country_internet_quality::table
            .filter(country_internet_quality::country_iso2.eq(country_iso2))
            .order_by(country_internet_quality::sample_timestamp)
            .select((
                country_internet_quality::country_iso2,
                country_internet_quality::sample_timestamp,
                country_internet_quality::p75,
                country_internet_quality::p50,
                country_internet_quality::p25,
            ))
            .load::<(String, String, f64, f64, f64)>(conn)?
    });

    raw.into_iter()
        .map(|(country_iso2, ts, p75, p50, p25)| {
            Ok(QualitySample {
                country_iso2,
                sample_timestamp: stored_timestamp(
                    "country_internet_quality",
                    "sample_timestamp",
                    &ts,
                )?,
                p75,
                p50,
                p25,
            })
        })
        .collect()
}
