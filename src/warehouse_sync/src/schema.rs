//! Diesel table definitions mirroring [`crate::db::bootstrap::TABLES_DDL`].
//!
//! The primary keys listed here are the natural keys. They exist for diesel's
//! benefit only; the database declares no key constraint.

#![allow(missing_docs)]

diesel::table! {
    asn (country_iso2, as_of_date, asn_number) {
        country_iso2 -> Text,
        as_of_date -> Text,
        #[sql_name = "asn"]
        asn_number -> BigInt,
        is_routed -> Bool,
    }
}

diesel::table! {
    country_stat (country_iso2, stats_timestamp, resolution) {
        country_iso2 -> Text,
        stats_timestamp -> Text,
        resolution -> Text,
        v4_prefixes_ris -> Nullable<BigInt>,
        v6_prefixes_ris -> Nullable<BigInt>,
        asns_ris -> Nullable<BigInt>,
        v4_prefixes_stats -> Nullable<BigInt>,
        v6_prefixes_stats -> Nullable<BigInt>,
        asns_stats -> Nullable<BigInt>,
    }
}

diesel::table! {
    asn_neighbour (asn, neighbour, as_of_date, relationship) {
        asn -> BigInt,
        neighbour -> BigInt,
        as_of_date -> Text,
        relationship -> Text,
        power -> Nullable<BigInt>,
        v4_peers -> Nullable<BigInt>,
        v6_peers -> Nullable<BigInt>,
    }
}

diesel::table! {
    country_traffic (country_iso2, sample_timestamp) {
        country_iso2 -> Text,
        sample_timestamp -> Text,
        traffic -> Double,
    }
}

diesel::table! {
    country_internet_quality (country_iso2, sample_timestamp) {
        country_iso2 -> Text,
        sample_timestamp -> Text,
        p75 -> Double,
        p50 -> Double,
        p25 -> Double,
    }
}

diesel::allow_tables_to_appear_in_same_query!(
    asn,
    asn_neighbour,
    country_internet_quality,
    country_stat,
    country_traffic,
);
