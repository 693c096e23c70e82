use chrono::NaiveDate;

use crate::{models::registry::StatsResolution, providers::ProviderError};

pub const COUNTRY_ASNS: &str = "country-asns";
pub const COUNTRY_RESOURCE_STATS: &str = "country-resource-stats";
pub const ASN_NEIGHBOURS: &str = "asn-neighbours";

pub type QueryParams = Vec<(&'static str, String)>;

/// Midnight UTC of `date`, the only instant granularity the ETL asks for.
pub fn query_time(date: NaiveDate) -> String {
    date.format("%Y-%m-%dT00:00:00Z").to_string()
}

/// Registry calls take ISO 3166-1 alpha-2 codes only.
pub fn validate_country(country_iso2: &str) -> Result<(), ProviderError> {
    if country_iso2.len() == 2 && country_iso2.chars().all(|c| c.is_ascii_alphabetic()) {
        Ok(())
    } else {
        Err(ProviderError::Validation(format!(
            "expected a two-letter country code, got {country_iso2:?}"
        )))
    }
}

pub fn country_asns(country_iso2: &str, date: NaiveDate) -> QueryParams {
    vec![
        ("resource", country_iso2.to_string()),
        ("query_time", query_time(date)),
        ("lod", "1".to_string()),
    ]
}

pub fn country_resource_stats(
    country_iso2: &str,
    resolution: StatsResolution,
    from: NaiveDate,
    to: NaiveDate,
) -> QueryParams {
    vec![
        ("resource", country_iso2.to_string()),
        ("starttime", query_time(from)),
        ("endtime", query_time(to)),
        ("resolution", resolution.as_str().to_string()),
    ]
}

pub fn asn_neighbours(asn: i64, date: NaiveDate) -> QueryParams {
    vec![
        ("resource", format!("AS{asn}")),
        ("query_time", query_time(date)),
    ]
}
