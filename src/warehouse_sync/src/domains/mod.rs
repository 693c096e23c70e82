//! Per-table adapters: upstream payload → rows, plus the [`Domain`]
//! descriptor the load pipeline runs on.
//!
//! | adapter | table | natural key |
//! |---|---|---|
//! | [`asn::AsnInventory`] | `asn` | (country, date, asn) |
//! | [`country_stat::CountryStats`] | `country_stat` | (country, timestamp, resolution) |
//! | [`neighbour::AsnNeighbours`] | `asn_neighbour` | (asn, neighbour, date, relationship) |
//! | [`traffic::CountryTraffic`] | `country_traffic` | (country, timestamp) |
//! | [`quality::InternetQuality`] | `country_internet_quality` | (country, timestamp) |
//!
//! [`Domain`]: crate::sync::Domain

pub mod asn;
pub mod country_stat;
pub mod neighbour;
pub mod quality;
pub mod traffic;

use chrono::NaiveDate;

use crate::{
    error::StorageError,
    tz::{self, CanonicalTimestamp},
};

/// Batch scope for tables filtered by country only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountryScope {
    /// ISO 3166-1 alpha-2 code, upper case.
    pub country_iso2: String,
}

impl CountryScope {
    /// Scope for `country_iso2`.
    pub fn new(country_iso2: impl Into<String>) -> Self {
        Self {
            country_iso2: country_iso2.into(),
        }
    }
}

pub(crate) fn stored_date(
    table: &'static str,
    column: &'static str,
    raw: &str,
) -> Result<NaiveDate, StorageError> {
    tz::parse_date_arg(raw).map_err(|source| StorageError::Malformed {
        table,
        column,
        source,
    })
}

pub(crate) fn stored_timestamp(
    table: &'static str,
    column: &'static str,
    raw: &str,
) -> Result<CanonicalTimestamp, StorageError> {
    tz::parse_stored_timestamp(raw).map_err(|source| StorageError::Malformed {
        table,
        column,
        source,
    })
}
