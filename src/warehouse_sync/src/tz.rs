//! Timestamp normalization.
//!
//! Upstream sources disagree on how they spell an instant:
//! - `2023-01-01T00:00:00Z` (UTC designator),
//! - `2023-01-01T00:00:00+00:00` or any other numeric offset,
//! - `2023-01-01T00:00:00` (no zone at all, read as UTC).
//!
//! Every accepted layout maps to one [`CanonicalTimestamp`], a UTC instant
//! whose text form is `YYYY-MM-DD HH:MM:SS+00:00`. That text form is what the
//! warehouse stores, and values read back are parsed through
//! [`parse_stored_timestamp`], so both sides of a key comparison go through
//! the same normalizer.
//!
//! Dates are stored as `YYYY-MM-DD`.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, SubsecRound, Utc};

use crate::error::FormatError;

/// Text layout of stored timestamps.
pub const CANONICAL_FORMAT: &str = "%Y-%m-%d %H:%M:%S+00:00";
/// Text layout of stored dates and CLI date arguments.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

const STORED_PARSE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%:z";
const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S"];

/// A UTC instant truncated to whole seconds, the precision of the stored form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CanonicalTimestamp(DateTime<Utc>);

impl CanonicalTimestamp {
    /// Wraps an instant that is already in UTC, dropping sub-second digits.
    pub fn from_utc(instant: DateTime<Utc>) -> Self {
        Self(instant.trunc_subsecs(0))
    }

    /// Underlying instant.
    pub fn instant(&self) -> DateTime<Utc> {
        self.0
    }
}

impl fmt::Display for CanonicalTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(CANONICAL_FORMAT))
    }
}

/// Inbound timestamp -> canonical UTC instant.
///
/// Example:
/// - "2024-03-10T09:30:00-05:00" -> "2024-03-10 14:30:00+00:00"
pub fn normalize_timestamp(raw: &str) -> Result<CanonicalTimestamp, FormatError> {
    let s = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(CanonicalTimestamp::from_utc(dt.with_timezone(&Utc)));
    }
    // No zone designator: the registry emits these and means UTC.
    NAIVE_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
        .map(|naive| CanonicalTimestamp::from_utc(naive.and_utc()))
        .ok_or_else(|| FormatError {
            input: raw.to_string(),
            expected: "an ISO-8601 timestamp",
        })
}

/// Stored text -> canonical instant, falling back to the inbound layouts.
///
/// Existing-key lookups bind the canonical text, so only rows stored in
/// canonical form are ever matched; the fallback only serves reads.
pub fn parse_stored_timestamp(raw: &str) -> Result<CanonicalTimestamp, FormatError> {
    match DateTime::parse_from_str(raw.trim(), STORED_PARSE_FORMAT) {
        Ok(dt) => Ok(CanonicalTimestamp::from_utc(dt.with_timezone(&Utc))),
        Err(_) => normalize_timestamp(raw),
    }
}

/// `YYYY-MM-DD` -> date.
pub fn parse_date_arg(raw: &str) -> Result<NaiveDate, FormatError> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).map_err(|_| FormatError {
        input: raw.to_string(),
        expected: "a YYYY-MM-DD date",
    })
}

/// Date -> stored text.
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}
