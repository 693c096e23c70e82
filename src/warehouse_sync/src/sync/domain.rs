use std::{fmt::Debug, hash::Hash};

use crate::{
    db::{connection::StoredKey, statement::SqlValue},
    error::StorageError,
};

/// Existing-keys query for one candidate batch:
/// `SELECT <select> FROM <table> WHERE <filters...> AND <in_column> IN (<in_values>)`.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyProbe {
    /// Natural-key columns to read back.
    pub select: &'static [&'static str],
    /// Equality predicates on batch-wide scalars (country, resolution).
    pub filters: Vec<(&'static str, SqlValue)>,
    /// Column that varies across the batch (a date or timestamp).
    pub in_column: &'static str,
    /// Candidate values for `in_column`, already in stored text form.
    pub in_values: Vec<String>,
}

/// Everything the load pipeline needs to know about one data domain.
///
/// One implementation per target table; the pipeline in [`crate::sync`] is
/// otherwise the same for all of them.
pub trait Domain {
    /// Candidate row.
    type Row: Clone + Debug;
    /// Natural key, in normalized form.
    type Key: Eq + Hash + Clone + Debug;
    /// Key columns as read back by the probe.
    type Stored: StoredKey;
    /// Values shared by the whole batch (country, resolution, ...).
    type Scope: Debug;

    /// Target table.
    const TABLE: &'static str;
    /// Insert column order; [`Domain::values`] follows it.
    const COLUMNS: &'static [&'static str];
    /// Audit file name prefix.
    const AUDIT_LABEL: &'static str;

    /// Natural key of a candidate.
    fn key(row: &Self::Row) -> Self::Key;

    /// Bind values in [`Domain::COLUMNS`] order.
    fn values(row: &Self::Row) -> Vec<SqlValue>;

    /// Probe restricted to the batch's key range.
    fn probe(scope: &Self::Scope, rows: &[Self::Row]) -> KeyProbe;

    /// Stored key columns -> natural key, through the same normalizer as
    /// candidates.
    fn key_from_stored(stored: Self::Stored) -> Result<Self::Key, StorageError>;

    /// Audit file name tag, normally the country code.
    fn audit_tag(scope: &Self::Scope) -> String;
}
