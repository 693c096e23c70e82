//! Probe → diff → bulk insert, shared by every data domain.
//!
//! ## What this does
//! - Splits the candidate rows into fixed-size chunks.
//! - For each chunk, asks the warehouse which natural keys already exist
//!   ([`probe::existing_keys`], one SELECT per chunk).
//! - Drops those rows, and repeats within the chunk ([`diff::missing_rows`]).
//! - Renders the rest as one multi-row INSERT ([`load::bulk_load`]), which is
//!   optionally saved to an audit file and optionally executed in a single
//!   transaction.
//!
//! ## Consistency
//! Probe and insert use separate connections and no enclosing transaction.
//! Two concurrent runs over the same country and range can both miss a key
//! and both insert it. Runs are assumed to be single-writer.

pub mod diff;
pub mod domain;
pub mod load;
pub mod probe;

use std::{fmt, ops::AddAssign, path::PathBuf};

use tracing::info;

use crate::{db::connection::WarehousePool, error::EtlError};

pub use domain::{Domain, KeyProbe};

/// Default chunk size for probe and insert.
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// Switches for the load step.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Save every rendered INSERT under `audit_dir`.
    pub persist_audit: bool,
    /// Execute the INSERT. With this off, nothing is written to the store.
    pub write_to_store: bool,
    /// Audit directory, created on first use.
    pub audit_dir: PathBuf,
    /// Rows per probe/insert chunk.
    pub batch_size: usize,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            persist_audit: false,
            write_to_store: true,
            audit_dir: PathBuf::from("sql"),
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

/// Counters for one or more pipeline runs against a table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Rows offered to the pipeline.
    pub candidates: usize,
    /// Candidates whose key was already stored.
    pub already_stored: usize,
    /// Candidates repeating a key within their chunk.
    pub repeated: usize,
    /// Rows that passed the diff.
    pub new_rows: usize,
    /// Rows actually written.
    pub inserted: usize,
    /// Audit files written.
    pub audit_files: Vec<PathBuf>,
}

impl SyncReport {
    /// True if nothing was new.
    pub fn is_noop(&self) -> bool {
        self.new_rows == 0
    }
}

impl AddAssign for SyncReport {
    fn add_assign(&mut self, rhs: Self) {
        self.candidates += rhs.candidates;
        self.already_stored += rhs.already_stored;
        self.repeated += rhs.repeated;
        self.new_rows += rhs.new_rows;
        self.inserted += rhs.inserted;
        self.audit_files.extend(rhs.audit_files);
    }
}

impl fmt::Display for SyncReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} fetched, {} already stored, {} repeated, {} new, {} inserted",
            self.candidates, self.already_stored, self.repeated, self.new_rows, self.inserted
        )?;
        if !self.audit_files.is_empty() {
            write!(f, ", {} audit file(s)", self.audit_files.len())?;
        }
        Ok(())
    }
}

/// Loads `rows` into `D::TABLE`, skipping every row whose natural key is
/// already stored.
pub fn sync_rows<D: Domain>(
    pool: &WarehousePool,
    scope: &D::Scope,
    rows: Vec<D::Row>,
    opts: &LoadOptions,
) -> Result<SyncReport, EtlError> {
    let mut report = SyncReport::default();
    if rows.is_empty() {
        return Ok(report);
    }

    for chunk in rows.chunks(opts.batch_size.max(1)) {
        let existing = probe::existing_keys::<D>(pool, scope, chunk)?;
        let diff = diff::missing_rows(chunk.to_vec(), &existing, D::key);
        let outcome = load::bulk_load::<D>(pool, scope, &diff.fresh, opts)?;

        info!(table = D::TABLE, ?scope, "{diff}");
        report += SyncReport {
            candidates: chunk.len(),
            already_stored: diff.already_stored,
            repeated: diff.repeated,
            new_rows: diff.fresh.len(),
            inserted: outcome.inserted,
            audit_files: outcome.audit_file.into_iter().collect(),
        };
    }
    Ok(report)
}
