//! Error types for the warehouse side of the ETL.

use std::path::PathBuf;

use metrics_ingestor::providers::ProviderError;
use thiserror::Error;

/// A timestamp or date argument matched none of the accepted layouts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot parse {input:?} as {expected}")]
pub struct FormatError {
    /// Offending input, verbatim.
    pub input: String,
    /// Human readable description of what was expected.
    pub expected: &'static str,
}

/// Any failure talking to the warehouse.
#[derive(Debug, Error)]
pub enum StorageError {
    /// A statement failed (includes rolled back inserts).
    #[error("database query failed: {0}")]
    Query(#[from] diesel::result::Error),

    /// No connection could be checked out or opened.
    #[error("connection pool error: {0}")]
    Pool(#[from] diesel::r2d2::PoolError),

    /// The URL names no backend we can talk to.
    #[error("unsupported database URL scheme: {0}")]
    UnsupportedUrl(String),

    /// A stored key column holds a value the normalizer rejects.
    #[error("malformed value in {table}.{column}: {source}")]
    Malformed {
        /// Table the value was read from.
        table: &'static str,
        /// Column the value was read from.
        column: &'static str,
        /// Parse failure.
        #[source]
        source: FormatError,
    },
}

/// Top-level error of an ETL run.
#[derive(Debug, Error)]
pub enum EtlError {
    /// Timestamp or date parsing failed.
    #[error(transparent)]
    Format(#[from] FormatError),

    /// Probe, insert or pool failure.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Upstream fetch failed after retries.
    #[error("upstream fetch failed: {0}")]
    Upstream(#[from] ProviderError),

    /// Resolution tag other than `D`, `W` or `M`.
    #[error("unsupported resolution {0:?}; use 'D', 'W' or 'M'")]
    InvalidResolution(String),

    /// Task name outside the known set.
    #[error("unknown task {0:?}")]
    UnknownTask(String),

    /// Country code outside the registry.
    #[error("unknown country code {0:?}")]
    UnknownCountry(String),

    /// The rendered statement could not be persisted.
    #[error("cannot write audit file {path}: {source}")]
    Audit {
        /// Target file.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// Invalid or incomplete configuration.
    #[error("configuration error: {0}")]
    Config(String),
}
