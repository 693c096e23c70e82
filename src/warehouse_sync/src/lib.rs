//! Deduplicating loader for country-level Internet metrics.
//!
//! Upstream payloads (see the `metrics_ingestor` crate) are mapped to flat
//! rows by the adapters in [`domains`] and written through one generic
//! pipeline in [`sync`]: probe the warehouse for keys already present, drop
//! those from the batch, bulk insert the rest. No unique constraints back
//! this up in the database; the pipeline is the only guard against
//! duplicates, under a single-writer assumption.

#![warn(missing_docs)]

pub mod config;
pub mod countries;
pub mod db;
pub mod domains;
pub mod error;
pub mod read;
pub mod schema;
pub mod sync;
pub mod tasks;
pub mod telemetry;
pub mod timeframe;
pub mod tz;
