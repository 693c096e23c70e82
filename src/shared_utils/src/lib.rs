//! Small helpers shared by the ingestion and warehouse crates.

pub mod env;
