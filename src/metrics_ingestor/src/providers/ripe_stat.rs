//! RIPEstat data API client (`https://stat.ripe.net/data/<call>/data.json`).

pub mod params;
pub mod provider;
pub mod response;

pub use provider::{RipeStatConfig, RipeStatProvider};
