//! Upstream clients for country-level Internet metrics.
//!
//! Two families of sources are covered:
//! - a routing registry (RIPEstat data API) serving ASN inventories,
//!   per-country routing statistics and ASN adjacency, see
//!   [`providers::ripe_stat`];
//! - a traffic telemetry service (Cloudflare Radar) serving traffic volume
//!   and connection-quality time series, see [`providers::cloudflare_radar`].
//!
//! Both are exposed through the object-safe traits in [`providers`] so callers
//! can pick an implementation at runtime or swap in a fake under test.

pub mod models;
pub mod providers;
pub mod requests;
