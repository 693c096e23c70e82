//! Cloudflare Radar client for traffic volume and connection quality.

pub mod provider;
pub mod response;

pub use provider::{CloudflareRadarConfig, CloudflareRadarProvider};
