//! Provider abstraction for the two upstream metric sources.
//!
//! [`RegistryProvider`] covers the routing registry (ASN inventory, routing
//! statistics, ASN adjacency) and [`TrafficProvider`] covers the traffic
//! telemetry service. Both are async and object safe, so the task runner can
//! hold a `Box<dyn RegistryProvider + Send + Sync>` chosen at startup.
//!
//! # Example
//!
//! ```rust
//! use async_trait::async_trait;
//! use chrono::NaiveDate;
//! use metrics_ingestor::models::registry::{CountryAsns, Neighbour, ResourceStat, StatsResolution};
//! use metrics_ingestor::providers::{ProviderError, RegistryProvider};
//!
//! struct Empty;
//!
//! #[async_trait]
//! impl RegistryProvider for Empty {
//!     async fn country_asns(&self, _c: &str, _d: NaiveDate) -> Result<CountryAsns, ProviderError> {
//!         Ok(CountryAsns::default())
//!     }
//!     async fn country_resource_stats(
//!         &self,
//!         _c: &str,
//!         _r: StatsResolution,
//!         _from: NaiveDate,
//!         _to: NaiveDate,
//!     ) -> Result<Vec<ResourceStat>, ProviderError> {
//!         Ok(vec![])
//!     }
//!     async fn asn_neighbours(&self, _asn: i64, _d: NaiveDate) -> Result<Vec<Neighbour>, ProviderError> {
//!         Ok(vec![])
//!     }
//! }
//! ```

pub mod cloudflare_radar;
pub mod errors;
pub mod ripe_stat;

use async_trait::async_trait;
use chrono::NaiveDate;

pub use errors::{ProviderError, ProviderInitError};

use crate::models::{
    radar::{QualitySeries, TrafficSeries},
    registry::{CountryAsns, Neighbour, ResourceStat, StatsResolution},
};

/// Routing-registry data source.
#[async_trait]
pub trait RegistryProvider {
    /// ASNs registered to `country_iso2` as of `date`.
    async fn country_asns(
        &self,
        country_iso2: &str,
        date: NaiveDate,
    ) -> Result<CountryAsns, ProviderError>;

    /// Routing statistics for `country_iso2` between `from` and `to`.
    async fn country_resource_stats(
        &self,
        country_iso2: &str,
        resolution: StatsResolution,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<ResourceStat>, ProviderError>;

    /// Adjacencies of one ASN as of `date`.
    async fn asn_neighbours(&self, asn: i64, date: NaiveDate)
    -> Result<Vec<Neighbour>, ProviderError>;
}

/// Traffic telemetry data source. Both series cover a trailing 52-week window.
#[async_trait]
pub trait TrafficProvider {
    async fn traffic(&self, country_iso2: &str) -> Result<TrafficSeries, ProviderError>;

    async fn internet_quality(&self, country_iso2: &str) -> Result<QualitySeries, ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed;

    #[async_trait]
    impl TrafficProvider for Fixed {
        async fn traffic(&self, _country_iso2: &str) -> Result<TrafficSeries, ProviderError> {
            Ok(TrafficSeries {
                timestamps: vec!["2024-01-01T00:00:00Z".into()],
                values: vec![0.5],
            })
        }

        async fn internet_quality(
            &self,
            _country_iso2: &str,
        ) -> Result<QualitySeries, ProviderError> {
            Err(ProviderError::Api("not available".into()))
        }
    }

    // The runner holds providers behind trait objects.
    #[tokio::test]
    async fn trait_objects_dispatch() {
        let provider: Box<dyn TrafficProvider + Send + Sync> = Box::new(Fixed);
        let traffic = provider.traffic("NL").await.unwrap();
        assert_eq!(traffic.values, vec![0.5]);
        assert!(provider.internet_quality("NL").await.is_err());
    }

    #[test]
    fn retryable_classification() {
        assert!(
            ProviderError::Status {
                status: 502,
                body: String::new()
            }
            .is_retryable()
        );
        assert!(!ProviderError::Api("bad token".into()).is_retryable());
        assert!(!ProviderError::Validation("asn".into()).is_retryable());
    }
}
