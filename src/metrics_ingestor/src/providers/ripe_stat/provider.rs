use std::{num::NonZeroU32, path::PathBuf, time::Duration};

use async_trait::async_trait;
use chrono::NaiveDate;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use nonzero_ext::nonzero;
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::{
    models::registry::{CountryAsns, Neighbour, ResourceStat, StatsResolution},
    providers::{
        ProviderError, ProviderInitError, RegistryProvider,
        ripe_stat::{
            params::{self, QueryParams, validate_country},
            response::{CountryAsnsData, NeighboursData, ResourceStatsData, RipeEnvelope},
        },
    },
    requests::{
        archive::ResponseArchive,
        retry::{RetryPolicy, with_retry},
    },
};

pub const BASE_URL: &str = "https://stat.ripe.net/data";

/// Client settings. `Default` targets the public endpoint.
#[derive(Clone, Debug)]
pub struct RipeStatConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub retry: RetryPolicy,
    /// Client-side ceiling; RIPEstat asks for fair use.
    pub requests_per_second: NonZeroU32,
    /// When set, every raw response is copied here.
    pub archive_dir: Option<PathBuf>,
}

impl Default for RipeStatConfig {
    fn default() -> Self {
        Self {
            base_url: BASE_URL.to_string(),
            timeout: Duration::from_secs(120),
            retry: RetryPolicy::default(),
            requests_per_second: nonzero!(8u32),
            archive_dir: None,
        }
    }
}

pub struct RipeStatProvider {
    client: Client,
    base_url: String,
    retry: RetryPolicy,
    limiter: DefaultDirectRateLimiter,
    archive: Option<ResponseArchive>,
}

impl RipeStatProvider {
    /// Creates a new RIPEstat provider. The API is anonymous.
    pub fn new(config: RipeStatConfig) -> Result<Self, ProviderInitError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        let archive = config.archive_dir.map(ResponseArchive::new).transpose()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            retry: config.retry,
            limiter: RateLimiter::direct(Quota::per_second(config.requests_per_second)),
            archive,
        })
    }

    fn url(&self, call: &str) -> String {
        format!("{}/{call}/data.json", self.base_url)
    }

    /// One raw page fetch; this is the unit that gets retried.
    async fn fetch_json(
        &self,
        url: &str,
        query: &QueryParams,
    ) -> Result<serde_json::Value, ProviderError> {
        self.limiter.until_ready().await;

        let response = self.client.get(url).query(query).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown API error".to_string());
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }

    async fn call<T: DeserializeOwned>(
        &self,
        call: &str,
        query: QueryParams,
    ) -> Result<T, ProviderError> {
        let url = self.url(call);
        debug!(call, ?query, "registry request");

        let body = with_retry(call, self.retry, || self.fetch_json(&url, &query)).await?;
        if let Some(archive) = &self.archive {
            archive.save("ripe", &url, &query, &body);
        }

        serde_json::from_value::<RipeEnvelope<T>>(body)?.into_data()
    }
}

#[async_trait]
impl RegistryProvider for RipeStatProvider {
    async fn country_asns(
        &self,
        country_iso2: &str,
        date: NaiveDate,
    ) -> Result<CountryAsns, ProviderError> {
        validate_country(country_iso2)?;
        let data: CountryAsnsData = self
            .call(params::COUNTRY_ASNS, params::country_asns(country_iso2, date))
            .await?;

        let mut out = CountryAsns::default();
        for entry in data.countries {
            if let Some(resource) = &entry.resource {
                if !resource.eq_ignore_ascii_case(country_iso2) {
                    continue;
                }
            }
            out.routed.extend(entry.routed.into_asns()?);
            out.non_routed.extend(entry.non_routed.into_asns()?);
        }

        info!(
            country = country_iso2,
            %date,
            routed = out.routed.len(),
            non_routed = out.non_routed.len(),
            "fetched country ASNs"
        );
        Ok(out)
    }

    async fn country_resource_stats(
        &self,
        country_iso2: &str,
        resolution: StatsResolution,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<ResourceStat>, ProviderError> {
        validate_country(country_iso2)?;
        if to < from {
            return Err(ProviderError::Validation(format!(
                "stats window ends ({to}) before it starts ({from})"
            )));
        }
        let data: ResourceStatsData = self
            .call(
                params::COUNTRY_RESOURCE_STATS,
                params::country_resource_stats(country_iso2, resolution, from, to),
            )
            .await?;

        info!(
            country = country_iso2,
            %resolution,
            %from,
            %to,
            records = data.stats.len(),
            "fetched routing statistics"
        );
        Ok(data.stats)
    }

    async fn asn_neighbours(
        &self,
        asn: i64,
        date: NaiveDate,
    ) -> Result<Vec<Neighbour>, ProviderError> {
        let data: NeighboursData = self
            .call(params::ASN_NEIGHBOURS, params::asn_neighbours(asn, date))
            .await?;
        debug!(asn, %date, neighbours = data.neighbours.len(), "fetched ASN neighbours");
        Ok(data.neighbours)
    }
}
