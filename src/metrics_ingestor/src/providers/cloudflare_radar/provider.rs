use std::{path::PathBuf, time::Duration};

use async_trait::async_trait;
use reqwest::{Client, header};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use shared_utils::env::get_env_var;
use tracing::{debug, info};

use crate::{
    models::radar::{QualitySeries, TrafficSeries},
    providers::{
        ProviderError, ProviderInitError, TrafficProvider,
        cloudflare_radar::response::RadarEnvelope,
        ripe_stat::params::validate_country,
    },
    requests::{
        archive::ResponseArchive,
        retry::{RetryPolicy, with_retry},
    },
};

pub const BASE_URL: &str = "https://api.cloudflare.com/client/v4/radar";
pub const TOKEN_ENV: &str = "CLOUDFLARE_API_TOKEN";

const NETFLOWS: &str = "netflows/timeseries";
const IQI: &str = "quality/iqi/timeseries_groups";

#[derive(Clone, Debug)]
pub struct CloudflareRadarConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub retry: RetryPolicy,
    /// Radar `dateRange` selector.
    pub date_range: String,
    pub archive_dir: Option<PathBuf>,
}

impl Default for CloudflareRadarConfig {
    fn default() -> Self {
        Self {
            base_url: BASE_URL.to_string(),
            timeout: Duration::from_secs(120),
            retry: RetryPolicy::default(),
            date_range: "52w".to_string(),
            archive_dir: None,
        }
    }
}

pub struct CloudflareRadarProvider {
    client: Client,
    base_url: String,
    retry: RetryPolicy,
    date_range: String,
    archive: Option<ResponseArchive>,
    _api_token: SecretString,
}

impl CloudflareRadarProvider {
    /// Creates a provider that authenticates with `api_token` as a bearer token.
    pub fn new(
        api_token: SecretString,
        config: CloudflareRadarConfig,
    ) -> Result<Self, ProviderInitError> {
        let mut auth =
            header::HeaderValue::from_str(&format!("Bearer {}", api_token.expose_secret()))?;
        auth.set_sensitive(true);

        let mut headers = header::HeaderMap::new();
        headers.insert(header::AUTHORIZATION, auth);

        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;
        let archive = config.archive_dir.map(ResponseArchive::new).transpose()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            retry: config.retry,
            date_range: config.date_range,
            archive,
            _api_token: api_token,
        })
    }

    /// Reads the token from the `CLOUDFLARE_API_TOKEN` environment variable.
    pub fn from_env(config: CloudflareRadarConfig) -> Result<Self, ProviderInitError> {
        let token = SecretString::new(get_env_var(TOKEN_ENV)?.into());
        Self::new(token, config)
    }

    fn base_query(&self, country_iso2: &str) -> Vec<(&'static str, String)> {
        vec![
            ("name", "main".to_string()),
            ("location", country_iso2.to_string()),
            ("dateRange", self.date_range.clone()),
        ]
    }

    async fn fetch_json(
        &self,
        url: &str,
        query: &[(&'static str, String)],
    ) -> Result<serde_json::Value, ProviderError> {
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
        endpoint: &str,
        query: Vec<(&'static str, String)>,
    ) -> Result<T, ProviderError> {
        let url = format!("{}/{endpoint}", self.base_url);
        debug!(endpoint, ?query, "radar request");

        let body = with_retry(endpoint, self.retry, || self.fetch_json(&url, &query)).await?;
        if let Some(archive) = &self.archive {
            archive.save("cloudflare", &url, &query, &body);
        }

        serde_json::from_value::<RadarEnvelope<T>>(body)?.into_main()
    }
}

#[async_trait]
impl TrafficProvider for CloudflareRadarProvider {
    async fn traffic(&self, country_iso2: &str) -> Result<TrafficSeries, ProviderError> {
        validate_country(country_iso2)?;
        let series: TrafficSeries = self.call(NETFLOWS, self.base_query(country_iso2)).await?;
        info!(
            country = country_iso2,
            records = series.timestamps.len(),
            "fetched traffic series"
        );
        Ok(series)
    }

    async fn internet_quality(&self, country_iso2: &str) -> Result<QualitySeries, ProviderError> {
        validate_country(country_iso2)?;
        let mut query = self.base_query(country_iso2);
        query.push(("metric", "bandwidth".to_string()));
        query.push(("interpolation", "true".to_string()));

        let series: QualitySeries = self.call(IQI, query).await?;
        info!(
            country = country_iso2,
            records = series.timestamps.len(),
            "fetched internet quality series"
        );
        Ok(series)
    }
}
