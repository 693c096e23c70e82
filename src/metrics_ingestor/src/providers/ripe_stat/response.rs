use serde::Deserialize;

use crate::{
    models::registry::{Neighbour, ResourceStat},
    providers::ProviderError,
};

/// Common wrapper of every RIPEstat response.
#[derive(Deserialize, Debug)]
pub struct RipeEnvelope<T> {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub messages: Vec<Vec<String>>,
    pub data: Option<T>,
}

impl<T> RipeEnvelope<T> {
    /// Unwraps `data`, turning a non-"ok" status into an API error.
    pub fn into_data(self) -> Result<T, ProviderError> {
        let ok = self.status.as_deref().is_none_or(|s| s == "ok");
        match (ok, self.data) {
            (true, Some(data)) => Ok(data),
            _ => {
                let text = self
                    .messages
                    .iter()
                    .map(|m| m.join(": "))
                    .collect::<Vec<_>>()
                    .join("; ");
                Err(ProviderError::Api(if text.is_empty() {
                    format!("status {:?} without data", self.status)
                } else {
                    text
                }))
            }
        }
    }
}

#[derive(Deserialize, Debug)]
pub struct CountryAsnsData {
    #[serde(default)]
    pub countries: Vec<CountryAsnsEntry>,
}

#[derive(Deserialize, Debug)]
pub struct CountryAsnsEntry {
    #[serde(default)]
    pub resource: Option<String>,
    pub routed: AsnSet,
    pub non_routed: AsnSet,
}

/// ASN set as sent by the API: `"{AsnSingle(1), AsnSingle(2)}"` at `lod=1`,
/// a plain list on some mirrors.
#[derive(Deserialize, Debug)]
#[serde(untagged)]
pub enum AsnSet {
    List(Vec<i64>),
    Text(String),
}

impl AsnSet {
    pub fn into_asns(self) -> Result<Vec<i64>, ProviderError> {
        match self {
            AsnSet::List(v) => Ok(v),
            AsnSet::Text(s) => parse_asn_set(&s),
        }
    }
}

/// Parses `"{AsnSingle(1101), AsnSingle(1103)}"` into `[1101, 1103]`.
pub fn parse_asn_set(raw: &str) -> Result<Vec<i64>, ProviderError> {
    let inner = raw.trim().trim_start_matches('{').trim_end_matches('}');
    inner
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(|token| {
            token
                .strip_prefix("AsnSingle(")
                .and_then(|t| t.strip_suffix(')'))
                .and_then(|n| n.trim().parse::<i64>().ok())
                .ok_or_else(|| ProviderError::Api(format!("unexpected ASN token {token:?}")))
        })
        .collect()
}

#[derive(Deserialize, Debug)]
pub struct ResourceStatsData {
    #[serde(default)]
    pub stats: Vec<ResourceStat>,
}

#[derive(Deserialize, Debug)]
pub struct NeighboursData {
    #[serde(default)]
    pub neighbours: Vec<Neighbour>,
}
