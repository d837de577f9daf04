//! Geolocation lookups over an ipinfo-style HTTP API
//!
//! Each lookup is a single `GET {base_url}/{ip}/json`. The JSON body must be
//! an object; `country`, `city` and `region` are read when present.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::net::IpAddr;
use std::time::Duration;
use tracing::debug;

use super::{GeoLookup, LookupError, LookupResult};
use crate::config::ApiConfig;
use crate::models::GeoRecord;

/// Shape of the upstream response we care about
#[derive(Debug, Deserialize)]
struct GeoResponse {
    #[serde(default)]
    country: Option<String>,
    #[serde(default)]
    city: Option<String>,
    #[serde(default)]
    region: Option<String>,
}

#[derive(Debug, Clone)]
pub struct HttpGeoLookup {
    client: Client,
    base_url: String,
}

impl HttpGeoLookup {
    /// Build a lookup client from API settings
    pub fn from_config(config: &ApiConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("failed to build HTTP client for geolocation lookups")?;

        Self::with_client(client, &config.base_url)
    }

    /// Use an existing client; `base_url` must not be blank
    pub fn with_client(client: Client, base_url: &str) -> Result<Self> {
        let base_url = base_url.trim().trim_end_matches('/');
        if base_url.is_empty() {
            bail!("geolocation API base URL must not be empty");
        }

        Ok(Self {
            client,
            base_url: base_url.to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Request URL for `ip`
    pub fn url_for(&self, ip: IpAddr) -> String {
        format!("{}/{}/json", self.base_url, ip)
    }
}

#[async_trait]
impl GeoLookup for HttpGeoLookup {
    async fn lookup(&self, ip: IpAddr) -> LookupResult<GeoRecord> {
        let url = self.url_for(ip);
        debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|source| LookupError::Transport { ip, source })?;

        let status = response.status();
        if !status.is_success() {
            return Err(LookupError::Status { ip, status });
        }

        let body = response
            .text()
            .await
            .map_err(|source| LookupError::Transport { ip, source })?;

        decode_record(ip, &body)
    }
}

/// Turn a response body into a record for `ip`
fn decode_record(ip: IpAddr, body: &str) -> LookupResult<GeoRecord> {
    let decode_err = |source: serde_json::Error| LookupError::Decode { ip, source };

    let value: serde_json::Value = serde_json::from_str(body).map_err(decode_err)?;
    // Derived struct impls also accept sequences; only an object is a location
    if !value.is_object() {
        return Err(decode_err(serde::de::Error::custom("expected a JSON object")));
    }
    let parsed: GeoResponse = serde_json::from_value(value).map_err(decode_err)?;

    Ok(GeoRecord::new(ip, parsed.country, parsed.city, parsed.region))
}
