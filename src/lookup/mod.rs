//! Resolving IP addresses to geolocation records
//!
//! [`GeoLookup`] is the seam between the orchestrator and whatever answers
//! location queries: the HTTP API, a local MaxMind database, or a test double.

pub mod http;
pub mod pacer;

#[cfg(feature = "mmdb")]
pub mod geoip;

use async_trait::async_trait;
use std::net::IpAddr;
use thiserror::Error;

use crate::models::GeoRecord;

pub use http::HttpGeoLookup;
pub use pacer::RequestPacer;

#[cfg(feature = "mmdb")]
pub use geoip::MaxMindLookup;

#[derive(Debug, Error)]
pub enum LookupError {
    #[error("request for {ip} failed")]
    Transport {
        ip: IpAddr,
        #[source]
        source: reqwest::Error,
    },
    #[error("lookup for {ip} returned HTTP {status}")]
    Status {
        ip: IpAddr,
        status: reqwest::StatusCode,
    },
    #[error("could not decode lookup response for {ip}")]
    Decode {
        ip: IpAddr,
        #[source]
        source: serde_json::Error,
    },
    #[error("no location data for {0}")]
    NotFound(IpAddr),
}

impl LookupError {
    /// Network-level failure (transport error or non-success status)
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::Status { .. })
    }
}

pub type LookupResult<T> = Result<T, LookupError>;

#[async_trait]
pub trait GeoLookup: Send + Sync {
    /// Resolve a single address. One call issues at most one upstream request.
    async fn lookup(&self, ip: IpAddr) -> LookupResult<GeoRecord>;
}
