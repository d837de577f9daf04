use serde::{Deserialize, Serialize};
use std::net::IpAddr;

/// Result of resolving a single IP address to a location
///
/// Produced once per successful lookup and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeoRecord {
    /// Address that was looked up
    pub ip: IpAddr,

    /// Country as reported by the provider (usually an ISO code, e.g. "US")
    pub country: Option<String>,

    /// City name
    pub city: Option<String>,

    /// Region/state/province
    pub region: Option<String>,
}

impl GeoRecord {
    pub fn new(
        ip: IpAddr,
        country: Option<String>,
        city: Option<String>,
        region: Option<String>,
    ) -> Self {
        Self {
            ip,
            country,
            city,
            region,
        }
    }

    /// Country value if it carries any non-whitespace text
    pub fn country_code(&self) -> Option<&str> {
        non_blank(self.country.as_deref())
    }

    /// City value if it carries any non-whitespace text
    pub fn city_name(&self) -> Option<&str> {
        non_blank(self.city.as_deref())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}
