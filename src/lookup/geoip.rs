//! Offline lookups using a MaxMind GeoLite2/GeoIP2 City MMDB
//!
//! Produces the same record shape as the HTTP provider: ISO country code,
//! first subdivision as region, English city name.

use anyhow::{Context, Result};
use async_trait::async_trait;
use maxminddb::{geoip2, Mmap, Reader};
use std::net::IpAddr;
use std::path::Path;
use std::sync::Arc;

use super::{GeoLookup, LookupError, LookupResult};
use crate::models::GeoRecord;

/// Memory-mapped City database reader
#[derive(Clone)]
pub struct MaxMindLookup {
    reader: Arc<Reader<Mmap>>,
}

impl MaxMindLookup {
    /// Open the database at `path`
    pub fn open(path: &Path) -> Result<Self> {
        let reader = unsafe { Reader::open_mmap(path) }
            .with_context(|| format!("Failed to open GeoIP City database at {}", path.display()))?;

        Ok(Self {
            reader: Arc::new(reader),
        })
    }

    fn resolve(&self, ip: IpAddr) -> Option<GeoRecord> {
        let result = self.reader.lookup(ip).ok()?;

        // City data includes country; fall back to Country for country-only databases
        if let Ok(Some(city)) = result.decode::<geoip2::City>() {
            return Some(record_from_city(ip, &city));
        }

        match result.decode::<geoip2::Country>() {
            Ok(Some(country)) => Some(GeoRecord::new(
                ip,
                country.country.iso_code.map(|s| s.to_string()),
                None,
                None,
            )),
            _ => None,
        }
    }
}

fn record_from_city(ip: IpAddr, city: &geoip2::City) -> GeoRecord {
    let region = city
        .subdivisions
        .first()
        .and_then(|subdivision| subdivision.names.english)
        .map(|s| s.to_string());

    GeoRecord::new(
        ip,
        city.country.iso_code.map(|s| s.to_string()),
        city.city.names.english.map(|s| s.to_string()),
        region,
    )
}

#[async_trait]
impl GeoLookup for MaxMindLookup {
    async fn lookup(&self, ip: IpAddr) -> LookupResult<GeoRecord> {
        self.resolve(ip).ok_or(LookupError::NotFound(ip))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_invalid_path() {
        let result = MaxMindLookup::open(Path::new("/nonexistent/path.mmdb"));
        assert!(result.is_err());
    }

    #[test]
    fn test_open_non_mmdb_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), b"definitely not a maxmind database").unwrap();
        assert!(MaxMindLookup::open(file.path()).is_err());
    }
}
