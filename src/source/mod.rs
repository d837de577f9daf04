//! Loading IP addresses from a text file
//!
//! One address per line. Blank lines and `#` comments are ignored; every
//! other line must parse as an IPv4 or IPv6 address unless the caller opts
//! into skipping invalid lines.

use serde::{Deserialize, Serialize};
use std::io;
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("address file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("invalid IP address '{value}' on line {line}")]
    Parse {
        line: usize,
        value: String,
        #[source]
        source: std::net::AddrParseError,
    },
    #[error("failed to read address file {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// What to do with a line that is not a valid IP address
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvalidLinePolicy {
    /// Abort the whole load
    #[default]
    Fail,
    /// Log and drop the line
    Skip,
}

/// Addresses read from a file, in file order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressList {
    pub addresses: Vec<IpAddr>,
    /// Lines dropped under [`InvalidLinePolicy::Skip`]
    pub skipped_lines: usize,
}

impl AddressList {
    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }
}

/// Read and parse the address file at `path`
pub async fn load_addresses(
    path: &Path,
    policy: InvalidLinePolicy,
) -> Result<AddressList, SourceError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => SourceError::NotFound(path.to_path_buf()),
            _ => SourceError::Io {
                path: path.to_path_buf(),
                source: e,
            },
        })?;

    let list = parse_addresses(&content, policy)?;
    debug!(
        "Loaded {} addresses from {} ({} skipped)",
        list.len(),
        path.display(),
        list.skipped_lines
    );
    Ok(list)
}

/// Parse address lines from already-loaded text
pub fn parse_addresses(
    content: &str,
    policy: InvalidLinePolicy,
) -> Result<AddressList, SourceError> {
    let mut list = AddressList::default();

    for (idx, raw) in content.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        match line.parse::<IpAddr>() {
            Ok(ip) => list.addresses.push(ip),
            Err(source) => match policy {
                InvalidLinePolicy::Fail => {
                    return Err(SourceError::Parse {
                        line: idx + 1,
                        value: line.to_string(),
                        source,
                    });
                }
                InvalidLinePolicy::Skip => {
                    warn!("Skipping invalid IP address '{}' on line {}", line, idx + 1);
                    list.skipped_lines += 1;
                }
            },
        }
    }

    Ok(list)
}
