//! End-to-end analysis run
//!
//! Loads the address list, resolves every address one at a time with a
//! fixed pause between requests, aggregates the records that resolved, and
//! hands the statistics to each publisher in turn.
//!
//! Per-address lookup failures are logged and skipped. A failure to load the
//! address file aborts the run before any lookup. Publisher failures do not
//! stop the remaining publishers but fail the run once all have been tried.

use anyhow::Context;
use std::fmt;
use std::net::IpAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::analytics::StatisticsAggregator;
use crate::config::{Config, LookupProvider};
use crate::lookup::{GeoLookup, HttpGeoLookup, RequestPacer};
use crate::models::{GeoRecord, Statistics};
use crate::publish::{
    ConsolePublisher, CsvPublisher, MarkdownPublisher, PublishError, StatisticsPublisher,
};
use crate::source::{self, InvalidLinePolicy, SourceError};

/// An address that could not be resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupFailure {
    pub ip: IpAddr,
    pub reason: String,
}

/// A publisher that could not write its output
#[derive(Debug)]
pub struct PublisherFailure {
    pub publisher: &'static str,
    pub error: PublishError,
}

impl fmt::Display for PublisherFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.publisher, self.error)
    }
}

#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error("{} publisher(s) failed: {}", .0.len(), join_failures(.0))]
    Publish(Vec<PublisherFailure>),
}

fn join_failures(failures: &[PublisherFailure]) -> String {
    failures
        .iter()
        .map(|f| f.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Summary of a completed run
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Addresses read from the input file
    pub total_addresses: usize,
    /// Input lines dropped as invalid
    pub skipped_lines: usize,
    pub failures: Vec<LookupFailure>,
    pub statistics: Statistics,
}

impl RunReport {
    /// Addresses that resolved to a record
    pub fn resolved(&self) -> usize {
        self.statistics.total_records()
    }
}

/// Wires an address source, a lookup provider and publishers together
pub struct Analyzer {
    lookup: Arc<dyn GeoLookup>,
    pacer: RequestPacer,
    publishers: Vec<Box<dyn StatisticsPublisher>>,
    invalid_lines: InvalidLinePolicy,
}

impl Analyzer {
    /// Analyzer with default pacing and no publishers
    pub fn new(lookup: Arc<dyn GeoLookup>) -> Self {
        Self {
            lookup,
            pacer: RequestPacer::default(),
            publishers: Vec::new(),
            invalid_lines: InvalidLinePolicy::default(),
        }
    }

    /// Build the lookup provider and the console, CSV and Markdown publishers
    /// described by `config`. Paths are expected to be resolved already.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let (lookup, pacer): (Arc<dyn GeoLookup>, RequestPacer) = match config.api.provider {
            LookupProvider::Http => (
                Arc::new(HttpGeoLookup::from_config(&config.api)?),
                RequestPacer::new(Duration::from_millis(config.api.request_delay_ms)),
            ),
            LookupProvider::Mmdb => {
                let path = config
                    .api
                    .mmdb_path
                    .as_deref()
                    .context("api.mmdb_path is required for the mmdb provider")?;
                // Local database, no upstream rate limit to respect
                (open_mmdb(path)?, RequestPacer::disabled())
            }
        };

        let output_dir = &config.paths.output_dir;
        Ok(Self::new(lookup)
            .with_pacer(pacer)
            .with_invalid_line_policy(config.input.invalid_lines)
            .with_publisher(ConsolePublisher::new())
            .with_publisher(CsvPublisher::new(output_dir))
            .with_publisher(MarkdownPublisher::new(output_dir)))
    }

    pub fn with_pacer(mut self, pacer: RequestPacer) -> Self {
        self.pacer = pacer;
        self
    }

    pub fn with_invalid_line_policy(mut self, policy: InvalidLinePolicy) -> Self {
        self.invalid_lines = policy;
        self
    }

    pub fn with_publisher(mut self, publisher: impl StatisticsPublisher + 'static) -> Self {
        self.publishers.push(Box::new(publisher));
        self
    }

    pub fn publisher_names(&self) -> Vec<&'static str> {
        self.publishers.iter().map(|p| p.name()).collect()
    }

    /// Resolve addresses strictly in order, pausing between requests
    pub async fn resolve_all(
        &self,
        addresses: &[IpAddr],
    ) -> (Vec<GeoRecord>, Vec<LookupFailure>) {
        let mut records = Vec::with_capacity(addresses.len());
        let mut failures = Vec::new();

        for (idx, &ip) in addresses.iter().enumerate() {
            if idx > 0 {
                self.pacer.pause().await;
            }

            match self.lookup.lookup(ip).await {
                Ok(record) => {
                    println!(
                        "  ✓ {} -> {}, {}",
                        ip,
                        record.country.as_deref().unwrap_or("-"),
                        record.city.as_deref().unwrap_or("-")
                    );
                    records.push(record);
                }
                Err(e) => {
                    let reason = describe(&e);
                    warn!("Lookup failed for {}: {}", ip, reason);
                    println!("  ✗ {} -> {}", ip, reason);
                    failures.push(LookupFailure { ip, reason });
                }
            }
        }

        (records, failures)
    }

    /// Run the whole pipeline against the address file at `input`
    pub async fn run(&self, input: &Path) -> Result<RunReport, RunError> {
        info!("Loading IP addresses from {}", input.display());
        let list = source::load_addresses(input, self.invalid_lines).await?;
        println!("✓ Loaded {} IP addresses", list.len());

        let (records, failures) = self.resolve_all(&list.addresses).await;
        println!(
            "✓ Processed {} of {} IP addresses\n",
            records.len(),
            list.len()
        );

        let statistics = StatisticsAggregator::new(records).compute_statistics();
        debug!(
            countries = statistics.countries().len(),
            cities = statistics.cities().len(),
            "Aggregation finished"
        );

        let mut publish_failures = Vec::new();
        for publisher in &self.publishers {
            if let Err(e) = publisher.publish_statistics(&statistics).await {
                error!("Publisher '{}' failed: {}", publisher.name(), describe(&e));
                publish_failures.push(PublisherFailure {
                    publisher: publisher.name(),
                    error: e,
                });
            }
        }

        if !publish_failures.is_empty() {
            return Err(RunError::Publish(publish_failures));
        }

        Ok(RunReport {
            total_addresses: list.len(),
            skipped_lines: list.skipped_lines,
            failures,
            statistics,
        })
    }
}

#[cfg(feature = "mmdb")]
fn open_mmdb(path: &Path) -> anyhow::Result<Arc<dyn GeoLookup>> {
    Ok(Arc::new(crate::lookup::MaxMindLookup::open(path)?))
}

#[cfg(not(feature = "mmdb"))]
fn open_mmdb(path: &Path) -> anyhow::Result<Arc<dyn GeoLookup>> {
    anyhow::bail!(
        "cannot open {}: built without the 'mmdb' feature",
        path.display()
    )
}

/// Error message followed by its source chain
fn describe(err: &(dyn std::error::Error + 'static)) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
