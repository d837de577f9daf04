//! Output sinks for ranked statistics
//!
//! Publishers never change the numbers they receive. Each one renders a
//! [`StatTable`], a flat view over one of the two ranked lists, to its medium.

pub mod console;
pub mod file;
pub mod markdown;

use async_trait::async_trait;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::models::Statistics;

pub use console::ConsolePublisher;
pub use file::CsvPublisher;
pub use markdown::MarkdownPublisher;

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("failed to write {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to encode CSV for {}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("failed to write to console")]
    Console(#[source] io::Error),
}

pub type PublishResult<T> = Result<T, PublishError>;

/// Which ranked list a table holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatKind {
    Countries,
    Cities,
}

impl StatKind {
    /// File name without extension used by file-based publishers
    pub fn file_stem(&self) -> &'static str {
        match self {
            StatKind::Countries => "countries",
            StatKind::Cities => "cities",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatRow {
    pub name: String,
    /// Only set for city rows
    pub region: Option<String>,
    pub count: usize,
    pub percentage: f64,
}

/// One ranked list ready for rendering
#[derive(Debug, Clone, PartialEq)]
pub struct StatTable {
    pub kind: StatKind,
    /// Country the city rows belong to
    pub country: Option<String>,
    /// Denominator used for the percentages
    pub total: usize,
    pub rows: Vec<StatRow>,
}

impl StatTable {
    pub fn countries(stats: &Statistics) -> Self {
        Self {
            kind: StatKind::Countries,
            country: None,
            total: stats.total_records(),
            rows: stats
                .countries()
                .iter()
                .map(|c| StatRow {
                    name: c.country_name.clone(),
                    region: None,
                    count: c.count,
                    percentage: c.percentage,
                })
                .collect(),
        }
    }

    pub fn cities(stats: &Statistics) -> Self {
        Self {
            kind: StatKind::Cities,
            country: stats.top_country().map(|c| c.country_code.clone()),
            total: stats.top_country_records(),
            rows: stats
                .cities()
                .iter()
                .map(|c| StatRow {
                    name: c.city.clone(),
                    region: c.region.clone(),
                    count: c.count,
                    percentage: c.percentage,
                })
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Human-readable heading, e.g. "Cities in US"
    pub fn title(&self) -> String {
        match (self.kind, &self.country) {
            (StatKind::Countries, _) => "Countries".to_string(),
            (StatKind::Cities, Some(country)) => format!("Cities in {}", country),
            (StatKind::Cities, None) => "Cities".to_string(),
        }
    }
}

/// Percentages are always shown with two decimals
pub fn format_percentage(value: f64) -> String {
    format!("{:.2}%", value)
}

#[async_trait]
pub trait StatisticsPublisher: Send + Sync {
    /// Short sink name used in logs and error reports
    fn name(&self) -> &'static str;

    /// Render a single table
    async fn publish(&self, table: &StatTable) -> PublishResult<()>;

    /// Render the country table followed by the city table
    async fn publish_statistics(&self, stats: &Statistics) -> PublishResult<()> {
        self.publish(&StatTable::countries(stats)).await?;
        self.publish(&StatTable::cities(stats)).await
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::analytics::StatisticsAggregator;
    use crate::models::{GeoRecord, Statistics};

    /// Statistics for US x3 (NY/NY x2, LA/CA) and DE x1
    pub fn sample_statistics() -> Statistics {
        let rows = [
            ("US", "NY", "NY"),
            ("US", "NY", "NY"),
            ("US", "LA", "CA"),
            ("DE", "Berlin", "Berlin"),
        ];
        let records = rows
            .iter()
            .enumerate()
            .map(|(i, (country, city, region))| {
                GeoRecord::new(
                    format!("192.0.2.{}", i + 1).parse().unwrap(),
                    Some(country.to_string()),
                    Some(city.to_string()),
                    Some(region.to_string()),
                )
            })
            .collect();
        StatisticsAggregator::new(records).compute_statistics()
    }
}
