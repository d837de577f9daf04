//! Flat CSV files, one per statistics kind
//!
//! A table with no rows is written as the header row alone, which is the
//! "no data" form of these files.

use async_trait::async_trait;
use csv::WriterBuilder;
use std::path::{Path, PathBuf};
use tracing::info;

use super::{PublishError, PublishResult, StatKind, StatTable, StatisticsPublisher};

/// Writes `countries.csv` and `cities.csv` into an output directory
#[derive(Debug, Clone)]
pub struct CsvPublisher {
    output_dir: PathBuf,
}

impl CsvPublisher {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn path_for(&self, kind: StatKind) -> PathBuf {
        self.output_dir.join(format!("{}.csv", kind.file_stem()))
    }
}

/// Encode a table as CSV; the header row is always present
pub fn encode(table: &StatTable, path: &Path) -> PublishResult<Vec<u8>> {
    let csv_err = |source: csv::Error| PublishError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut writer = WriterBuilder::new().from_writer(Vec::new());

    match table.kind {
        StatKind::Countries => writer
            .write_record(["rank", "country", "count", "percentage"])
            .map_err(csv_err)?,
        StatKind::Cities => writer
            .write_record(["rank", "city", "region", "country", "count", "percentage"])
            .map_err(csv_err)?,
    }

    let country = table.country.as_deref().unwrap_or_default();
    for (idx, row) in table.rows.iter().enumerate() {
        let rank = (idx + 1).to_string();
        let count = row.count.to_string();
        let percentage = format!("{:.2}", row.percentage);

        match table.kind {
            StatKind::Countries => writer
                .write_record([
                    rank.as_str(),
                    row.name.as_str(),
                    count.as_str(),
                    percentage.as_str(),
                ])
                .map_err(csv_err)?,
            StatKind::Cities => writer
                .write_record([
                    rank.as_str(),
                    row.name.as_str(),
                    row.region.as_deref().unwrap_or_default(),
                    country,
                    count.as_str(),
                    percentage.as_str(),
                ])
                .map_err(csv_err)?,
        }
    }

    writer.into_inner().map_err(|e| PublishError::Io {
        path: path.to_path_buf(),
        source: e.into_error(),
    })
}

#[async_trait]
impl StatisticsPublisher for CsvPublisher {
    fn name(&self) -> &'static str {
        "csv"
    }

    async fn publish(&self, table: &StatTable) -> PublishResult<()> {
        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|source| PublishError::Io {
                path: self.output_dir.clone(),
                source,
            })?;

        let path = self.path_for(table.kind);
        let bytes = encode(table, &path)?;

        tokio::fs::write(&path, bytes)
            .await
            .map_err(|source| PublishError::Io {
                path: path.clone(),
                source,
            })?;

        if table.is_empty() {
            info!("{}: no data, wrote header only to {}", table.title(), path.display());
        } else {
            info!("Wrote {} rows to {}", table.rows.len(), path.display());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Statistics;
    use crate::publish::test_support::sample_statistics;

    #[test]
    fn test_encode_countries() {
        let table = StatTable::countries(&sample_statistics());
        let bytes = encode(&table, Path::new("countries.csv")).unwrap();
        let text = String::from_utf8(bytes).unwrap();

        assert_eq!(
            text,
            "rank,country,count,percentage\n1,US,3,75.00\n2,DE,1,25.00\n"
        );
    }

    #[test]
    fn test_encode_cities() {
        let table = StatTable::cities(&sample_statistics());
        let bytes = encode(&table, Path::new("cities.csv")).unwrap();
        let text = String::from_utf8(bytes).unwrap();

        assert_eq!(
            text,
            "rank,city,region,country,count,percentage\n1,NY,NY,US,2,66.67\n2,LA,CA,US,1,33.33\n"
        );
    }

    #[test]
    fn test_encode_quotes_commas() {
        let mut table = StatTable::cities(&sample_statistics());
        table.rows[0].name = "Washington, D.C.".to_string();
        let text = String::from_utf8(encode(&table, Path::new("cities.csv")).unwrap()).unwrap();
        assert!(text.contains("1,\"Washington, D.C.\",NY,US,2,66.67"));
    }

    #[test]
    fn test_encode_empty_is_header_only() {
        let stats = Statistics::default();
        let countries = encode(&StatTable::countries(&stats), Path::new("countries.csv")).unwrap();
        assert_eq!(countries, b"rank,country,count,percentage\n");

        let cities = encode(&StatTable::cities(&stats), Path::new("cities.csv")).unwrap();
        assert_eq!(cities, b"rank,city,region,country,count,percentage\n");
    }

    #[tokio::test]
    async fn test_publish_creates_directory_and_files() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("nested").join("output");
        let publisher = CsvPublisher::new(&output);

        publisher
            .publish_statistics(&sample_statistics())
            .await
            .unwrap();

        let countries = std::fs::read_to_string(output.join("countries.csv")).unwrap();
        assert!(countries.starts_with("rank,country,count,percentage\n1,US,3,75.00"));
        let cities = std::fs::read_to_string(output.join("cities.csv")).unwrap();
        assert!(cities.contains("NY,NY,US,2,66.67"));
    }

    #[tokio::test]
    async fn test_publish_empty_writes_header_only() {
        let dir = tempfile::tempdir().unwrap();
        let publisher = CsvPublisher::new(dir.path());

        publisher
            .publish_statistics(&Statistics::default())
            .await
            .unwrap();

        let countries = std::fs::read_to_string(dir.path().join("countries.csv")).unwrap();
        assert_eq!(countries, "rank,country,count,percentage\n");
    }

    #[tokio::test]
    async fn test_publish_into_file_path_fails() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let publisher = CsvPublisher::new(file.path());

        let err = publisher
            .publish(&StatTable::countries(&sample_statistics()))
            .await
            .unwrap_err();
        assert!(matches!(err, PublishError::Io { .. }));
    }
}
