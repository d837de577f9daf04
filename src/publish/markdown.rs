//! Markdown reports, one file per statistics kind

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use tracing::info;

use super::{
    format_percentage, PublishError, PublishResult, StatKind, StatTable, StatisticsPublisher,
};

/// Writes `countries.md` and `cities.md` into an output directory
#[derive(Debug, Clone)]
pub struct MarkdownPublisher {
    output_dir: PathBuf,
}

impl MarkdownPublisher {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn path_for(&self, kind: StatKind) -> PathBuf {
        self.output_dir.join(format!("{}.md", kind.file_stem()))
    }
}

/// Render a table as a Markdown document
pub fn render(table: &StatTable, generated_at: DateTime<Utc>) -> String {
    let mut out = format!("# {}\n\n", table.title());
    out.push_str(&format!(
        "_Generated {} from {} records_\n\n",
        generated_at.format("%Y-%m-%d %H:%M:%S UTC"),
        table.total
    ));

    if table.is_empty() {
        out.push_str("_No data_\n");
        return out;
    }

    match table.kind {
        StatKind::Countries => {
            out.push_str("| # | Country | Count | Percentage |\n");
            out.push_str("|---:|:---|---:|---:|\n");
        }
        StatKind::Cities => {
            out.push_str("| # | City | Region | Count | Percentage |\n");
            out.push_str("|---:|:---|:---|---:|---:|\n");
        }
    }

    for (idx, row) in table.rows.iter().enumerate() {
        out.push_str(&format!("| {} | {} ", idx + 1, escape_cell(&row.name)));
        if table.kind == StatKind::Cities {
            out.push_str(&format!(
                "| {} ",
                escape_cell(row.region.as_deref().unwrap_or(""))
            ));
        }
        out.push_str(&format!(
            "| {} | {} |\n",
            row.count,
            format_percentage(row.percentage)
        ));
    }

    out
}

fn escape_cell(value: &str) -> String {
    value.replace('|', "\\|").replace('\n', " ")
}

#[async_trait]
impl StatisticsPublisher for MarkdownPublisher {
    fn name(&self) -> &'static str {
        "markdown"
    }

    async fn publish(&self, table: &StatTable) -> PublishResult<()> {
        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|source| PublishError::Io {
                path: self.output_dir.clone(),
                source,
            })?;

        let path = self.path_for(table.kind);
        tokio::fs::write(&path, render(table, Utc::now()))
            .await
            .map_err(|source| PublishError::Io {
                path: path.clone(),
                source,
            })?;

        info!("Markdown report written to {}", path.display());
        Ok(())
    }
}
