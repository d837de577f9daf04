//! Plain-text tables on stdout

use async_trait::async_trait;
use std::io::Write;

use super::{
    format_percentage, PublishError, PublishResult, StatKind, StatTable, StatisticsPublisher,
};

#[derive(Debug, Clone, Default)]
pub struct ConsolePublisher;

impl ConsolePublisher {
    pub fn new() -> Self {
        Self
    }
}

/// Render a table as aligned columns
pub fn render(table: &StatTable) -> String {
    let mut out = format!("=== {} ===\n", table.title());

    if table.is_empty() {
        out.push_str("No data\n");
        return out;
    }

    let mut header = vec!["#".to_string()];
    match table.kind {
        StatKind::Countries => header.push("Country".to_string()),
        StatKind::Cities => {
            header.push("City".to_string());
            header.push("Region".to_string());
        }
    }
    header.push("Count".to_string());
    header.push("Percentage".to_string());

    let rows: Vec<Vec<String>> = table
        .rows
        .iter()
        .enumerate()
        .map(|(idx, row)| {
            let mut cells = vec![(idx + 1).to_string(), row.name.clone()];
            if table.kind == StatKind::Cities {
                cells.push(row.region.clone().unwrap_or_default());
            }
            cells.push(row.count.to_string());
            cells.push(format_percentage(row.percentage));
            cells
        })
        .collect();

    let widths: Vec<usize> = (0..header.len())
        .map(|col| {
            rows.iter()
                .map(|r| r[col].chars().count())
                .chain(std::iter::once(header[col].chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    push_line(&mut out, &header, &widths);
    out.push_str(&"-".repeat(widths.iter().sum::<usize>() + 2 * (widths.len() - 1)));
    out.push('\n');
    for row in &rows {
        push_line(&mut out, row, &widths);
    }
    out.push_str(&format!("Total: {}\n", table.total));

    out
}

fn push_line(out: &mut String, cells: &[String], widths: &[usize]) {
    let line = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
        .collect::<Vec<_>>()
        .join("  ");
    out.push_str(line.trim_end());
    out.push('\n');
}

#[async_trait]
impl StatisticsPublisher for ConsolePublisher {
    fn name(&self) -> &'static str {
        "console"
    }

    async fn publish(&self, table: &StatTable) -> PublishResult<()> {
        let rendered = render(table);
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "{}", rendered).map_err(PublishError::Console)?;
        stdout.flush().map_err(PublishError::Console)
    }
}
