use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::process;
use tracing::info;
use tracing_subscriber::EnvFilter;

use ipgeo::config::Config;
use ipgeo::source::InvalidLinePolicy;
use ipgeo::Analyzer;

#[derive(Parser)]
#[command(name = "ipgeo")]
#[command(about = "Geolocate a list of IP addresses and report country and city statistics", long_about = None)]
struct Cli {
    /// Settings file (default: appsettings.json in the base directory, if present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory that relative paths resolve against (default: current directory)
    #[arg(long)]
    base_dir: Option<PathBuf>,

    /// Address list, one IP per line
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Directory for CSV and Markdown reports
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Geolocation API base URL; lookups go to {url}/{ip}/json
    #[arg(long)]
    api_url: Option<String>,

    /// Pause between two API requests in milliseconds
    #[arg(long)]
    delay_ms: Option<u64>,

    /// Skip lines that are not valid IP addresses instead of failing
    #[arg(long)]
    skip_invalid: bool,

    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn apply(&self, config: &mut Config) {
        if let Some(ref input) = self.input {
            config.paths.input_file = input.clone();
        }
        if let Some(ref output_dir) = self.output_dir {
            config.paths.output_dir = output_dir.clone();
        }
        if let Some(ref api_url) = self.api_url {
            config.api.base_url = api_url.clone();
        }
        if let Some(delay_ms) = self.delay_ms {
            config.api.request_delay_ms = delay_ms;
        }
        if self.skip_invalid {
            config.input.invalid_lines = InvalidLinePolicy::Skip;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let base_dir = match cli.base_dir {
        Some(ref dir) => dir.clone(),
        None => std::env::current_dir().context("Failed to determine working directory")?,
    };

    let mut config =
        Config::load(&base_dir, cli.config.as_deref()).context("Failed to load configuration")?;
    cli.apply(&mut config);
    let config = config.resolve_paths(&base_dir);
    info!("Loaded configuration");

    let analyzer = Analyzer::from_config(&config).context("Failed to set up analyzer")?;
    info!(
        "Publishing to: {}",
        analyzer.publisher_names().join(", ")
    );

    match analyzer.run(&config.paths.input_file).await {
        Ok(report) => {
            if report.skipped_lines > 0 {
                println!("⚠ Skipped {} invalid input lines", report.skipped_lines);
            }
            println!(
                "\n✅ Analysis complete: {} of {} addresses resolved, reports in {}",
                report.resolved(),
                report.total_addresses,
                config.paths.output_dir.display()
            );
            Ok(())
        }
        Err(e) => {
            eprintln!("❌ Error: {:#}", anyhow::Error::new(e));
            process::exit(1);
        }
    }
}
