use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::source::InvalidLinePolicy;

/// Settings file looked up in the base directory when no file is given
pub const DEFAULT_CONFIG_FILE: &str = "appsettings.json";

/// Prefix for environment overrides, e.g. `IPGEO__PATHS__OUTPUT_DIR`
pub const ENV_PREFIX: &str = "IPGEO";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration file not found: {}", .0.display())]
    MissingFile(PathBuf),
    #[error("invalid configuration")]
    Invalid(#[from] config::ConfigError),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub input: InputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Address list, one IP per line
    #[serde(default = "PathsConfig::default_input_file")]
    pub input_file: PathBuf,
    /// Directory receiving CSV and Markdown reports
    #[serde(default = "PathsConfig::default_output_dir")]
    pub output_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LookupProvider {
    Http,
    Mmdb,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "ApiConfig::default_provider")]
    pub provider: LookupProvider,
    /// Lookups go to `{base_url}/{ip}/json`
    #[serde(default = "ApiConfig::default_base_url")]
    pub base_url: String,
    #[serde(default = "ApiConfig::default_request_delay_ms")]
    pub request_delay_ms: u64,
    #[serde(default = "ApiConfig::default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "ApiConfig::default_user_agent")]
    pub user_agent: String,
    /// City MMDB used when `provider = "mmdb"`
    #[serde(default)]
    pub mmdb_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InputConfig {
    #[serde(default)]
    pub invalid_lines: InvalidLinePolicy,
}

impl PathsConfig {
    fn default_input_file() -> PathBuf {
        PathBuf::from("ip_addresses.txt")
    }

    fn default_output_dir() -> PathBuf {
        PathBuf::from("output")
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            input_file: Self::default_input_file(),
            output_dir: Self::default_output_dir(),
        }
    }
}

impl ApiConfig {
    const fn default_provider() -> LookupProvider {
        LookupProvider::Http
    }

    fn default_base_url() -> String {
        "https://ipinfo.io".to_string()
    }

    const fn default_request_delay_ms() -> u64 {
        100
    }

    const fn default_timeout_secs() -> u64 {
        10
    }

    fn default_user_agent() -> String {
        concat!("ipgeo/", env!("CARGO_PKG_VERSION")).to_string()
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            provider: Self::default_provider(),
            base_url: Self::default_base_url(),
            request_delay_ms: Self::default_request_delay_ms(),
            timeout_secs: Self::default_timeout_secs(),
            user_agent: Self::default_user_agent(),
            mmdb_path: None,
        }
    }
}

impl Config {
    /// Load settings from defaults, a settings file and the environment
    ///
    /// When `file` is `None`, `appsettings.json` in `base_dir` is used if it
    /// exists. An explicitly named file must exist. Environment variables
    /// (`IPGEO__SECTION__KEY`, `.env` supported) override file values.
    pub fn load(base_dir: &Path, file: Option<&Path>) -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let (path, required) = match file {
            Some(path) => (resolve_against(base_dir, path), true),
            None => (base_dir.join(DEFAULT_CONFIG_FILE), false),
        };

        if required && !path.exists() {
            return Err(ConfigError::MissingFile(path));
        }

        let settings = config::Config::builder()
            .add_source(config::File::from(path.clone()).required(required))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Config = settings.try_deserialize()?;
        if path.exists() {
            tracing::info!("Configuration loaded from {}", path.display());
        }

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        match self.api.provider {
            LookupProvider::Http if self.api.base_url.trim().is_empty() => {
                Err(anyhow::anyhow!("api.base_url must be set when api.provider = \"http\"").into())
            }
            LookupProvider::Mmdb => {
                self.api
                    .mmdb_path
                    .as_ref()
                    .context("api.mmdb_path must be set when api.provider = \"mmdb\"")?;
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// Make relative paths absolute against `base_dir`
    pub fn resolve_paths(mut self, base_dir: &Path) -> Self {
        self.paths.input_file = resolve_against(base_dir, &self.paths.input_file);
        self.paths.output_dir = resolve_against(base_dir, &self.paths.output_dir);
        self.api.mmdb_path = self
            .api
            .mmdb_path
            .map(|p| resolve_against(base_dir, &p));
        self
    }
}

fn resolve_against(base_dir: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}
