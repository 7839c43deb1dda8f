use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;

use crate::graphdb::QueryOptions;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub chemkg: ChemkgConfig,
    pub graphdb: GraphDbConfig,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub http_server: HttpServerConfig,
}

/// General settings
#[derive(Debug, Clone, Deserialize)]
pub struct ChemkgConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ChemkgConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// SPARQL endpoint settings
#[derive(Debug, Clone, Deserialize)]
pub struct GraphDbConfig {
    /// Server root, e.g. `http://localhost:7200`
    pub base_url: String,
    #[serde(default = "default_repository")]
    pub repository: String,
    #[serde(default = "default_infer")]
    pub infer: bool,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

/// Pathway search defaults
#[derive(Debug, Clone, Deserialize)]
pub struct PathsConfig {
    #[serde(default = "default_max_steps")]
    pub default_max_steps: usize,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            default_max_steps: default_max_steps(),
        }
    }
}

/// Result cache settings
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Maximum cached results; 0 disables the cache
    #[serde(default = "default_cache_capacity")]
    pub capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: default_cache_capacity(),
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct HttpServerConfig {
    #[serde(default = "default_http_port")]
    pub port: u16,
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            port: default_http_port(),
            allowed_origins: Vec::new(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_repository() -> String {
    "chemkg".to_string()
}

fn default_infer() -> bool {
    true
}

fn default_timeout_ms() -> u64 {
    60_000
}

fn default_max_steps() -> usize {
    3
}

fn default_cache_capacity() -> usize {
    128
}

fn default_http_port() -> u16 {
    8080
}

impl Config {
    /// Load configuration from file
    ///
    /// Loads environment variables from .env file (if present) before loading config.
    /// Looks for config file in this order:
    /// 1. Path specified in CHEMKG_CONFIG environment variable
    /// 2. ./config.toml in current directory
    pub fn load() -> Result<Self> {
        let _ = dotenv::dotenv();

        let config_path = std::env::var("CHEMKG_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config.toml"));

        let config_str = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        Self::from_toml(&config_str)
            .with_context(|| format!("Invalid config file: {}", config_path.display()))
    }

    /// Parse and validate configuration text
    pub fn from_toml(config_str: &str) -> Result<Self> {
        let config: Config = toml::from_str(config_str).context("Failed to parse config.toml")?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    fn validate(&self) -> Result<()> {
        let url = url::Url::parse(&self.graphdb.base_url)
            .with_context(|| format!("graphdb.base_url is not a valid URL: {}", self.graphdb.base_url))?;
        if url.cannot_be_a_base() {
            anyhow::bail!("graphdb.base_url must be an http(s) URL: {}", self.graphdb.base_url);
        }

        if self.graphdb.repository.trim().is_empty() {
            anyhow::bail!("graphdb.repository must not be empty");
        }

        if self.graphdb.timeout_ms == 0 {
            anyhow::bail!("graphdb.timeout_ms must be greater than 0");
        }

        if self.paths.default_max_steps == 0 {
            anyhow::bail!("paths.default_max_steps must be greater than 0");
        }

        Ok(())
    }

    /// Execution options for the configured repository
    pub fn query_options(&self) -> QueryOptions {
        QueryOptions::new(self.graphdb.repository.clone())
            .with_infer(self.graphdb.infer)
            .with_timeout_ms(self.graphdb.timeout_ms)
    }
}
