use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub kgrelations: KgRelationsConfig,
    pub search: SearchConfig,
    #[serde(default)]
    pub traversal: TraversalConfig,
    #[serde(default)]
    pub demo: DemoConfig,
}

/// Endpoint and credential configuration
#[derive(Debug, Clone, Deserialize)]
pub struct KgRelationsConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Search request configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_limit")]
    pub default_limit: usize,
    #[serde(default = "default_indent")]
    pub indent: bool,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// 2-hop fan-out configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TraversalConfig {
    /// Max 1-hop lookups in flight during a 2-hop query; 1 keeps it sequential.
    #[serde(default = "default_two_hop_concurrency")]
    pub two_hop_concurrency: usize,
}

impl Default for TraversalConfig {
    fn default() -> Self {
        Self {
            two_hop_concurrency: default_two_hop_concurrency(),
        }
    }
}

/// Inputs for the `demo` command
#[derive(Debug, Clone, Deserialize)]
pub struct DemoConfig {
    #[serde(default = "default_demo_entity")]
    pub entity: String,
    #[serde(default = "default_demo_wiki_id")]
    pub wiki_id: u64,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            entity: default_demo_entity(),
            wiki_id: default_demo_wiki_id(),
        }
    }
}

fn default_endpoint() -> String {
    crate::kg::DEFAULT_ENDPOINT.to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_limit() -> usize {
    10
}

fn default_indent() -> bool {
    true
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_two_hop_concurrency() -> usize {
    1
}

fn default_demo_entity() -> String {
    "Taylor Swift".to_string()
}

fn default_demo_wiki_id() -> u64 {
    39027
}

impl Config {
    /// Load configuration from file
    ///
    /// Loads environment variables from .env file (if present) before loading config.
    /// Looks for config file in this order:
    /// 1. Path specified in KGRELATIONS_CONFIG environment variable
    /// 2. ./config.toml in current directory
    pub fn load() -> Result<Self> {
        // .env is optional
        let _ = dotenv::dotenv();

        let config_path = std::env::var("KGRELATIONS_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config.toml"));

        let config_str = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let config = Self::from_toml_str(&config_str)?;
        config.validate()?;

        Ok(config)
    }

    /// Parse configuration from TOML text without validating it
    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).context("Failed to parse config.toml")
    }

    /// Validate configuration values
    fn validate(&self) -> Result<()> {
        let endpoint = url::Url::parse(&self.kgrelations.endpoint).with_context(|| {
            format!("kgrelations.endpoint is not a valid URL: {}", self.kgrelations.endpoint)
        })?;
        if endpoint.scheme() != "http" && endpoint.scheme() != "https" {
            anyhow::bail!(
                "kgrelations.endpoint must use http or https, got {}",
                endpoint.scheme()
            );
        }

        self.api_key().with_context(|| {
            format!(
                "Environment variable {} not set. Set it in your .env file or as an environment variable with your Knowledge Graph API key.",
                self.kgrelations.api_key_env
            )
        })?;

        if self.search.default_limit == 0 {
            anyhow::bail!("search.default_limit must be greater than 0");
        }

        if self.search.timeout_secs == 0 {
            anyhow::bail!("search.timeout_secs must be greater than 0");
        }

        Ok(())
    }

    /// Read the API key from the configured environment variable
    pub fn api_key(&self) -> std::result::Result<String, std::env::VarError> {
        std::env::var(&self.kgrelations.api_key_env)
    }

    pub fn endpoint(&self) -> &str {
        &self.kgrelations.endpoint
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.search.timeout_secs)
    }
}
