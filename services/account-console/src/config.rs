//! Configuration types and loading
//!
//! Config precedence: env vars > config file > defaults. The file is
//! optional; without one the console talks to a local backend with stock
//! timeouts. Credentials never appear here, they are typed at the prompt.

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Root configuration
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub backend: BackendConfig,
}

/// Identity backend settings
#[derive(Debug, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_base_url() -> String {
    "http://127.0.0.1:8080".to_string()
}

fn default_timeout() -> u64 {
    30
}

impl Config {
    /// Load configuration from a TOML file, then overlay environment
    /// variables (`POSTERN_BACKEND_URL`, `POSTERN_TIMEOUT_SECS`).
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config: Config =
            toml::from_str(&contents).with_context(|| format!("parsing {}", path.display()))?;
        config.finish()
    }

    /// Built-in defaults plus the environment overlay, for running without a
    /// config file.
    pub fn from_defaults() -> Result<Self> {
        Config::default().finish()
    }

    /// Request timeout as a `Duration`.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.backend.timeout_secs)
    }

    fn finish(mut self) -> Result<Self> {
        if let Ok(url) = std::env::var("POSTERN_BACKEND_URL") {
            self.backend.base_url = url;
        }
        if let Ok(raw) = std::env::var("POSTERN_TIMEOUT_SECS") {
            self.backend.timeout_secs = raw
                .parse()
                .with_context(|| format!("POSTERN_TIMEOUT_SECS must be an integer, got: {raw}"))?;
        }

        if !self.backend.base_url.starts_with("http://")
            && !self.backend.base_url.starts_with("https://")
        {
            bail!(
                "base_url must start with http:// or https://, got: {}",
                self.backend.base_url
            );
        }
        if self.backend.timeout_secs == 0 {
            bail!("timeout_secs must be greater than 0");
        }

        Ok(self)
    }

    /// Resolve config file path from CLI arg or CONFIG_PATH env var.
    pub fn resolve_path(cli_path: Option<&str>) -> PathBuf {
        if let Some(p) = cli_path {
            return PathBuf::from(p);
        }
        if let Ok(p) = std::env::var("CONFIG_PATH") {
            return PathBuf::from(p);
        }
        PathBuf::from("account-console.toml")
    }
}
