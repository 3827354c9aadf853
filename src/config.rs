//! Console configuration.
//!
//! ```toml
//! base_url = "https://api.example.com"
//! page_size = 25
//! search_delay_ms = 300
//! ```

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file {path}: {message}")]
    Read { path: String, message: String },
    #[error("invalid config: {0}")]
    Parse(String),
}

/// Tunables shared by every resource screen.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Root of the REST API, without a trailing slash.
    pub base_url: String,
    pub page_size: u32,
    /// Quiet period before a typed search term is committed.
    pub search_delay_ms: u64,
    pub request_timeout_secs: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            page_size: 10,
            search_delay_ms: 500,
            request_timeout_secs: 30,
        }
    }
}

impl SyncConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: SyncConfig =
            toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        Ok(config.normalized())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_toml_str(&text)
    }

    pub fn search_delay(&self) -> Duration {
        Duration::from_millis(self.search_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    fn normalized(mut self) -> Self {
        self.page_size = self.page_size.max(1);
        while self.base_url.ends_with('/') {
            self.base_url.pop();
        }
        self
    }
}
