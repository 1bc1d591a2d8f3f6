//! Configuration management for the explorer
//!
//! Default config location: ~/.sumo/explorer.toml
//!
//! `SUMO_ENV` and `SUMO_TOKEN` override the file after it has been parsed.

use crate::error::{ExplorerError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Largest page the search endpoint accepts in one request
pub const MAX_PAGE_SIZE: usize = 10_000;

/// Main configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExplorerConfig {
    /// Sumo environment (prod, preview, dev, ...)
    #[serde(default = "default_env")]
    pub env: String,
    /// Explicit API root, overrides the URL derived from `env`
    #[serde(default)]
    pub base_url: Option<String>,
    /// Bearer token sent with every request
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,
    #[serde(default)]
    pub paging: PagingConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_env() -> String {
    "prod".to_string()
}

fn default_request_timeout() -> u64 {
    30000
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            env: default_env(),
            base_url: None,
            token: None,
            request_timeout_ms: default_request_timeout(),
            paging: PagingConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Page and bucket sizes used when talking to the search endpoint
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct PagingConfig {
    #[serde(default = "default_page_size")]
    pub case_page_size: usize,
    #[serde(default = "default_page_size")]
    pub child_page_size: usize,
    /// Batch size for id-only listings feeding an aggregation
    #[serde(default = "default_page_size")]
    pub id_batch_size: usize,
    #[serde(default = "default_facet_size")]
    pub facet_size: usize,
    #[serde(default = "default_facet_size")]
    pub interval_facet_size: usize,
    #[serde(default = "default_realization_facet_size")]
    pub realization_facet_size: usize,
}

fn default_page_size() -> usize {
    500
}

fn default_facet_size() -> usize {
    50
}

fn default_realization_facet_size() -> usize {
    1000
}

impl Default for PagingConfig {
    fn default() -> Self {
        Self {
            case_page_size: default_page_size(),
            child_page_size: default_page_size(),
            id_batch_size: default_page_size(),
            facet_size: default_facet_size(),
            interval_facet_size: default_facet_size(),
            realization_facet_size: default_realization_facet_size(),
        }
    }
}

impl PagingConfig {
    pub fn validate(&self) -> Result<()> {
        let sizes = [
            ("case_page_size", self.case_page_size),
            ("child_page_size", self.child_page_size),
            ("id_batch_size", self.id_batch_size),
            ("facet_size", self.facet_size),
            ("interval_facet_size", self.interval_facet_size),
            ("realization_facet_size", self.realization_facet_size),
        ];

        for (name, size) in sizes {
            if size == 0 || size > MAX_PAGE_SIZE {
                return Err(ExplorerError::Config(format!(
                    "paging.{} must be between 1 and {}, got {}",
                    name, MAX_PAGE_SIZE, size
                )));
            }
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Log level filter string
    /// Override with RUST_LOG env var
    #[serde(default = "default_level")]
    pub level: String,
    /// Log output format: "pretty" or "json"
    /// Override with LOG_FORMAT env var
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: default_log_format(),
        }
    }
}

/// Default config path (~/.sumo/explorer.toml)
pub fn default_config_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".sumo")
        .join("explorer.toml")
}

impl ExplorerConfig {
    /// Load config from the default location
    pub fn load() -> Result<Self> {
        Self::load_from(&default_config_path())
    }

    /// Load config from a specific file. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = fs::read_to_string(path).map_err(|e| {
                ExplorerError::Config(format!("Cannot read {}: {}", path.display(), e))
            })?;
            toml::from_str(&content)?
        } else {
            ExplorerConfig::default()
        };

        config.apply_overrides(
            std::env::var("SUMO_ENV").ok(),
            std::env::var("SUMO_TOKEN").ok(),
        );
        config.validate()?;
        Ok(config)
    }

    fn apply_overrides(&mut self, env: Option<String>, token: Option<String>) {
        if let Some(env) = env.filter(|e| !e.is_empty()) {
            self.env = env;
        }
        if let Some(token) = token.filter(|t| !t.is_empty()) {
            self.token = Some(token);
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.env.trim().is_empty() && self.base_url.is_none() {
            return Err(ExplorerError::Config(
                "either env or base_url must be set".to_string(),
            ));
        }
        self.paging.validate()
    }

    /// API root for the configured environment
    pub fn base_url(&self) -> String {
        match &self.base_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("https://main-sumo-{}.radix.equinor.com/api/v1", self.env),
        }
    }

    pub fn request_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.request_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = ExplorerConfig::default();
        assert_eq!(config.env, "prod");
        assert_eq!(config.paging.child_page_size, 500);
        assert_eq!(config.paging.facet_size, 50);
        assert_eq!(
            config.base_url(),
            "https://main-sumo-prod.radix.equinor.com/api/v1"
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: ExplorerConfig = toml::from_str(
            r#"
env = "dev"

[paging]
child_page_size = 20
"#,
        )
        .unwrap();

        assert_eq!(config.env, "dev");
        assert_eq!(config.paging.child_page_size, 20);
        assert_eq!(config.paging.case_page_size, 500);
        assert_eq!(config.logging.format, "pretty");
    }

    #[test]
    fn test_base_url_override_strips_trailing_slash() {
        let config = ExplorerConfig {
            base_url: Some("http://localhost:8084/api/v1/".to_string()),
            ..Default::default()
        };
        assert_eq!(config.base_url(), "http://localhost:8084/api/v1");
    }

    #[test]
    fn test_zero_page_size_rejected() {
        let mut config = ExplorerConfig::default();
        config.paging.id_batch_size = 0;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ExplorerError::Config(msg) if msg.contains("id_batch_size")));
    }

    #[test]
    fn test_oversized_page_rejected() {
        let mut config = ExplorerConfig::default();
        config.paging.case_page_size = MAX_PAGE_SIZE + 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_overrides_ignore_empty_values() {
        let mut config = ExplorerConfig::default();
        config.apply_overrides(Some(String::new()), Some("secret".to_string()));
        assert_eq!(config.env, "prod");
        assert_eq!(config.token.as_deref(), Some("secret"));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("explorer.toml");
        let mut file = fs::File::create(&path).unwrap();
        writeln!(file, "base_url = \"http://127.0.0.1:9999\"").unwrap();
        writeln!(file, "request_timeout_ms = 1500").unwrap();

        let config = ExplorerConfig::load_from(&path).unwrap();
        assert_eq!(config.base_url(), "http://127.0.0.1:9999");
        assert_eq!(config.request_timeout().as_millis(), 1500);
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("explorer.toml");
        fs::write(&path, "paging = 12").unwrap();

        let err = ExplorerConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, ExplorerError::Config(_)));
    }
}
