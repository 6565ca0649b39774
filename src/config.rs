//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use crate::poller::PollerConfig;
use crate::reconcile::{DisplayField, ReconcilerConfig, RetentionCap, DEFAULT_DRIFT_TOLERANCE_MS};
use crate::source::HttpSourceConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub endpoint: EndpointConfig,

    #[serde(default)]
    pub poller: PollingConfig,

    #[serde(default)]
    pub reconciler: RetentionConfig,

    #[serde(default)]
    pub display: DisplayConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Status endpoint configuration
#[derive(Debug, Clone, Deserialize)]
pub struct EndpointConfig {
    #[serde(default = "default_endpoint_url")]
    pub url: String,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,
}

fn default_endpoint_url() -> String {
    "http://127.0.0.1:8080/gen_change".to_string()
}

fn default_request_timeout() -> u64 {
    5000
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            url: default_endpoint_url(),
            request_timeout_ms: default_request_timeout(),
        }
    }
}

/// Polling cadence configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PollingConfig {
    #[serde(default = "default_poll_interval")]
    pub interval_ms: u64,
}

fn default_poll_interval() -> u64 {
    1000
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_poll_interval(),
        }
    }
}

/// Series retention and drift-detection configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RetentionConfig {
    /// Fixed per-series point cap; omit to follow the server-provided
    /// `history_length`
    pub retention_cap: Option<usize>,

    #[serde(default = "default_drift_tolerance")]
    pub drift_tolerance_ms: i64,
}

fn default_drift_tolerance() -> i64 {
    DEFAULT_DRIFT_TOLERANCE_MS
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            retention_cap: None,
            drift_tolerance_ms: default_drift_tolerance(),
        }
    }
}

/// Display-field selection
#[derive(Debug, Clone, Deserialize)]
pub struct DisplayConfig {
    #[serde(default = "default_display_fields")]
    pub fields: Vec<DisplayField>,
}

fn default_display_fields() -> Vec<DisplayField> {
    DisplayField::all().to_vec()
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            fields: default_display_fields(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Ok(config)
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("printwatch").join("config.toml")),
            Some(PathBuf::from("/etc/printwatch/config.toml")),
            Some(PathBuf::from("./config.toml")),
        ];

        for path in config_paths.iter().flatten() {
            if path.exists() {
                match Self::load_with_env(path) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path, e);
                    }
                }
            }
        }

        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("PRINTWATCH_URL") {
            self.endpoint.url = url;
        }
        if let Ok(interval) = std::env::var("PRINTWATCH_POLL_INTERVAL_MS") {
            if let Ok(ms) = interval.parse() {
                self.poller.interval_ms = ms;
            }
        }
        if let Ok(level) = std::env::var("PRINTWATCH_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("PRINTWATCH_LOG_FORMAT") {
            self.logging.format = format;
        }
    }

    /// Reconciler view of this configuration.
    pub fn reconciler_config(&self) -> ReconcilerConfig {
        ReconcilerConfig {
            retention_cap: match self.reconciler.retention_cap {
                Some(cap) => RetentionCap::Fixed(cap),
                None => RetentionCap::ServerProvided,
            },
            drift_tolerance_ms: self.reconciler.drift_tolerance_ms,
            display_fields: self.display.fields.clone(),
        }
    }

    /// HTTP source view of this configuration.
    pub fn source_config(&self) -> HttpSourceConfig {
        HttpSourceConfig {
            url: self.endpoint.url.clone(),
            request_timeout_ms: self.endpoint.request_timeout_ms,
        }
    }

    /// Poller view of this configuration.
    pub fn poller_config(&self) -> PollerConfig {
        PollerConfig {
            poll_interval: std::time::Duration::from_millis(self.poller.interval_ms),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# Printwatch Configuration
#
# Environment variables override these settings:
# - PRINTWATCH_URL
# - PRINTWATCH_POLL_INTERVAL_MS
# - PRINTWATCH_LOG_LEVEL
# - PRINTWATCH_LOG_FORMAT

[endpoint]
# Full URL of the status endpoint
url = "http://127.0.0.1:8080/gen_change"

# Request timeout (ms)
request_timeout_ms = 5000

[poller]
# Delay between poll cycles (ms)
interval_ms = 1000

[reconciler]
# Fixed per-series point cap; comment out to follow the
# server-provided history_length
# retention_cap = 120

# Window-skew tolerance before a full reload (ms)
drift_tolerance_ms = 10000

[display]
# Fields to project, in display order
fields = ["printing", "alarm", "armed", "summary", "filament_pos", "file_pos", "bed", "tool0", "log_msgs"]

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.endpoint.url, "http://127.0.0.1:8080/gen_change");
        assert_eq!(config.poller.interval_ms, 1000);
        assert_eq!(config.reconciler.retention_cap, None);
        assert_eq!(config.reconciler.drift_tolerance_ms, 10_000);
        assert_eq!(config.display.fields.len(), DisplayField::all().len());
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
[endpoint]
url = "http://printer.local/gen_change"

[poller]
interval_ms = 250

[reconciler]
retention_cap = 120

[display]
fields = ["summary", "armed"]
"#
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.endpoint.url, "http://printer.local/gen_change");
        assert_eq!(config.poller.interval_ms, 250);
        assert_eq!(config.reconciler.retention_cap, Some(120));
        assert_eq!(
            config.display.fields,
            vec![DisplayField::Summary, DisplayField::Armed]
        );
        // Unspecified sections keep their defaults
        assert_eq!(config.logging.format, "pretty");
    }

    #[test]
    fn test_parse_error_reported() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not valid toml [").unwrap();

        let result = Config::load(file.path());
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_generated_config_parses() {
        let config: Config = toml::from_str(&generate_default_config()).unwrap();
        assert_eq!(config.poller.interval_ms, 1000);
        assert_eq!(config.reconciler.retention_cap, None);
    }

    #[test]
    fn test_reconciler_config_mapping() {
        let mut config = Config::default();
        assert_eq!(
            config.reconciler_config().retention_cap,
            RetentionCap::ServerProvided
        );

        config.reconciler.retention_cap = Some(120);
        assert_eq!(
            config.reconciler_config().retention_cap,
            RetentionCap::Fixed(120)
        );
    }
}
