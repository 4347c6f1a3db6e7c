//! Configuration management for RevHub
//!
//! Sources, lowest to highest precedence:
//! - Hardcoded defaults
//! - `/etc/revhub/revhub.{yaml,toml,json}`
//! - `./config/revhub.{yaml,toml,json}`
//! - File named by the `REVHUB_CONFIG` env var
//! - `REVHUB_<SECTION>__<KEY>` environment variables

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;

/// Root configuration structure for RevHub
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct RevhubConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub reviewers: ReviewerConfig,

    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl RevhubConfig {
    /// Load configuration from all sources and validate it.
    pub fn load() -> Result<Self, ConfigError> {
        let mut builder = Self::set_defaults(Config::builder())?;

        builder = builder
            .add_source(File::with_name("/etc/revhub/revhub").required(false))
            .add_source(File::with_name("./config/revhub").required(false));

        if let Ok(config_path) = std::env::var("REVHUB_CONFIG") {
            tracing::debug!(path = %config_path, "loading config file from REVHUB_CONFIG");
            builder = builder.add_source(File::with_name(&config_path).required(true));
        }

        // Example: REVHUB_SERVER__BIND_ADDRESS=127.0.0.1:9000
        builder = builder.add_source(
            Environment::with_prefix("REVHUB")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: RevhubConfig = builder.build()?.try_deserialize()?;
        config.validate()?;

        Ok(config)
    }

    /// Set default values for all configuration options
    fn set_defaults(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        builder
            .set_default("server.bind_address", ServerConfig::DEFAULT_BIND_ADDRESS)?
            .set_default("storage.shard_count", StorageConfig::DEFAULT_SHARD_COUNT as i64)?
            .set_default(
                "reviewers.max_per_pull_request",
                ReviewerConfig::DEFAULT_MAX_PER_PULL_REQUEST as i64,
            )?
            .set_default("telemetry.service_name", TelemetryConfig::DEFAULT_SERVICE_NAME)?
            .set_default("telemetry.log_level", "info")?
            .set_default("telemetry.log_format", "text")?
            .set_default("telemetry.sampling_ratio", 1.0)?
            .set_default("telemetry.export_timeout_secs", 10)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.socket_addr()?;

        if self.storage.shard_count == 0 {
            return Err(ConfigError::Message(
                "storage.shard_count must be > 0".to_string(),
            ));
        }

        if !(0.0..=1.0).contains(&self.telemetry.sampling_ratio) {
            return Err(ConfigError::Message(format!(
                "telemetry.sampling_ratio must be within [0, 1], got {}",
                self.telemetry.sampling_ratio
            )));
        }

        if !matches!(self.telemetry.log_format.as_str(), "text" | "json") {
            return Err(ConfigError::Message(format!(
                "telemetry.log_format must be `text` or `json`, got `{}`",
                self.telemetry.log_format
            )));
        }

        Ok(())
    }

    /// Load configuration from a specific file path
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let config: RevhubConfig = Self::set_defaults(Config::builder())?
            .add_source(File::from(path.as_ref()))
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }
}

/// HTTP listener configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub bind_address: String,
}

impl ServerConfig {
    pub const DEFAULT_BIND_ADDRESS: &'static str = "0.0.0.0:8080";

    /// Parses the bind address.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.bind_address.parse().map_err(|e| {
            ConfigError::Message(format!(
                "server.bind_address `{}` is invalid: {}",
                self.bind_address, e
            ))
        })
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: Self::DEFAULT_BIND_ADDRESS.to_string(),
        }
    }
}

/// In-memory store layout
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Number of independently locked shards per map
    pub shard_count: usize,
}

impl StorageConfig {
    pub const DEFAULT_SHARD_COUNT: usize = 16;
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            shard_count: Self::DEFAULT_SHARD_COUNT,
        }
    }
}

/// Reviewer assignment policy
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReviewerConfig {
    /// Upper bound of reviewers picked on creation (0 disables assignment)
    pub max_per_pull_request: usize,
}

impl ReviewerConfig {
    pub const DEFAULT_MAX_PER_PULL_REQUEST: usize = 2;
}

impl Default for ReviewerConfig {
    fn default() -> Self {
        Self {
            max_per_pull_request: Self::DEFAULT_MAX_PER_PULL_REQUEST,
        }
    }
}

/// Logging and trace export
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TelemetryConfig {
    /// Service name attached to exported spans
    pub service_name: String,

    /// Default filter directive when `RUST_LOG` is unset
    pub log_level: String,

    /// `text` or `json`
    pub log_format: String,

    /// OTLP gRPC endpoint (e.g. "http://localhost:4317"); export is off when unset
    #[serde(default)]
    pub otlp_endpoint: Option<String>,

    /// Sampling ratio (0.0 to 1.0)
    pub sampling_ratio: f64,

    /// Export timeout in seconds
    pub export_timeout_secs: u64,
}

impl TelemetryConfig {
    pub const DEFAULT_SERVICE_NAME: &'static str = "revhub-api";

    /// Returns `true` when spans should be exported.
    #[must_use]
    pub fn export_enabled(&self) -> bool {
        self.otlp_endpoint
            .as_deref()
            .is_some_and(|endpoint| !endpoint.trim().is_empty())
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: Self::DEFAULT_SERVICE_NAME.to_string(),
            log_level: "info".to_string(),
            log_format: "text".to_string(),
            otlp_endpoint: None,
            sampling_ratio: 1.0,
            export_timeout_secs: 10,
        }
    }
}
