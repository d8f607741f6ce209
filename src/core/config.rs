//! Configuration management for the MCP server.
//!
//! This module provides a centralized configuration structure populated from
//! environment variables (and a `.env` file) on top of defaults.

use std::time::Duration;

use super::error::{Error, Result};
use super::transport::TransportConfig;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use url::Url;

/// Default listing page.
pub const DEFAULT_PAGE_URL: &str = "https://cdyouth.cdcyl.org.cn/jgc/";
/// Default base for resolving relative links on the listing page.
pub const DEFAULT_BASE_URL: &str = "https://cdyouth.cdcyl.org.cn";
/// Default fetch timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 20;

/// Main configuration structure for the MCP server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server identification and metadata.
    pub server: ServerConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,

    /// Transport configuration.
    pub transport: TransportConfig,

    /// Activity listing source.
    pub source: SourceConfig,
}

/// Server identification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The name of the server as reported to clients.
    pub name: String,

    /// The version of the server.
    pub version: String,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "trace").
    pub level: String,
}

/// Where and how the activity listing is fetched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Listing page URL (also sent as `Referer`).
    pub page_url: String,

    /// Base URL for resolving relative links and images.
    pub base_url: String,

    /// Hard timeout for one fetch, in seconds.
    pub timeout_secs: u64,

    /// `User-Agent` sent with every request.
    pub user_agent: String,
}

impl SourceConfig {
    /// Fetch timeout as a duration.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            page_url: DEFAULT_PAGE_URL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: format!(
                "activities-mcp-server/{} (+{})",
                env!("CARGO_PKG_VERSION"),
                DEFAULT_BASE_URL
            ),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                name: "chengdu-youth-activities".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
            transport: TransportConfig::default(),
            source: SourceConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// `PORT` selects the SSE listen port; everything else is prefixed with
    /// `MCP_`, e.g. `MCP_SERVER_NAME`, `MCP_LOG_LEVEL`, `MCP_SOURCE_URL`.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let mut config = Self::default();

        if let Ok(name) = std::env::var("MCP_SERVER_NAME") {
            config.server.name = name;
        }

        if let Ok(level) = std::env::var("MCP_LOG_LEVEL") {
            config.logging.level = level;
        }

        config.transport = TransportConfig::from_env();

        if let Ok(url) = std::env::var("MCP_SOURCE_URL") {
            info!("Listing page overridden: {}", url);
            config.source.page_url = url;
        }

        if let Ok(base) = std::env::var("MCP_SOURCE_BASE_URL") {
            config.source.base_url = base;
        }

        if let Ok(timeout) = std::env::var("MCP_SOURCE_TIMEOUT_SECS") {
            match timeout.parse::<u64>() {
                Ok(secs) if secs > 0 => config.source.timeout_secs = secs,
                _ => warn!(
                    "Ignoring invalid MCP_SOURCE_TIMEOUT_SECS={:?}, using {}s",
                    timeout, config.source.timeout_secs
                ),
            }
        }

        config
    }

    /// Reject configurations the server cannot start with.
    pub fn validate(&self) -> Result<()> {
        if self.server.name.trim().is_empty() {
            return Err(Error::config("server name must not be empty"));
        }
        for (key, value) in [
            ("MCP_SOURCE_URL", &self.source.page_url),
            ("MCP_SOURCE_BASE_URL", &self.source.base_url),
        ] {
            Url::parse(value)
                .map_err(|e| Error::config(format!("{key}={value:?} is not a valid URL: {e}")))?;
        }
        if self.source.timeout_secs == 0 {
            return Err(Error::config("source timeout must be positive"));
        }
        Ok(())
    }
}
