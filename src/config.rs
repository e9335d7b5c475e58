//! Application configuration loaded from environment variables.

use std::time::Duration;

use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::traffic::ClientConfig;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // === Backend ===
    /// Base URL of the traffic REST API, including the `/api` prefix.
    #[serde(default = "default_base_url")]
    pub traffic_api_base_url: String,

    /// Request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub http_timeout_ms: u64,

    // === Request logging ===
    /// Log every outgoing request.
    #[serde(default = "default_true")]
    pub log_requests: bool,

    /// Log every response status.
    #[serde(default = "default_true")]
    pub log_responses: bool,

    // === Logging ===
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub rust_log: String,

    /// Log output format: `text` or `json`.
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

fn default_base_url() -> String {
    "http://localhost:8080/api".to_string()
}

fn default_timeout_ms() -> u64 {
    10_000
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            traffic_api_base_url: default_base_url(),
            http_timeout_ms: default_timeout_ms(),
            log_requests: true,
            log_responses: true,
            rust_log: default_log_level(),
            log_format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from environment, reading .env file first.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        Ok(envy::from_env()?)
    }

    /// Check if the configuration is valid.
    pub fn validate(&self) -> Result<()> {
        let url = url::Url::parse(&self.traffic_api_base_url).map_err(|e| {
            AppError::InvalidConfig(format!("TRAFFIC_API_BASE_URL is not a valid URL: {}", e))
        })?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(AppError::InvalidConfig(
                "TRAFFIC_API_BASE_URL must use http or https".to_string(),
            ));
        }

        if self.http_timeout_ms == 0 {
            return Err(AppError::InvalidConfig(
                "HTTP_TIMEOUT_MS must be greater than 0".to_string(),
            ));
        }

        if !matches!(self.log_format.as_str(), "text" | "json") {
            return Err(AppError::InvalidConfig(
                "LOG_FORMAT must be `text` or `json`".to_string(),
            ));
        }

        Ok(())
    }

    /// Whether logs should be emitted as JSON lines.
    pub fn json_logs(&self) -> bool {
        self.log_format.eq_ignore_ascii_case("json")
    }

    /// Build the per-client configuration.
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            base_url: self.traffic_api_base_url.clone(),
            timeout: Duration::from_millis(self.http_timeout_ms),
            log_requests: self.log_requests,
            log_responses: self.log_responses,
        }
    }
}
