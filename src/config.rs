//! Application configuration loaded from environment variables.

use std::net::SocketAddr;

use serde::Deserialize;
use url::Url;

use crate::error::BackendError;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // === Database Connection ===
    /// Project URL of the hosted database (e.g. `https://xyz.supabase.co`).
    pub supabase_url: String,

    /// API key sent with every database request.
    pub supabase_key: String,

    // === Server Configuration ===
    /// Address the HTTP server binds to.
    #[serde(default = "default_host")]
    pub host: String,

    /// HTTP server port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Timeout for a single database request, in milliseconds.
    #[serde(default = "default_http_timeout_ms")]
    pub http_timeout_ms: u64,

    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub rust_log: String,

    // === Metrics ===
    /// Start the Prometheus exporter.
    #[serde(default)]
    pub metrics_enabled: bool,

    /// Prometheus exporter port.
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_http_timeout_ms() -> u64 {
    10_000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_metrics_port() -> u16 {
    9090
}

impl Config {
    /// Load configuration from environment, reading .env file first.
    pub fn load() -> Result<Self, BackendError> {
        dotenvy::dotenv().ok();
        Ok(envy::from_env()?)
    }

    /// Build configuration from explicit `(NAME, value)` pairs.
    pub fn from_vars<I>(vars: I) -> Result<Self, BackendError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Ok(envy::from_iter(vars)?)
    }

    /// Check if the configuration is valid.
    pub fn validate(&self) -> Result<(), String> {
        if self.supabase_url.trim().is_empty() {
            return Err("SUPABASE_URL is required".to_string());
        }

        if self.supabase_key.trim().is_empty() {
            return Err("SUPABASE_KEY is required".to_string());
        }

        let url = Url::parse(&self.supabase_url)
            .map_err(|e| format!("SUPABASE_URL is not a valid URL: {}", e))?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err("SUPABASE_URL must use http or https".to_string());
        }

        if self.http_timeout_ms == 0 {
            return Err("HTTP_TIMEOUT_MS must be greater than 0".to_string());
        }

        self.socket_addr()?;

        Ok(())
    }

    /// Address the HTTP server listens on.
    pub fn socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| format!("invalid HOST/PORT {}:{}: {}", self.host, self.port, e))
    }

    /// Address the Prometheus exporter listens on.
    pub fn metrics_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.host, self.metrics_port)
            .parse()
            .map_err(|e| format!("invalid HOST/METRICS_PORT: {}", e))
    }

    /// API key with everything but the first four characters masked.
    pub fn redacted_key(&self) -> String {
        let visible: String = self.supabase_key.chars().take(4).collect();
        format!("{}****", visible)
    }
}
