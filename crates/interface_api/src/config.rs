//! API configuration
//!
//! Read from `API_`-prefixed environment variables; anything unset falls back
//! to [`ApiConfig::default`].

use serde::Deserialize;
use std::time::Duration;

use core_kernel::PortError;
use domain_dispatch::{HttpInsurerConfig, InsurerRegistry, RetryPolicy};

/// How insurer calls are served
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsurerMode {
    /// In-process adapters producing canned acknowledgements
    Simulated,
    /// JSON over HTTP to `insurer_base_url`
    Http,
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Text,
    Json,
}

/// API configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// PostgreSQL URL; submissions are kept in memory when unset
    pub database_url: Option<String>,
    /// Log level
    pub log_level: String,
    pub log_format: LogFormat,
    /// Largest accepted request body, in bytes
    pub max_body_bytes: usize,
    pub dispatch_max_attempts: u32,
    pub dispatch_base_backoff_ms: u64,
    pub dispatch_per_call_timeout_ms: u64,
    /// Insurer calls allowed in flight across all submissions
    pub dispatch_max_in_flight: usize,
    pub insurer_mode: InsurerMode,
    /// Base URL for `http` mode; calls go to `{base}/{provider}/submit`
    pub insurer_base_url: String,
    /// Artificial delay for simulated insurers
    pub insurer_latency_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8001,
            database_url: None,
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
            max_body_bytes: 20 * 1024 * 1024,
            dispatch_max_attempts: 3,
            dispatch_base_backoff_ms: 200,
            dispatch_per_call_timeout_ms: 5000,
            dispatch_max_in_flight: domain_dispatch::DEFAULT_MAX_IN_FLIGHT,
            insurer_mode: InsurerMode::Simulated,
            insurer_base_url: "http://127.0.0.1:8001/api/mock/insurance".to_string(),
            insurer_latency_ms: 0,
        }
    }
}

impl ApiConfig {
    /// Loads configuration from environment
    pub fn from_env() -> Result<Self, config::ConfigError> {
        let mut config: ApiConfig = config::Config::builder()
            .add_source(config::Environment::with_prefix("API").try_parsing(true))
            .build()?
            .try_deserialize()?;

        if config.database_url.is_none() {
            config.database_url = std::env::var("DATABASE_URL").ok().filter(|url| !url.is_empty());
        }

        config.validate()?;
        Ok(config)
    }

    /// Rejects settings the server cannot run with
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        let invalid = |message: &str| Err(config::ConfigError::Message(message.to_string()));

        if self.dispatch_max_attempts == 0 {
            return invalid("dispatch_max_attempts must be at least 1");
        }
        if self.dispatch_max_in_flight == 0 {
            return invalid("dispatch_max_in_flight must be at least 1");
        }
        if self.dispatch_per_call_timeout_ms == 0 {
            return invalid("dispatch_per_call_timeout_ms must be positive");
        }
        if self.insurer_mode == InsurerMode::Http
            && !(self.insurer_base_url.starts_with("http://") || self.insurer_base_url.starts_with("https://"))
        {
            return invalid("insurer_base_url must be an http(s) URL in http mode");
        }
        Ok(())
    }

    /// Returns the server address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.dispatch_max_attempts,
            Duration::from_millis(self.dispatch_base_backoff_ms),
            Duration::from_millis(self.dispatch_per_call_timeout_ms),
        )
    }

    /// Builds the insurer registry for the configured mode
    pub fn insurer_registry(&self) -> Result<InsurerRegistry, PortError> {
        match self.insurer_mode {
            InsurerMode::Simulated => Ok(InsurerRegistry::simulated(Duration::from_millis(
                self.insurer_latency_ms,
            ))),
            InsurerMode::Http => {
                let mut http = HttpInsurerConfig::new(self.insurer_base_url.clone());
                http.request_timeout = Duration::from_millis(self.dispatch_per_call_timeout_ms);
                InsurerRegistry::http(&http)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ApiConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.server_addr(), "0.0.0.0:8001");
        assert_eq!(config.retry_policy(), RetryPolicy::default());
    }

    #[test]
    fn test_zero_attempts_rejected() {
        let config = ApiConfig {
            dispatch_max_attempts: 0,
            ..ApiConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_http_mode_requires_url() {
        let config = ApiConfig {
            insurer_mode: InsurerMode::Http,
            insurer_base_url: "localhost:9000".to_string(),
            ..ApiConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_simulated_registry_covers_every_insurer() {
        let registry = ApiConfig::default().insurer_registry().unwrap();
        assert_eq!(registry.len(), domain_cid::InsuranceCompany::ALL.len());
    }
}
