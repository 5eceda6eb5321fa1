//! Environment-driven configuration.
//!
//! Values are read once at startup into an immutable [`AppConfig`] that is
//! passed to whatever needs it. Nothing re-reads the environment later.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::health::{DEFAULT_DATE_FORMAT, HealthEndpoint, ServiceInfo, is_valid_date_format};
use crate::http::HttpConfig;
use crate::persistence::DatabaseConfig;
use crate::rpc::{RpcConfig, RpcError};
use crate::telemetry::TracingConfig;

/// Configuration errors.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// Environment variable parse error
    #[error("Failed to parse environment variable {name}: {reason}")]
    ParseError {
        /// Variable name
        name: String,
        /// Parser message
        reason: String,
    },

    /// Invalid port number
    #[error("Invalid port: must be between 1 and 65535")]
    InvalidPort,

    /// A timeout was zero
    #[error("Invalid timeout {name}: must be greater than 0")]
    InvalidTimeout {
        /// Variable name
        name: String,
    },

    /// The JSON date format is not a valid strftime pattern
    #[error("Invalid date format: {0}")]
    InvalidDateFormat(String),

    /// Missing required field
    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}

/// Process-wide service configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Application name
    pub service_name: String,
    /// Application version
    pub service_version: String,
    /// Server host address
    pub host: String,
    /// Server port (1-65535)
    pub port: u16,
    /// Path of the health endpoint
    pub health_path: String,
    /// Log level filter
    pub log_level: String,
    /// Emit JSON logs
    pub log_json: bool,
    /// Request timeout in seconds
    pub request_timeout_secs: u64,
    /// Graceful shutdown timeout in seconds
    pub shutdown_timeout_secs: u64,
    /// Outbound HTTP connect timeout in seconds
    pub http_connect_timeout_secs: u64,
    /// Outbound HTTP read timeout in seconds
    pub http_read_timeout_secs: u64,
    /// Outbound HTTP write timeout in seconds
    pub http_write_timeout_secs: u64,
    /// Idle connections kept per host
    pub http_pool_max_idle: usize,
    /// Idle connection lifetime in seconds
    pub http_pool_idle_secs: u64,
    /// Retry once on connection failure
    pub http_retry_on_connection_failure: bool,
    /// RPC connect timeout in milliseconds
    pub rpc_connect_timeout_ms: u64,
    /// RPC read timeout in milliseconds
    pub rpc_read_timeout_ms: u64,
    /// strftime pattern for serialized date-times
    pub json_date_format: String,
    /// Database URL, if the service has one
    pub database_url: Option<String>,
    /// Maximum database pool size
    pub database_max_connections: u32,
}

impl AppConfig {
    /// Loads configuration from environment variables with validation.
    ///
    /// A `.env` file in the working directory is read first if present.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a variable cannot be parsed or fails validation.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Loads configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a variable cannot be parsed or fails validation.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let text = |name: &str, default: &str| lookup(name).unwrap_or_else(|| default.to_string());

        let config = Self {
            service_name: text("SERVICE_NAME", "unknown"),
            service_version: text("SERVICE_VERSION", "0.0.1-SNAPSHOT"),
            host: text("HOST", "0.0.0.0"),
            port: parse_var(&lookup, "PORT", 8080)?,
            health_path: text("HEALTH_PATH", "/health"),
            log_level: text("LOG_LEVEL", "info"),
            log_json: parse_var(&lookup, "LOG_JSON", false)?,
            request_timeout_secs: parse_var(&lookup, "REQUEST_TIMEOUT", 30)?,
            shutdown_timeout_secs: parse_var(&lookup, "SHUTDOWN_TIMEOUT", 30)?,
            http_connect_timeout_secs: parse_var(&lookup, "HTTP_CONNECT_TIMEOUT", 10)?,
            http_read_timeout_secs: parse_var(&lookup, "HTTP_READ_TIMEOUT", 30)?,
            http_write_timeout_secs: parse_var(&lookup, "HTTP_WRITE_TIMEOUT", 30)?,
            http_pool_max_idle: parse_var(&lookup, "HTTP_POOL_MAX_IDLE", 5)?,
            http_pool_idle_secs: parse_var(&lookup, "HTTP_POOL_IDLE_SECS", 300)?,
            http_retry_on_connection_failure: parse_var(&lookup, "HTTP_RETRY_ON_CONNECTION_FAILURE", true)?,
            rpc_connect_timeout_ms: parse_var(&lookup, "RPC_CONNECT_TIMEOUT_MS", 10_000)?,
            rpc_read_timeout_ms: parse_var(&lookup, "RPC_READ_TIMEOUT_MS", 60_000)?,
            json_date_format: text("JSON_DATE_FORMAT", DEFAULT_DATE_FORMAT),
            database_url: lookup("DATABASE_URL").filter(|url| !url.is_empty()),
            database_max_connections: parse_var(&lookup, "DATABASE_MAX_CONNECTIONS", 10)?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::InvalidPort);
        }
        if self.service_name.is_empty() {
            return Err(ConfigError::MissingRequired("SERVICE_NAME".to_string()));
        }
        if !self.health_path.starts_with('/') {
            return Err(ConfigError::ParseError {
                name: "HEALTH_PATH".to_string(),
                reason: "path must start with '/'".to_string(),
            });
        }
        for (name, value) in [
            ("REQUEST_TIMEOUT", self.request_timeout_secs),
            ("HTTP_CONNECT_TIMEOUT", self.http_connect_timeout_secs),
            ("HTTP_READ_TIMEOUT", self.http_read_timeout_secs),
            ("HTTP_WRITE_TIMEOUT", self.http_write_timeout_secs),
            ("RPC_CONNECT_TIMEOUT_MS", self.rpc_connect_timeout_ms),
            ("RPC_READ_TIMEOUT_MS", self.rpc_read_timeout_ms),
        ] {
            if value == 0 {
                return Err(ConfigError::InvalidTimeout { name: name.to_string() });
            }
        }
        if !is_valid_date_format(&self.json_date_format) {
            return Err(ConfigError::InvalidDateFormat(self.json_date_format.clone()));
        }
        Ok(())
    }

    /// Socket address string to bind.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Name and version reported by the health endpoint.
    #[must_use]
    pub fn service_info(&self) -> ServiceInfo {
        ServiceInfo::new(&self.service_name, &self.service_version)
    }

    /// Health endpoint for this service.
    #[must_use]
    pub fn health_endpoint(&self) -> HealthEndpoint {
        HealthEndpoint::new(self.service_info())
            .with_path(&self.health_path)
            .with_date_format(&self.json_date_format)
    }

    /// Outbound HTTP client settings.
    #[must_use]
    pub fn http_config(&self) -> HttpConfig {
        HttpConfig::default()
            .with_connect_timeout(Duration::from_secs(self.http_connect_timeout_secs))
            .with_io_timeouts(
                Duration::from_secs(self.http_read_timeout_secs),
                Duration::from_secs(self.http_write_timeout_secs),
            )
            .with_pool_config(
                Duration::from_secs(self.http_pool_idle_secs),
                self.http_pool_max_idle,
            )
            .with_retry_on_connection_failure(self.http_retry_on_connection_failure)
            .with_user_agent(format!("{}/{}", self.service_name, self.service_version))
    }

    /// RPC settings for the service at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if `base_url` is not a valid absolute URL.
    pub fn rpc_config(&self, base_url: &str) -> Result<RpcConfig, RpcError> {
        Ok(RpcConfig::new(base_url)?.with_timeouts(
            Duration::from_millis(self.rpc_connect_timeout_ms),
            Duration::from_millis(self.rpc_read_timeout_ms),
        ))
    }

    /// Database pool settings, if a database is configured.
    #[must_use]
    pub fn database_config(&self) -> Option<DatabaseConfig> {
        self.database_url
            .as_ref()
            .map(|url| DatabaseConfig::new(url).with_max_connections(self.database_max_connections))
    }

    /// Logging settings.
    #[must_use]
    pub fn tracing_config(&self) -> TracingConfig {
        let config = TracingConfig::default()
            .with_service_name(&self.service_name)
            .with_log_level(&self.log_level);
        if self.log_json {
            config.with_json_output()
        } else {
            config
        }
    }

    /// Per-request processing deadline.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Upper bound on graceful shutdown.
    #[must_use]
    pub const fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}

/// Parse a variable with a default value.
fn parse_var<T, F>(lookup: &F, name: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(val) => val.trim().parse().map_err(|e: T::Err| ConfigError::ParseError {
            name: name.to_string(),
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}
