//! Liveness endpoint.
//!
//! Reports `UP` whenever the process can answer at all. Dependencies are
//! not probed.

use std::fmt::{self, Write as _};
use std::sync::Arc;

use axum::Router;
use axum::extract::State;
use axum::routing::get;
use chrono::{Local, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::response::ResultEnvelope;

/// Default JSON date format (ISO-8601 local date-time).
pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

const DEFAULT_DESCRIPTION: &str = "服务运行正常";

const DESCRIPTIONS: &[(&str, &str)] = &[
    ("service-auth", "认证服务运行正常"),
    ("service-user", "用户服务运行正常"),
    ("service-gateway", "网关服务运行正常"),
    ("third-party-wechatWork", "企业微信服务运行正常"),
    ("third-party-aliyunOss", "阿里云OSS服务运行正常"),
    ("core-publisher", "发布者核心服务运行正常"),
];

/// Name and version the service reports about itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceInfo {
    /// Application name, e.g. `service-user`
    pub name: String,
    /// Application version
    pub version: String,
}

impl ServiceInfo {
    /// Create service info.
    #[must_use]
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

/// Payload of the health envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always `"UP"`
    pub status: String,
    /// Service name
    pub service: String,
    /// Service version
    pub version: String,
    /// Local time of the report
    pub timestamp: String,
    /// Human-readable description
    pub description: String,
}

/// Health endpoint configuration.
#[derive(Debug, Clone)]
pub struct HealthEndpoint {
    path: String,
    info: ServiceInfo,
    description: Option<String>,
    date_format: String,
}

impl HealthEndpoint {
    /// Create an endpoint mounted at `/health`.
    #[must_use]
    pub fn new(info: ServiceInfo) -> Self {
        Self {
            path: "/health".to_string(),
            info,
            description: None,
            date_format: DEFAULT_DATE_FORMAT.to_string(),
        }
    }

    /// Mount the endpoint at a different path.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Override the description from the built-in table.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Format used for the timestamp.
    ///
    /// A format that cannot render a local date-time (for example one
    /// with `%z`) falls back to [`DEFAULT_DATE_FORMAT`] at report time.
    #[must_use]
    pub fn with_date_format(mut self, format: impl Into<String>) -> Self {
        self.date_format = format.into();
        self
    }

    /// Path the endpoint is mounted at.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Description reported for this service.
    #[must_use]
    pub fn describe(&self) -> &str {
        self.description
            .as_deref()
            .unwrap_or_else(|| describe_service(&self.info.name))
    }

    /// Build the report for the given moment.
    #[must_use]
    pub fn report_at(&self, now: NaiveDateTime) -> ResultEnvelope<HealthResponse> {
        let description = self.describe().to_string();
        let response = HealthResponse {
            status: "UP".to_string(),
            service: self.info.name.clone(),
            version: self.info.version.clone(),
            timestamp: self.timestamp(now),
            description: description.clone(),
        };
        ResultEnvelope::success_with_message(description, response)
    }

    fn timestamp(&self, now: NaiveDateTime) -> String {
        format_local(now, &self.date_format).unwrap_or_else(|_| {
            warn!(format = %self.date_format, "Date format cannot render a local time, using default");
            now.format(DEFAULT_DATE_FORMAT).to_string()
        })
    }

    /// Router serving `GET <path>`.
    pub fn router(self) -> Router {
        let path = self.path.clone();
        Router::new()
            .route(&path, get(health))
            .with_state(Arc::new(self))
    }
}

/// Built-in description for a service name.
#[must_use]
pub fn describe_service(name: &str) -> &'static str {
    DESCRIPTIONS
        .iter()
        .find(|(service, _)| *service == name)
        .map_or(DEFAULT_DESCRIPTION, |(_, description)| description)
}

/// Render `moment` with a chrono format string.
///
/// # Errors
///
/// Returns an error if the format is malformed or needs data a local
/// date-time lacks, such as a UTC offset.
pub fn format_local(moment: NaiveDateTime, format: &str) -> Result<String, fmt::Error> {
    let mut rendered = String::new();
    write!(rendered, "{}", moment.format(format))?;
    Ok(rendered)
}

/// Whether `format` can render every local date-time.
#[must_use]
pub fn is_valid_date_format(format: &str) -> bool {
    NaiveDate::from_ymd_opt(2000, 1, 1)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .is_some_and(|sample| format_local(sample, format).is_ok())
}

async fn health(State(endpoint): State<Arc<HealthEndpoint>>) -> ResultEnvelope<HealthResponse> {
    debug!(service = %endpoint.info.name, "Health check");
    endpoint.report_at(Local::now().naive_local())
}
