//! Test fixtures with sample data.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use service_base::{AppConfig, ConfigError};
use validator::Validate;

/// Sample request body carrying the usual constraint annotations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Validate)]
pub struct SampleCreateUser {
    /// Login name
    #[validate(length(min = 3, max = 20, message = "用户名长度必须在3到20之间"))]
    pub username: String,
    /// Contact email
    #[validate(email(message = "邮箱格式不正确"))]
    pub email: String,
}

impl SampleCreateUser {
    /// A request that passes validation.
    #[must_use]
    pub fn valid() -> Self {
        Self {
            username: "zhangsan".to_string(),
            email: "zhangsan@example.com".to_string(),
        }
    }

    /// A request that fails on both fields.
    #[must_use]
    pub fn invalid() -> Self {
        Self {
            username: "z".to_string(),
            email: "not-an-email".to_string(),
        }
    }
}

/// Configuration for `service-user` 1.2.0, with some variables overridden.
///
/// # Errors
///
/// Returns the validation error of the resulting variable set.
pub fn config_with(overrides: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
    let mut vars: HashMap<String, String> = [
        ("SERVICE_NAME", "service-user"),
        ("SERVICE_VERSION", "1.2.0"),
        ("HOST", "127.0.0.1"),
        ("PORT", "18080"),
        ("REQUEST_TIMEOUT", "5"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
    vars.extend(overrides.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())));
    AppConfig::from_lookup(|name| vars.get(name).cloned())
}

/// A success envelope as a remote service would send it.
#[must_use]
pub fn remote_success_body<T: Serialize>(data: &T) -> serde_json::Value {
    serde_json::json!({ "code": 200, "message": "操作成功", "data": data })
}

/// A failure envelope as a remote service would send it.
#[must_use]
pub fn remote_failure_body(code: i32, message: &str) -> serde_json::Value {
    serde_json::json!({ "code": code, "message": message })
}
