//! Platform-wide error code registry.
//!
//! Every failure surfaced to a caller references exactly one [`ErrorCode`].
//! Codes are compile-time constants: the shared ones live here, and services
//! may declare their own with [`ErrorCode::new`] in a `const` item.

use axum::http::StatusCode;
use std::fmt;

/// Immutable `(code, default message)` pair identifying a class of failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ErrorCode {
    name: &'static str,
    code: i32,
    message: &'static str,
}

impl ErrorCode {
    /// Operation succeeded.
    pub const SUCCESS: Self = Self::new("SUCCESS", 200, "操作成功");

    /// Request parameters failed validation or binding.
    pub const PARAM_ERROR: Self = Self::new("PARAM_ERROR", 400, "参数错误");
    /// Caller is not authenticated.
    pub const UNAUTHORIZED: Self = Self::new("UNAUTHORIZED", 401, "未授权");
    /// Caller is authenticated but not allowed.
    pub const FORBIDDEN: Self = Self::new("FORBIDDEN", 403, "禁止访问");
    /// Resource or route does not exist.
    pub const NOT_FOUND: Self = Self::new("NOT_FOUND", 404, "资源不存在");
    /// HTTP method not supported by the route.
    pub const METHOD_NOT_ALLOWED: Self = Self::new("METHOD_NOT_ALLOWED", 405, "请求方法不允许");
    /// Request did not complete in time.
    pub const REQUEST_TIMEOUT: Self = Self::new("REQUEST_TIMEOUT", 408, "请求超时");
    /// Request conflicts with current resource state.
    pub const CONFLICT: Self = Self::new("CONFLICT", 409, "资源冲突");
    /// Caller exceeded a rate limit.
    pub const TOO_MANY_REQUESTS: Self = Self::new("TOO_MANY_REQUESTS", 429, "请求过于频繁");

    /// Unclassified server-side failure.
    pub const INTERNAL_ERROR: Self = Self::new("INTERNAL_ERROR", 500, "系统内部错误");
    /// A dependency of the service is unavailable.
    pub const SERVICE_UNAVAILABLE: Self = Self::new("SERVICE_UNAVAILABLE", 503, "服务暂不可用");

    /// Generic database failure.
    pub const DATABASE_ERROR: Self = Self::new("DATABASE_ERROR", 510, "数据库错误");
    /// Query could not be executed (syntax, unknown column or table).
    pub const DATABASE_QUERY_ERROR: Self = Self::new("DATABASE_QUERY_ERROR", 511, "数据库查询错误");
    /// Integrity constraint or unique key violated.
    pub const DATABASE_CONSTRAINT_VIOLATION: Self =
        Self::new("DATABASE_CONSTRAINT_VIOLATION", 512, "数据约束冲突");
    /// Database connection could not be established.
    pub const DATABASE_CONNECTION_ERROR: Self =
        Self::new("DATABASE_CONNECTION_ERROR", 513, "数据库连接失败");

    /// Every shared code, ordered by numeric value.
    pub const ALL: &'static [Self] = &[
        Self::SUCCESS,
        Self::PARAM_ERROR,
        Self::UNAUTHORIZED,
        Self::FORBIDDEN,
        Self::NOT_FOUND,
        Self::METHOD_NOT_ALLOWED,
        Self::REQUEST_TIMEOUT,
        Self::CONFLICT,
        Self::TOO_MANY_REQUESTS,
        Self::INTERNAL_ERROR,
        Self::SERVICE_UNAVAILABLE,
        Self::DATABASE_ERROR,
        Self::DATABASE_QUERY_ERROR,
        Self::DATABASE_CONSTRAINT_VIOLATION,
        Self::DATABASE_CONNECTION_ERROR,
    ];

    /// Declare an error code.
    ///
    /// Intended for `const` items so that codes stay static. Service-specific
    /// codes should use numbers outside the shared ranges (e.g. `10000+`).
    #[must_use]
    pub const fn new(name: &'static str, code: i32, message: &'static str) -> Self {
        Self { name, code, message }
    }

    /// Look up a shared code by its symbolic name.
    ///
    /// # Examples
    ///
    /// ```
    /// use service_base::ErrorCode;
    ///
    /// assert_eq!(ErrorCode::lookup("NOT_FOUND"), Some(ErrorCode::NOT_FOUND));
    /// assert_eq!(ErrorCode::lookup("no_such_code"), None);
    /// ```
    #[must_use]
    pub fn lookup(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|entry| entry.name == name)
    }

    /// Symbolic name, e.g. `PARAM_ERROR`.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Numeric code carried on the wire.
    #[must_use]
    pub const fn code(&self) -> i32 {
        self.code
    }

    /// Default human-readable message.
    #[must_use]
    pub const fn message(&self) -> &'static str {
        self.message
    }

    /// Transport status a failure with this code is reported with.
    ///
    /// Codes outside the table are treated as client-attributable.
    #[must_use]
    pub const fn http_status(&self) -> StatusCode {
        status_for_code(self.code)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name, self.code)
    }
}

pub(crate) const fn status_for_code(code: i32) -> StatusCode {
    match code {
        200 => StatusCode::OK,
        401 => StatusCode::UNAUTHORIZED,
        403 => StatusCode::FORBIDDEN,
        404 => StatusCode::NOT_FOUND,
        405 => StatusCode::METHOD_NOT_ALLOWED,
        408 => StatusCode::REQUEST_TIMEOUT,
        409 => StatusCode::CONFLICT,
        429 => StatusCode::TOO_MANY_REQUESTS,
        // constraint violations are caused by the submitted data
        512 => StatusCode::BAD_REQUEST,
        503 => StatusCode::SERVICE_UNAVAILABLE,
        500..=599 => StatusCode::INTERNAL_SERVER_ERROR,
        _ => StatusCode::BAD_REQUEST,
    }
}
