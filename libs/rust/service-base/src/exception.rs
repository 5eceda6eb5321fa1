//! The single domain failure type raised by business logic.

use std::error::Error as StdError;
use thiserror::Error;

use crate::error_code::ErrorCode;

type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// A handled domain failure referencing exactly one [`ErrorCode`].
///
/// Business code returns this whenever a rule is violated; the boundary
/// turns it into `ResultEnvelope::fail_with_message(code, message)`.
#[derive(Error, Debug)]
#[error("{message}")]
pub struct BusinessException {
    error_code: ErrorCode,
    message: String,
    #[source]
    source: Option<BoxError>,
}

impl BusinessException {
    /// Create an exception carrying the code's default message.
    #[must_use]
    pub fn new(error_code: ErrorCode) -> Self {
        Self::with_message(error_code, error_code.message())
    }

    /// Create an exception with an overridden message.
    ///
    /// # Examples
    ///
    /// ```
    /// use service_base::{BusinessException, ErrorCode};
    ///
    /// let err = BusinessException::with_message(ErrorCode::NOT_FOUND, "用户不存在");
    /// assert_eq!(err.error_code(), ErrorCode::NOT_FOUND);
    /// assert_eq!(err.to_string(), "用户不存在");
    /// ```
    #[must_use]
    pub fn with_message(error_code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            error_code,
            message: message.into(),
            source: None,
        }
    }

    /// Create an exception wrapping an underlying cause.
    #[must_use]
    pub fn with_source(
        error_code: ErrorCode,
        message: impl Into<String>,
        source: impl Into<BoxError>,
    ) -> Self {
        Self {
            error_code,
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// The error code this failure references.
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        self.error_code
    }

    /// The (possibly overridden) message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<ErrorCode> for BusinessException {
    fn from(error_code: ErrorCode) -> Self {
        Self::new(error_code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_message() {
        let err = BusinessException::new(ErrorCode::FORBIDDEN);
        assert_eq!(err.message(), "禁止访问");
        assert!(err.source().is_none());
    }

    #[test]
    fn test_source_is_exposed() {
        let cause = std::io::Error::other("disk full");
        let err = BusinessException::with_source(ErrorCode::INTERNAL_ERROR, "写入失败", cause);
        assert_eq!(err.to_string(), "写入失败");
        assert_eq!(err.source().map(ToString::to_string).as_deref(), Some("disk full"));
    }

    #[test]
    fn test_from_error_code() {
        let err: BusinessException = ErrorCode::CONFLICT.into();
        assert_eq!(err.error_code(), ErrorCode::CONFLICT);
        assert_eq!(err.message(), "资源冲突");
    }
}
