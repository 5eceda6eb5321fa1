//! Uniform success/failure envelope returned by every endpoint.
//!
//! The wire shape is `{ "code": <int>, "message": "<string>", "data": <T> }`
//! with `data` omitted when absent. The same type is used for HTTP bodies
//! and for decoding responses from other services.

use axum::Json;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use crate::error_code::{ErrorCode, status_for_code};

/// Response extension set on every envelope body so the boundary
/// middleware leaves it untouched.
#[derive(Debug, Clone, Copy)]
pub(crate) struct EnvelopeMarker;

/// Success/failure wrapper around an optional payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultEnvelope<T> {
    code: i32,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
}

impl<T> ResultEnvelope<T> {
    /// Success carrying `data` and the default success message.
    ///
    /// # Examples
    ///
    /// ```
    /// use service_base::ResultEnvelope;
    ///
    /// let envelope = ResultEnvelope::success(42);
    /// assert_eq!(envelope.code(), 200);
    /// assert_eq!(envelope.data(), Some(&42));
    /// assert!(envelope.is_success());
    /// ```
    #[must_use]
    pub fn success(data: T) -> Self {
        Self::success_with_message(ErrorCode::SUCCESS.message(), data)
    }

    /// Success carrying `data` and a caller-supplied message.
    #[must_use]
    pub fn success_with_message(message: impl Into<String>, data: T) -> Self {
        Self {
            code: ErrorCode::SUCCESS.code(),
            message: non_empty(message.into(), ErrorCode::SUCCESS),
            data: Some(data),
        }
    }

    /// Success with no payload.
    #[must_use]
    pub fn success_empty() -> Self {
        Self {
            code: ErrorCode::SUCCESS.code(),
            message: ErrorCode::SUCCESS.message().to_string(),
            data: None,
        }
    }

    /// Failure with the code's default message.
    #[must_use]
    pub fn fail(error_code: ErrorCode) -> Self {
        Self::fail_with_message(error_code, error_code.message())
    }

    /// Failure with a message override.
    ///
    /// An empty override falls back to the code's default message.
    #[must_use]
    pub fn fail_with_message(error_code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code: error_code.code(),
            message: non_empty(message.into(), error_code),
            data: None,
        }
    }

    /// Numeric result code.
    #[must_use]
    pub const fn code(&self) -> i32 {
        self.code
    }

    /// Human-readable message; never empty for locally built envelopes.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Payload, present only on success.
    #[must_use]
    pub const fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }

    /// Consume the envelope and return its payload.
    #[must_use]
    pub fn into_data(self) -> Option<T> {
        self.data
    }

    /// Whether this envelope reports success.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.code == ErrorCode::SUCCESS.code()
    }

    /// Transform the payload, keeping code and message.
    #[must_use]
    pub fn map<U, F>(self, f: F) -> ResultEnvelope<U>
    where
        F: FnOnce(T) -> U,
    {
        ResultEnvelope {
            code: self.code,
            message: self.message,
            data: self.data.map(f),
        }
    }
}

fn non_empty(message: String, fallback: ErrorCode) -> String {
    if message.trim().is_empty() {
        fallback.message().to_string()
    } else {
        message
    }
}

impl<T: Serialize> IntoResponse for ResultEnvelope<T> {
    fn into_response(self) -> Response {
        let status = status_for_code(self.code);
        let mut response = (status, Json(self)).into_response();
        response.extensions_mut().insert(EnvelopeMarker);
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_success_defaults() {
        let envelope = ResultEnvelope::success("payload");
        assert_eq!(envelope.code(), 200);
        assert_eq!(envelope.message(), "操作成功");
        assert_eq!(envelope.data(), Some(&"payload"));
        assert!(envelope.is_success());
    }

    #[test]
    fn test_success_with_message() {
        let envelope = ResultEnvelope::success_with_message("用户服务运行正常", 1);
        assert_eq!(envelope.message(), "用户服务运行正常");
        assert_eq!(envelope.into_data(), Some(1));
    }

    #[test]
    fn test_fail_has_no_data() {
        let envelope: ResultEnvelope<String> = ResultEnvelope::fail(ErrorCode::NOT_FOUND);
        assert_eq!(envelope.code(), 404);
        assert_eq!(envelope.message(), "资源不存在");
        assert!(envelope.data().is_none());
        assert!(!envelope.is_success());
    }

    #[test]
    fn test_empty_override_falls_back_to_default() {
        let envelope: ResultEnvelope<()> = ResultEnvelope::fail_with_message(ErrorCode::PARAM_ERROR, "  ");
        assert_eq!(envelope.message(), "参数错误");
    }

    #[test]
    fn test_data_omitted_when_absent() {
        let envelope: ResultEnvelope<u32> = ResultEnvelope::fail(ErrorCode::PARAM_ERROR);
        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json, serde_json::json!({"code": 400, "message": "参数错误"}));

        let json = serde_json::to_value(ResultEnvelope::<u32>::success_empty()).unwrap();
        assert!(json.get("data").is_none());
    }

    #[test]
    fn test_decode_without_data() {
        let envelope: ResultEnvelope<u32> =
            serde_json::from_str(r#"{"code":404,"message":"资源不存在"}"#).unwrap();
        assert_eq!(envelope.code(), 404);
        assert!(envelope.data().is_none());
    }

    #[test]
    fn test_map_keeps_metadata() {
        let envelope = ResultEnvelope::success_with_message("done", 2).map(|n| n * 10);
        assert_eq!(envelope.message(), "done");
        assert_eq!(envelope.data(), Some(&20));
    }

    #[test]
    fn test_into_response_status_and_marker() {
        let response = ResultEnvelope::<()>::fail(ErrorCode::UNAUTHORIZED).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.extensions().get::<EnvelopeMarker>().is_some());

        let response = ResultEnvelope::success(1).into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
