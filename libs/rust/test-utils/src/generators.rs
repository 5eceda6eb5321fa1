//! Shared proptest generators.

use proptest::prelude::*;
use service_base::{BusinessException, ErrorCode, FieldViolation, RequestShapeError, ServiceError};

/// Any registered error code.
pub fn error_code_strategy() -> impl Strategy<Value = ErrorCode> {
    proptest::sample::select(ErrorCode::ALL.to_vec())
}

/// Registered error codes other than `SUCCESS`.
pub fn failure_code_strategy() -> impl Strategy<Value = ErrorCode> {
    error_code_strategy().prop_filter("failure codes only", |code| *code != ErrorCode::SUCCESS)
}

/// Non-empty user-facing messages, mixing ASCII and CJK text.
pub fn message_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-zA-Z][a-zA-Z0-9 ]{0,40}",
        "[\u{4e00}-\u{9fa5}]{1,20}",
    ]
}

/// Dotted field paths such as `address.city` or `tags[2]`.
pub fn field_path_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-z][a-zA-Z]{0,12}",
        ("[a-z][a-zA-Z]{0,8}", "[a-z][a-zA-Z]{0,8}").prop_map(|(a, b)| format!("{a}.{b}")),
        ("[a-z][a-zA-Z]{0,8}", 0usize..10).prop_map(|(a, i)| format!("{a}[{i}]")),
    ]
}

/// One field violation.
pub fn field_violation_strategy() -> impl Strategy<Value = FieldViolation> {
    (field_path_strategy(), message_strategy()).prop_map(|(field, message)| FieldViolation::new(field, message))
}

/// Between one and `max` field violations.
pub fn field_violations_strategy(max: usize) -> impl Strategy<Value = Vec<FieldViolation>> {
    prop::collection::vec(field_violation_strategy(), 1..=max.max(1))
}

/// A business exception with an overridden message.
pub fn business_exception_strategy() -> impl Strategy<Value = (ErrorCode, String)> {
    (failure_code_strategy(), message_strategy())
}

/// Request-shape failures of every kind.
pub fn request_shape_strategy() -> impl Strategy<Value = RequestShapeError> {
    let name = "[a-z][a-zA-Z]{0,10}";
    prop_oneof![
        Just(RequestShapeError::MethodNotAllowed {
            method: "PATCH".to_string()
        }),
        Just(RequestShapeError::UnsupportedMediaType {
            content_type: Some("text/plain".to_string())
        }),
        name.prop_map(|name| RequestShapeError::MissingParameter { name }),
        message_strategy().prop_map(|reason| RequestShapeError::BindingFailed { reason }),
        message_strategy().prop_map(|reason| RequestShapeError::MalformedBody { reason }),
        (name, proptest::option::of("[a-z0-9]{1,8}"))
            .prop_map(|(name, value)| RequestShapeError::TypeMismatch { name, value }),
        "/[a-z]{1,10}".prop_map(|path| RequestShapeError::NoRoute {
            method: "GET".to_string(),
            path
        }),
        Just(RequestShapeError::Timeout),
    ]
}

/// Blueprint for a [`ServiceError`]; `ServiceError` itself is not `Clone`.
#[derive(Debug, Clone)]
pub enum ServiceErrorCase {
    /// A business failure
    Business(ErrorCode, String),
    /// A validation failure
    Validation(Vec<FieldViolation>),
    /// A request-shape failure
    RequestShape(RequestShapeError),
    /// An unclassified failure with an arbitrary message
    Internal(String),
}

impl ServiceErrorCase {
    /// Build the error this case describes.
    #[must_use]
    pub fn build(&self) -> ServiceError {
        match self {
            Self::Business(code, message) => BusinessException::with_message(*code, message.clone()).into(),
            Self::Validation(violations) => ServiceError::validation(violations.clone()),
            Self::RequestShape(shape) => shape.clone().into(),
            Self::Internal(message) => ServiceError::internal(message.clone()),
        }
    }
}

/// Any service error, as a rebuildable blueprint.
pub fn service_error_case_strategy() -> impl Strategy<Value = ServiceErrorCase> {
    prop_oneof![
        business_exception_strategy().prop_map(|(code, message)| ServiceErrorCase::Business(code, message)),
        field_violations_strategy(5).prop_map(ServiceErrorCase::Validation),
        request_shape_strategy().prop_map(ServiceErrorCase::RequestShape),
        "[ -~]{0,80}".prop_map(ServiceErrorCase::Internal),
    ]
}

/// Generate valid service names.
pub fn service_name_strategy() -> impl Strategy<Value = String> {
    "(service|core|third-party)-[a-z][a-z0-9]{2,20}"
}

/// Generate semver-like versions.
pub fn version_strategy() -> impl Strategy<Value = String> {
    (0u32..10, 0u32..20, 0u32..50).prop_map(|(major, minor, patch)| format!("{major}.{minor}.{patch}"))
}
