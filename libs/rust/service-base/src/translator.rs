//! Exception-to-response translation at the request boundary.
//!
//! [`translate`] is the single classification function: it maps any
//! [`ServiceError`] to exactly one envelope and one transport status.
//! The [`boundary`] middleware attaches it to a router and also converts
//! bare framework error responses, so no failure leaves the service in a
//! raw form.

use std::any::Any;
use std::fmt::Write as _;
use std::sync::Arc;

use axum::Json;
use axum::extract::Request;
use axum::http::{HeaderMap, Method, StatusCode, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tracing::{Instrument, error, info_span, warn};
use uuid::Uuid;

use crate::error::{PersistenceError, RequestShapeError, ServiceError};
use crate::error_code::ErrorCode;
use crate::exception::BusinessException;
use crate::response::{EnvelopeMarker, ResultEnvelope};

/// Message returned for every unclassified failure.
pub const INTERNAL_ERROR_MESSAGE: &str = "系统异常，请联系管理员";

/// Failure families, in classification order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorFamily {
    /// Explicit [`BusinessException`].
    BusinessRule,
    /// Validation, binding or constraint failures on the input.
    ClientInput,
    /// Unsupported method or media type, missing parameter, bad body, no route, timeout.
    ClientRequestShape,
    /// Constraint, duplicate key or query failures in the database.
    Persistence,
    /// Everything else.
    Internal,
}

impl ErrorFamily {
    /// Stable label used in log fields.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::BusinessRule => "business_rule",
            Self::ClientInput => "client_input",
            Self::ClientRequestShape => "client_request_shape",
            Self::Persistence => "persistence",
            Self::Internal => "internal",
        }
    }
}

/// Outcome of translating one error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Translation {
    /// Family the error was classified into.
    pub family: ErrorFamily,
    /// Transport status to respond with.
    pub status: StatusCode,
    /// Envelope body; never carries data.
    pub body: ResultEnvelope<()>,
}

impl Translation {
    fn new(family: ErrorFamily, status: StatusCode, code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            family,
            status,
            body: ResultEnvelope::fail_with_message(code, message),
        }
    }

    /// Whether the caller is responsible for the failure.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        self.status.is_client_error()
            && !matches!(self.family, ErrorFamily::Persistence | ErrorFamily::Internal)
    }
}

/// Classify an error and build its envelope.
///
/// Pure and deterministic: translating the same error twice yields equal
/// results. Persistence and internal causes never reach the body.
#[must_use]
pub fn translate(error: &ServiceError) -> Translation {
    match error {
        ServiceError::Business(e) => Translation::new(
            ErrorFamily::BusinessRule,
            e.error_code().http_status(),
            e.error_code(),
            e.message(),
        ),
        ServiceError::Validation(violations) => Translation::new(
            ErrorFamily::ClientInput,
            StatusCode::BAD_REQUEST,
            ErrorCode::PARAM_ERROR,
            violations.joined_message(),
        ),
        ServiceError::RequestShape(shape) => translate_request_shape(shape),
        ServiceError::Persistence(persistence) => translate_persistence(persistence),
        ServiceError::Internal(_) => Translation::new(
            ErrorFamily::Internal,
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorCode::INTERNAL_ERROR,
            INTERNAL_ERROR_MESSAGE,
        ),
    }
}

fn translate_request_shape(shape: &RequestShapeError) -> Translation {
    let family = ErrorFamily::ClientRequestShape;
    match shape {
        RequestShapeError::MethodNotAllowed { .. } => Translation::new(
            family,
            StatusCode::METHOD_NOT_ALLOWED,
            ErrorCode::METHOD_NOT_ALLOWED,
            "请求方法不允许",
        ),
        RequestShapeError::UnsupportedMediaType { .. } => {
            Translation::new(family, StatusCode::BAD_REQUEST, ErrorCode::PARAM_ERROR, "请求格式不支持")
        }
        RequestShapeError::MissingParameter { name } => Translation::new(
            family,
            StatusCode::BAD_REQUEST,
            ErrorCode::PARAM_ERROR,
            format!("缺少必要参数: {name}"),
        ),
        RequestShapeError::BindingFailed { .. } => {
            Translation::new(family, StatusCode::BAD_REQUEST, ErrorCode::PARAM_ERROR, "参数绑定错误")
        }
        RequestShapeError::MalformedBody { .. } => {
            Translation::new(family, StatusCode::BAD_REQUEST, ErrorCode::PARAM_ERROR, "请求消息格式错误")
        }
        RequestShapeError::TypeMismatch { name, .. } => Translation::new(
            family,
            StatusCode::BAD_REQUEST,
            ErrorCode::PARAM_ERROR,
            format!("参数类型错误: {name}"),
        ),
        RequestShapeError::NoRoute { .. } => {
            Translation::new(family, StatusCode::NOT_FOUND, ErrorCode::NOT_FOUND, "接口不存在")
        }
        RequestShapeError::Timeout => Translation::new(
            family,
            StatusCode::REQUEST_TIMEOUT,
            ErrorCode::REQUEST_TIMEOUT,
            "请求超时",
        ),
    }
}

fn translate_persistence(persistence: &PersistenceError) -> Translation {
    let family = ErrorFamily::Persistence;
    match persistence {
        PersistenceError::ConstraintViolation(_) => Translation::new(
            family,
            StatusCode::BAD_REQUEST,
            ErrorCode::DATABASE_CONSTRAINT_VIOLATION,
            "数据完整性错误",
        ),
        PersistenceError::DuplicateKey(_) => Translation::new(
            family,
            StatusCode::BAD_REQUEST,
            ErrorCode::DATABASE_CONSTRAINT_VIOLATION,
            "数据重复错误",
        ),
        PersistenceError::QuerySyntax(_) => Translation::new(
            family,
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorCode::DATABASE_QUERY_ERROR,
            "数据库查询错误",
        ),
    }
}

/// Log a translated error at the severity of its family.
///
/// Client-attributable failures log at `warn`, everything else at `error`
/// with the full cause chain.
pub fn log_translation(error: &ServiceError, translation: &Translation, site: &str) {
    let family = translation.family.as_str();
    let code = translation.body.code();
    if translation.is_client_error() {
        warn!(
            site,
            family,
            code,
            status = translation.status.as_u16(),
            reason = translation.body.message(),
            "Request rejected"
        );
    } else {
        error!(
            site,
            family,
            code,
            status = translation.status.as_u16(),
            cause = %error_chain(error),
            "Request failed"
        );
    }
}

/// Render an error and all of its sources on one line.
pub(crate) fn error_chain(error: &(dyn std::error::Error + 'static)) -> String {
    let mut rendered = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        let _ = write!(rendered, ": {cause}");
        source = cause.source();
    }
    rendered
}

/// Response extension carrying the error a response was built from.
#[derive(Debug, Clone)]
pub struct TranslatedError(pub Arc<ServiceError>);

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let translation = translate(&self);
        let mut response = (translation.status, Json(translation.body)).into_response();
        response.extensions_mut().insert(EnvelopeMarker);
        response.extensions_mut().insert(TranslatedError(Arc::new(self)));
        response
    }
}

impl IntoResponse for BusinessException {
    fn into_response(self) -> Response {
        ServiceError::Business(self).into_response()
    }
}

/// Request-boundary middleware.
///
/// Logs every translated error with the request's call site and converts
/// error responses produced outside of handlers (unmatched methods,
/// timeouts, body limits) into envelopes.
pub async fn boundary(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let content_type = content_type(request.headers());
    let request_id = Uuid::new_v4();
    let site = format!("{method} {path}");

    let span = info_span!("request", %request_id, %method, %path);
    let response = next.run(request).instrument(span.clone()).await;
    let _entered = span.enter();

    if let Some(TranslatedError(error)) = response.extensions().get::<TranslatedError>() {
        log_translation(error, &translate(error), &site);
        return response;
    }
    if response.extensions().get::<EnvelopeMarker>().is_some() || !is_error_status(response.status()) {
        return response;
    }

    let error = classify_bare_status(response.status(), &method, &path, content_type);
    log_translation(&error, &translate(&error), &site);
    error.into_response()
}

fn is_error_status(status: StatusCode) -> bool {
    status.is_client_error() || status.is_server_error()
}

fn content_type(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(ToString::to_string)
}

/// Map a status produced by the framework or a tower layer to an error.
fn classify_bare_status(
    status: StatusCode,
    method: &Method,
    path: &str,
    content_type: Option<String>,
) -> ServiceError {
    let shape = match status {
        StatusCode::NOT_FOUND => RequestShapeError::NoRoute {
            method: method.to_string(),
            path: path.to_string(),
        },
        StatusCode::METHOD_NOT_ALLOWED => RequestShapeError::MethodNotAllowed {
            method: method.to_string(),
        },
        StatusCode::REQUEST_TIMEOUT => RequestShapeError::Timeout,
        StatusCode::UNSUPPORTED_MEDIA_TYPE => RequestShapeError::UnsupportedMediaType { content_type },
        StatusCode::PAYLOAD_TOO_LARGE | StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
            RequestShapeError::MalformedBody {
                reason: status.to_string(),
            }
        }
        StatusCode::UNAUTHORIZED => return ServiceError::business(ErrorCode::UNAUTHORIZED),
        StatusCode::FORBIDDEN => return ServiceError::business(ErrorCode::FORBIDDEN),
        StatusCode::TOO_MANY_REQUESTS => return ServiceError::business(ErrorCode::TOO_MANY_REQUESTS),
        s if s.is_client_error() => RequestShapeError::BindingFailed {
            reason: s.to_string(),
        },
        s => return ServiceError::internal(format!("inner layer responded with {s}")),
    };
    ServiceError::RequestShape(shape)
}

/// Handler for `tower_http::catch_panic::CatchPanicLayer::custom`.
///
/// A panicking handler is reported as an internal error.
#[must_use]
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic_message(panic.as_ref());
    ServiceError::internal(format!("handler panicked: {detail}")).into_response()
}

pub(crate) fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FieldViolation;

    #[test]
    fn test_business_keeps_message_override() {
        let err = ServiceError::Business(BusinessException::with_message(ErrorCode::CONFLICT, "用户名已存在"));
        let t = translate(&err);
        assert_eq!(t.family, ErrorFamily::BusinessRule);
        assert_eq!(t.status, StatusCode::CONFLICT);
        assert_eq!(t.body, ResultEnvelope::fail_with_message(ErrorCode::CONFLICT, "用户名已存在"));
    }

    #[test]
    fn test_business_internal_code_is_server_error() {
        let err = ServiceError::business(ErrorCode::INTERNAL_ERROR);
        let t = translate(&err);
        assert_eq!(t.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!t.is_client_error());
    }

    #[test]
    fn test_validation_joins_messages() {
        let err = ServiceError::validation(vec![
            FieldViolation::new("name", "名称不能为空"),
            FieldViolation::new("age", "年龄必须大于0"),
        ]);
        let t = translate(&err);
        assert_eq!(t.status, StatusCode::BAD_REQUEST);
        assert_eq!(t.body.code(), ErrorCode::PARAM_ERROR.code());
        assert_eq!(t.body.message(), "名称不能为空, 年龄必须大于0");
        assert!(t.is_client_error());
    }

    #[test]
    fn test_request_shape_statuses() {
        let cases = [
            (RequestShapeError::MethodNotAllowed { method: "PUT".into() }, StatusCode::METHOD_NOT_ALLOWED, 405),
            (RequestShapeError::NoRoute { method: "GET".into(), path: "/x".into() }, StatusCode::NOT_FOUND, 404),
            (RequestShapeError::Timeout, StatusCode::REQUEST_TIMEOUT, 408),
            (RequestShapeError::UnsupportedMediaType { content_type: None }, StatusCode::BAD_REQUEST, 400),
            (RequestShapeError::MalformedBody { reason: "eof".into() }, StatusCode::BAD_REQUEST, 400),
        ];
        for (shape, status, code) in cases {
            let t = translate(&ServiceError::RequestShape(shape));
            assert_eq!(t.status, status);
            assert_eq!(t.body.code(), code);
        }
    }

    #[test]
    fn test_parameter_messages_name_the_parameter() {
        let t = translate(&ServiceError::RequestShape(RequestShapeError::MissingParameter {
            name: "page".into(),
        }));
        assert_eq!(t.body.message(), "缺少必要参数: page");

        let t = translate(&ServiceError::RequestShape(RequestShapeError::TypeMismatch {
            name: "id".into(),
            value: Some("abc".into()),
        }));
        assert_eq!(t.body.message(), "参数类型错误: id");
    }

    #[test]
    fn test_persistence_hides_cause() {
        let cause = std::io::Error::other("Duplicate entry 'bob' for key 'users.username'");
        let err = ServiceError::Persistence(PersistenceError::DuplicateKey(Box::new(cause)));
        let t = translate(&err);
        assert_eq!(t.body.code(), ErrorCode::DATABASE_CONSTRAINT_VIOLATION.code());
        assert_eq!(t.body.message(), "数据重复错误");
        assert!(!t.body.message().contains("users.username"));
        assert!(!t.is_client_error());
    }

    #[test]
    fn test_internal_uses_generic_message() {
        let err = ServiceError::internal("connection reset by peer");
        let t = translate(&err);
        assert_eq!(t.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(t.body.code(), 500);
        assert_eq!(t.body.message(), INTERNAL_ERROR_MESSAGE);
    }

    #[test]
    fn test_error_chain_includes_sources() {
        let err = BusinessException::with_source(
            ErrorCode::INTERNAL_ERROR,
            "服务异常",
            std::io::Error::other("socket closed"),
        );
        assert_eq!(error_chain(&err), "服务异常: socket closed");
    }

    #[test]
    fn test_classify_bare_status() {
        let method = Method::DELETE;
        let err = classify_bare_status(StatusCode::METHOD_NOT_ALLOWED, &method, "/users", None);
        assert!(matches!(err, ServiceError::RequestShape(RequestShapeError::MethodNotAllowed { .. })));

        let err = classify_bare_status(StatusCode::UNAUTHORIZED, &method, "/users", None);
        assert_eq!(translate(&err).body.code(), 401);

        let err = classify_bare_status(StatusCode::BAD_GATEWAY, &method, "/users", None);
        assert!(matches!(err, ServiceError::Internal(_)));
    }

    #[test]
    fn test_panic_message_payloads() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "boom");
        let payload: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(payload.as_ref()), "bang");
        let payload: Box<dyn Any + Send> = Box::new(7_u8);
        assert_eq!(panic_message(payload.as_ref()), "unknown panic payload");
    }
}
