//! Request extractors whose rejections are [`ServiceError`]s.
//!
//! Use these instead of the plain axum extractors so that decoding and
//! validation failures get the same envelope as every other failure.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts, Json, Path, Query, RawPathParams, Request};
use axum::http::request::Parts;
use axum::http::header;
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::error::{RequestShapeError, ServiceError};

/// JSON body that is deserialized and then validated.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request(request: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = request
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(ToString::to_string);
        let Json(value) = Json::<T>::from_request(request, state)
            .await
            .map_err(|rejection| json_rejection(rejection, content_type))?;
        value.validate()?;
        Ok(Self(value))
    }
}

/// Query string that is deserialized and then validated.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for ValidQuery<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(query_rejection)?;
        value.validate()?;
        Ok(Self(value))
    }
}

/// Path parameters with type errors reported per parameter.
#[derive(Debug, Clone, Copy, Default)]
pub struct PathParams<T>(pub T);

impl<T, S> FromRequestParts<S> for PathParams<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Path::<T>::from_request_parts(parts, state).await {
            Ok(Path(value)) => Ok(Self(value)),
            Err(rejection) => {
                // A single-value path reports no key; fall back to the route's only parameter.
                let first_key = RawPathParams::from_request_parts(parts, state)
                    .await
                    .ok()
                    .and_then(|raw| raw.iter().next().map(|(key, _)| key.to_string()));
                Err(path_rejection(rejection, first_key))
            }
        }
    }
}

fn json_rejection(rejection: JsonRejection, content_type: Option<String>) -> ServiceError {
    let shape = match rejection {
        JsonRejection::MissingJsonContentType(_) => RequestShapeError::UnsupportedMediaType { content_type },
        other => RequestShapeError::MalformedBody {
            reason: other.body_text(),
        },
    };
    shape.into()
}

fn query_rejection(rejection: QueryRejection) -> ServiceError {
    let reason = rejection.body_text();
    let shape = match missing_field(&reason) {
        Some(name) => RequestShapeError::MissingParameter { name },
        None => RequestShapeError::BindingFailed { reason },
    };
    shape.into()
}

fn path_rejection(rejection: PathRejection, first_key: Option<String>) -> ServiceError {
    use axum::extract::path::ErrorKind;

    let shape = match rejection {
        PathRejection::FailedToDeserializePathParams(inner) => match inner.into_kind() {
            ErrorKind::ParseErrorAtKey { key, value, .. } | ErrorKind::DeserializeError { key, value, .. } => {
                RequestShapeError::TypeMismatch {
                    name: key,
                    value: Some(value),
                }
            }
            ErrorKind::ParseErrorAtIndex { index, value, .. } => RequestShapeError::TypeMismatch {
                name: format!("#{index}"),
                value: Some(value),
            },
            ErrorKind::ParseError { value, .. } => RequestShapeError::TypeMismatch {
                name: first_key.unwrap_or_else(|| "path".to_string()),
                value: Some(value),
            },
            other => RequestShapeError::BindingFailed {
                reason: other.to_string(),
            },
        },
        other => RequestShapeError::BindingFailed {
            reason: other.body_text(),
        },
    };
    shape.into()
}

/// Extract `name` from serde's "missing field `name`" message.
fn missing_field(message: &str) -> Option<String> {
    let rest = message.split("missing field `").nth(1)?;
    let name = rest.split('`').next()?;
    (!name.is_empty()).then(|| name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_field_parsing() {
        assert_eq!(
            missing_field("Failed to deserialize query string: missing field `page`"),
            Some("page".to_string())
        );
        assert_eq!(missing_field("invalid digit found in string"), None);
        assert_eq!(missing_field("missing field ``"), None);
    }
}
