//! Closed error taxonomy for request handling.
//!
//! Every failure that can reach a request boundary is one of the five
//! [`ServiceError`] families. Fallible handlers and services return
//! `Result<T, ServiceError>`; the translator maps each family to an
//! envelope. [`ServiceError::Internal`] is the required catch-all.

use std::error::Error as StdError;
use std::fmt;

use thiserror::Error;
use validator::{ValidationError, ValidationErrors, ValidationErrorsKind};

use crate::error_code::ErrorCode;
use crate::exception::BusinessException;

type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Any failure that may escape a request-handling boundary.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Explicit business rule violation.
    #[error(transparent)]
    Business(#[from] BusinessException),

    /// Input validation, binding or constraint failures.
    #[error("Validation failed: {0}")]
    Validation(FieldViolations),

    /// Request could not be matched or decoded.
    #[error(transparent)]
    RequestShape(#[from] RequestShapeError),

    /// Database constraint, duplicate key or query failure.
    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    /// Anything else. Details are logged, never returned.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ServiceError {
    /// Create a business failure with the code's default message.
    #[must_use]
    pub fn business(error_code: ErrorCode) -> Self {
        Self::Business(BusinessException::new(error_code))
    }

    /// Create a validation failure from field violations.
    #[must_use]
    pub fn validation(violations: impl IntoIterator<Item = FieldViolation>) -> Self {
        Self::Validation(violations.into_iter().collect())
    }

    /// Create an internal failure from a message.
    #[must_use]
    pub fn internal(message: impl fmt::Display + fmt::Debug + Send + Sync + 'static) -> Self {
        Self::Internal(anyhow::Error::msg(message))
    }
}

/// One field-level validation message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    /// Dotted path of the offending field, e.g. `address.city` or `tags[1]`.
    pub field: String,
    /// Human-readable message.
    pub message: String,
}

impl FieldViolation {
    /// Create a field violation.
    #[must_use]
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Ordered collection of field violations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldViolations(Vec<FieldViolation>);

impl FieldViolations {
    /// Violations in the order the validation layer produced them.
    #[must_use]
    pub fn as_slice(&self) -> &[FieldViolation] {
        &self.0
    }

    /// Number of violations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no violations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Messages joined with `", "`.
    #[must_use]
    pub fn joined_message(&self) -> String {
        self.0
            .iter()
            .map(|violation| violation.message.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for FieldViolations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.joined_message())
    }
}

impl FromIterator<FieldViolation> for FieldViolations {
    fn from_iter<I: IntoIterator<Item = FieldViolation>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl From<ValidationErrors> for FieldViolations {
    /// Flatten nested struct and list errors. Fields are ordered by path;
    /// messages of one field keep their declaration order.
    fn from(errors: ValidationErrors) -> Self {
        let mut out = Vec::new();
        flatten_validation_errors("", &errors, &mut out);
        Self(out)
    }
}

impl From<ValidationErrors> for ServiceError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(errors.into())
    }
}

fn flatten_validation_errors(prefix: &str, errors: &ValidationErrors, out: &mut Vec<FieldViolation>) {
    let mut entries: Vec<_> = errors.errors().iter().collect();
    entries.sort_by(|(a, _), (b, _)| a.cmp(b));

    for (field, kind) in entries {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{prefix}.{field}")
        };
        match kind {
            ValidationErrorsKind::Field(list) => {
                out.extend(list.iter().map(|error| {
                    FieldViolation::new(path.clone(), violation_message(&path, error))
                }));
            }
            ValidationErrorsKind::Struct(nested) => flatten_validation_errors(&path, nested, out),
            ValidationErrorsKind::List(items) => {
                for (index, nested) in items {
                    flatten_validation_errors(&format!("{path}[{index}]"), nested, out);
                }
            }
        }
    }
}

fn violation_message(path: &str, error: &ValidationError) -> String {
    error
        .message
        .as_ref()
        .map_or_else(|| format!("{path}: {}", error.code), ToString::to_string)
}

/// The request could not be routed or decoded.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RequestShapeError {
    /// Route exists but not for this method.
    #[error("Method {method} not allowed")]
    MethodNotAllowed {
        /// Request method
        method: String,
    },

    /// Body content type is not supported.
    #[error("Unsupported media type: {content_type:?}")]
    UnsupportedMediaType {
        /// Content type sent by the caller, if any
        content_type: Option<String>,
    },

    /// A required query or form parameter is missing.
    #[error("Missing parameter: {name}")]
    MissingParameter {
        /// Parameter name
        name: String,
    },

    /// Parameters could not be bound to the handler input.
    #[error("Binding failed: {reason}")]
    BindingFailed {
        /// Decoder message
        reason: String,
    },

    /// Body could not be read or parsed.
    #[error("Malformed body: {reason}")]
    MalformedBody {
        /// Decoder message
        reason: String,
    },

    /// A parameter had the wrong type.
    #[error("Type mismatch for {name}: {value:?}")]
    TypeMismatch {
        /// Parameter name
        name: String,
        /// Raw value, if known
        value: Option<String>,
    },

    /// No route matches the request.
    #[error("No route for {method} {path}")]
    NoRoute {
        /// Request method
        method: String,
        /// Request path
        path: String,
    },

    /// Request exceeded its processing deadline.
    #[error("Request timed out")]
    Timeout,
}

/// A database-level failure. The cause is for logs only.
#[derive(Error, Debug)]
pub enum PersistenceError {
    /// Foreign key, not-null or check constraint violated.
    #[error("Constraint violation: {0}")]
    ConstraintViolation(#[source] BoxError),

    /// Unique key violated.
    #[error("Duplicate key: {0}")]
    DuplicateKey(#[source] BoxError),

    /// Statement rejected by the database (syntax, unknown column or table).
    #[error("Query error: {0}")]
    QuerySyntax(#[source] BoxError),
}

impl From<sqlx::Error> for ServiceError {
    fn from(err: sqlx::Error) -> Self {
        if matches!(err, sqlx::Error::RowNotFound) {
            return Self::Business(BusinessException::with_source(
                ErrorCode::NOT_FOUND,
                ErrorCode::NOT_FOUND.message(),
                err,
            ));
        }
        match persistence_kind(&err) {
            Some(kind) => Self::Persistence(kind(Box::new(err))),
            None => Self::Internal(anyhow::Error::new(err)),
        }
    }
}

fn persistence_kind(err: &sqlx::Error) -> Option<fn(BoxError) -> PersistenceError> {
    use sqlx::error::ErrorKind;

    let sqlx::Error::Database(db) = err else {
        return None;
    };
    match db.kind() {
        ErrorKind::UniqueViolation => Some(PersistenceError::DuplicateKey),
        ErrorKind::ForeignKeyViolation | ErrorKind::NotNullViolation | ErrorKind::CheckViolation => {
            Some(PersistenceError::ConstraintViolation)
        }
        // SQLSTATE class 42: syntax error or access rule violation
        _ if db.code().is_some_and(|code| code.starts_with("42")) => {
            Some(PersistenceError::QuerySyntax)
        }
        _ => None,
    }
}
