//! Service-layer interception.
//!
//! Wrap a service operation with [`guard`] (async) or [`guard_sync`] so that
//! any failure leaves the service as a [`BusinessException`]: business
//! failures pass through unchanged, everything else (including panics) is
//! logged and re-raised as [`ErrorCode::INTERNAL_ERROR`].

use std::future::Future;
use std::panic::{AssertUnwindSafe, catch_unwind};

use futures::FutureExt;
use tracing::{error, warn};

use crate::error::ServiceError;
use crate::error_code::ErrorCode;
use crate::exception::BusinessException;
use crate::translator::{error_chain, panic_message};

/// Message attached to service failures that were not business failures.
pub const SERVICE_ERROR_MESSAGE: &str = "服务异常，请稍后重试";

/// Run an async service operation and normalize its failure.
///
/// `site` names the operation in logs, e.g. `"UserService::create"`.
///
/// # Errors
///
/// Returns the operation's [`BusinessException`] unchanged, or a new
/// `INTERNAL_ERROR` exception wrapping any other failure or panic.
///
/// # Examples
///
/// ```
/// use service_base::{ErrorCode, ServiceError, service_layer};
///
/// let rt = tokio::runtime::Runtime::new().unwrap();
/// let result: Result<u32, _> = rt.block_on(service_layer::guard("Demo::run", async {
///     Err::<u32, ServiceError>(ServiceError::internal("socket closed"))
/// }));
/// assert_eq!(result.unwrap_err().error_code(), ErrorCode::INTERNAL_ERROR);
/// ```
pub async fn guard<T, E, F>(site: &str, operation: F) -> Result<T, BusinessException>
where
    F: Future<Output = Result<T, E>>,
    E: Into<ServiceError>,
{
    match AssertUnwindSafe(operation).catch_unwind().await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => Err(normalize(site, err.into())),
        Err(panic) => Err(normalize_panic(site, &panic_message(panic.as_ref()))),
    }
}

/// Synchronous counterpart of [`guard`].
///
/// # Errors
///
/// Same contract as [`guard`].
pub fn guard_sync<T, E, F>(site: &str, operation: F) -> Result<T, BusinessException>
where
    F: FnOnce() -> Result<T, E>,
    E: Into<ServiceError>,
{
    match catch_unwind(AssertUnwindSafe(operation)) {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => Err(normalize(site, err.into())),
        Err(panic) => Err(normalize_panic(site, &panic_message(panic.as_ref()))),
    }
}

fn normalize(site: &str, err: ServiceError) -> BusinessException {
    match err {
        ServiceError::Business(business) => {
            warn!(
                site,
                code = business.error_code().code(),
                reason = business.message(),
                "Service business failure"
            );
            business
        }
        other => {
            error!(site, cause = %error_chain(&other), "Service failure");
            BusinessException::with_source(ErrorCode::INTERNAL_ERROR, SERVICE_ERROR_MESSAGE, other)
        }
    }
}

fn normalize_panic(site: &str, detail: &str) -> BusinessException {
    error!(site, panic = detail, "Service panicked");
    BusinessException::with_source(
        ErrorCode::INTERNAL_ERROR,
        SERVICE_ERROR_MESSAGE,
        ServiceError::internal(format!("panic: {detail}")),
    )
}
