//! Router assembly and the serve loop with graceful shutdown.

use std::future::{Future, IntoFuture};
use std::io;
use std::pin::pin;
use std::time::Duration;

use axum::Router;
use axum::http::{Method, StatusCode, Uri};
use axum::middleware;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::watch;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::config::AppConfig;
use crate::error::{RequestShapeError, ServiceError};
use crate::translator::{boundary, panic_response};

/// Wrap service routes with the health endpoint and the request boundary.
///
/// Layers, innermost first: request timeout, panic capture, error
/// boundary, request tracing, CORS.
pub fn build_router(config: &AppConfig, routes: Router) -> Router {
    routes
        .merge(config.health_endpoint().router())
        .fallback(no_route)
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            config.request_timeout(),
        ))
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(middleware::from_fn(boundary))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

async fn no_route(method: Method, uri: Uri) -> ServiceError {
    RequestShapeError::NoRoute {
        method: method.to_string(),
        path: uri.path().to_string(),
    }
    .into()
}

/// Bind to the configured address and serve until SIGINT or SIGTERM.
///
/// # Errors
///
/// Returns an error if the address cannot be bound or the server fails.
pub async fn serve(router: Router, config: &AppConfig) -> io::Result<()> {
    let listener = TcpListener::bind(config.bind_addr()).await?;
    info!(
        service = %config.service_name,
        version = %config.service_version,
        addr = %listener.local_addr()?,
        "Service listening"
    );
    serve_with_shutdown(listener, router, wait_for_signal(), config.shutdown_timeout()).await
}

/// Serve on `listener` until `shutdown` resolves, then drain in-flight
/// requests for at most `drain_timeout`.
///
/// # Errors
///
/// Returns an error if the server fails.
pub async fn serve_with_shutdown<S>(
    listener: TcpListener,
    router: Router,
    shutdown: S,
    drain_timeout: Duration,
) -> io::Result<()>
where
    S: Future<Output = ()> + Send,
{
    let (stop_tx, mut stop_rx) = watch::channel(false);
    let server = axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            let _ = stop_rx.wait_for(|stopped| *stopped).await;
        })
        .into_future();
    let mut server = pin!(server);

    tokio::select! {
        result = &mut server => return result,
        () = shutdown => {
            info!("Shutdown signal received, draining connections");
            let _ = stop_tx.send(true);
        }
    }

    if let Ok(result) = tokio::time::timeout(drain_timeout, server).await {
        info!("Shutdown complete");
        result
    } else {
        warn!(timeout_secs = drain_timeout.as_secs(), "Shutdown timeout reached, dropping connections");
        Ok(())
    }
}

/// Waits for SIGTERM or SIGINT.
pub async fn wait_for_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!(error = %err, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                error!(error = %err, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl+C, initiating shutdown"),
        () = terminate => info!("Received SIGTERM, initiating shutdown"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::routing::get;

    #[tokio::test]
    async fn test_serve_stops_on_shutdown() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let router = Router::new().route("/", get(|| async { "ok" }));
        let result = serve_with_shutdown(listener, router, async {}, Duration::from_secs(1)).await;
        assert!(result.is_ok());
    }
}
