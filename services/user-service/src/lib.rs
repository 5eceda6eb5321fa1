//! Reference user service.
//!
//! A small CRUD service wired entirely from `service-base`: configuration,
//! the request boundary, validated extractors, the service-layer guard,
//! pagination and audit timestamps.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod domain;
pub mod handlers;
pub mod repository;
pub mod service;

use std::sync::Arc;

use axum::Router;
use service_base::AppConfig;
use service_base::server::build_router;

use crate::repository::InMemoryUserRepository;
use crate::service::UserService;

/// Assemble the full application router.
pub fn app(config: &AppConfig) -> Router {
    let service = UserService::new(Arc::new(InMemoryUserRepository::default()));
    build_router(config, handlers::routes(service))
}
