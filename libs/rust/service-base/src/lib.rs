//! Shared base library for platform microservices.
//!
//! This crate provides centralized implementations for:
//! - The error-code registry, result envelope and business exception
//! - A closed error taxonomy and its translation into envelopes
//! - Service-layer failure normalization
//! - Validated request extractors
//! - The liveness endpoint
//! - Outbound HTTP and inter-service RPC clients
//! - Pagination and audit timestamps
//! - Environment configuration, logging and server bootstrap

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod error_code;
pub mod exception;
pub mod extract;
pub mod health;
pub mod http;
pub mod persistence;
pub mod response;
pub mod rpc;
pub mod server;
pub mod service_layer;
pub mod telemetry;
pub mod translator;

pub use config::{AppConfig, ConfigError};
pub use error::{FieldViolation, FieldViolations, PersistenceError, RequestShapeError, ServiceError};
pub use error_code::ErrorCode;
pub use exception::BusinessException;
pub use extract::{PathParams, ValidJson, ValidQuery};
pub use health::{HealthEndpoint, HealthResponse, ServiceInfo};
pub use http::{HttpClientError, HttpConfig, HttpManager, build_http_client};
pub use response::ResultEnvelope;
pub use rpc::{RpcClient, RpcConfig, RpcError};
pub use telemetry::{TracingConfig, init_tracing};
pub use translator::{ErrorFamily, Translation, translate};
