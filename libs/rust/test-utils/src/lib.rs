//! Shared test utilities for service-base and the services built on it.
//!
//! This crate provides:
//! - Proptest generators for error codes, violations and envelopes
//! - A probe for fire-and-forget completion handlers
//! - Test fixtures with sample requests and configuration

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod mocks;

pub use generators::*;
