//! # Rally SDK
//!
//! A typed client for the Rally Web Services API (WSAPI v2.0), used by the
//! bridge to create, read, update, delete, and query work-tracking
//! artifacts.
//!
//! This crate provides:
//!
//! - `RallyConfig` and an environment-backed configuration provider
//! - `RallyClient` with per-artifact CRUD and query operations
//! - WSAPI result envelopes with `Errors`/`Warnings` handling
//! - A Rally query-expression builder
//! - Conversion of HTTP and transport failures into the classifier's
//!   raw-failure shape
//! - Process-wide request metrics

pub mod artifacts;
pub mod client;
pub mod config;
pub mod error;
pub mod metrics;

#[cfg(test)]
mod tests;

pub use artifacts::{ArtifactType, QueryResultPage, QuerySpec};
pub use client::RallyClient;
pub use config::{ConfigProvider, ConfigProviderExt, EnvConfigProvider, RallyConfig};
pub use error::{RallyError, Result};
