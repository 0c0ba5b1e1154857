//! # Failure Classification
//!
//! Normalizes the heterogeneous failures the bridge encounters (HTTP
//! responses, transport-level breakage, language-level exceptions, and
//! arbitrary non-error values) onto a closed taxonomy with per-category
//! severity, recovery recommendation, and a fixed user-facing message.
//!
//! ## Features
//!
//! - Closed category taxonomy with compile-time exhaustiveness
//! - Declarative status-code and network-pattern mapping tables
//! - Fixed, non-leaking message templates per category
//! - Correlation IDs threading one logical operation across retries
//! - Per-category counters and a bounded diagnostic history
//!
//! Classification never fails: [`ErrorClassifier::classify`] always returns
//! a [`DiagnosticRecord`], degrading to the `unexpected` category for input
//! no rule recognizes. The classifier recommends recovery; it never retries
//! anything itself.

pub mod category;
pub mod classify;
pub mod context;
pub mod failure;
pub mod profile;
pub mod record;

pub use category::{ErrorCategory, RecoveryStrategy, Severity};
pub use classify::{ClassifierState, ErrorClassifier};
pub use context::{new_correlation_id, OperationContext};
pub use failure::RawFailure;
pub use profile::{profile, CategoryProfile};
pub use record::{DiagnosticContext, DiagnosticRecord, Resolution};
