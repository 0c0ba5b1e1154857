//! # Taxonomy Types
//!
//! The closed category set, the severity ordinal, and the recovery-strategy
//! recommendation attached to every classified failure.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The severity level of a classified failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Routine failure, expected in normal operation
    Low,
    /// Degrades one operation but the session continues
    Medium,
    /// Repeated occurrences threaten the session
    High,
    /// Requires operator attention before the bridge is usable
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        };
        write!(f, "{label}")
    }
}

/// The closed failure taxonomy. Every raw failure maps to exactly one
/// variant; the set is flat and exhaustively matched wherever categories
/// carry data, so extending it is a compile-checked change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorCategory {
    Validation,
    SchemaValidation,
    Authentication,
    Permission,
    NotFound,
    ResourceConflict,
    RateLimit,
    ServiceUnavailable,
    Timeout,
    Network,
    SslCertificate,
    Configuration,
    Protocol,
    Serialization,
    DataTransformation,
    Internal,
    Unexpected,
}

impl ErrorCategory {
    /// All categories, in taxonomy order. Used for counter snapshots.
    pub const ALL: [ErrorCategory; 17] = [
        ErrorCategory::Validation,
        ErrorCategory::SchemaValidation,
        ErrorCategory::Authentication,
        ErrorCategory::Permission,
        ErrorCategory::NotFound,
        ErrorCategory::ResourceConflict,
        ErrorCategory::RateLimit,
        ErrorCategory::ServiceUnavailable,
        ErrorCategory::Timeout,
        ErrorCategory::Network,
        ErrorCategory::SslCertificate,
        ErrorCategory::Configuration,
        ErrorCategory::Protocol,
        ErrorCategory::Serialization,
        ErrorCategory::DataTransformation,
        ErrorCategory::Internal,
        ErrorCategory::Unexpected,
    ];

    /// The category's wire name (kebab-case, matching serde output).
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Validation => "validation",
            ErrorCategory::SchemaValidation => "schema-validation",
            ErrorCategory::Authentication => "authentication",
            ErrorCategory::Permission => "permission",
            ErrorCategory::NotFound => "not-found",
            ErrorCategory::ResourceConflict => "resource-conflict",
            ErrorCategory::RateLimit => "rate-limit",
            ErrorCategory::ServiceUnavailable => "service-unavailable",
            ErrorCategory::Timeout => "timeout",
            ErrorCategory::Network => "network",
            ErrorCategory::SslCertificate => "ssl-certificate",
            ErrorCategory::Configuration => "configuration",
            ErrorCategory::Protocol => "protocol",
            ErrorCategory::Serialization => "serialization",
            ErrorCategory::DataTransformation => "data-transformation",
            ErrorCategory::Internal => "internal",
            ErrorCategory::Unexpected => "unexpected",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Declarative recommendation for how the caller should respond to a
/// classified failure. The classifier never executes any of these; the
/// orchestration layer decides whether to honor them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "kebab-case")]
pub enum RecoveryStrategy {
    /// Retry right away, up to `max_attempts` additional attempts.
    RetryImmediate { max_attempts: u32 },
    /// Retry with exponential backoff.
    RetryWithBackoff {
        max_attempts: u32,
        base_delay_ms: u64,
        multiplier: f64,
    },
    /// Stop calling the remote after repeated failures; let it recover.
    CircuitBreaker {
        failure_threshold: u32,
        reset_timeout_ms: u64,
    },
    /// Do not retry; surface the failure immediately.
    FailFast,
    /// No automatic recovery is possible; an operator must act.
    RequireIntervention,
    /// Continue with a reduced result rather than failing the operation.
    DegradeGracefully,
}

impl RecoveryStrategy {
    /// True if the recommendation permits another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            RecoveryStrategy::RetryImmediate { .. } | RecoveryStrategy::RetryWithBackoff { .. }
        )
    }
}
