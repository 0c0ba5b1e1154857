//! # Category Profiles
//!
//! The per-category defaults: severity, recovery recommendation, and the
//! fixed user-facing message template. Raw provider text never reaches the
//! template; it travels only in a record's `details` and
//! `source_error_code` fields, which are operator-facing.

use crate::category::{ErrorCategory, RecoveryStrategy, Severity};

/// Static defaults for one category.
#[derive(Debug, Clone, Copy)]
pub struct CategoryProfile {
    pub severity: Severity,
    pub strategy: RecoveryStrategy,
    pub template: &'static str,
}

/// Look up the defaults for `category`.
///
/// An exhaustive match rather than a runtime map: adding a category without
/// a profile is a compile error.
pub fn profile(category: ErrorCategory) -> CategoryProfile {
    match category {
        ErrorCategory::Validation => CategoryProfile {
            severity: Severity::Medium,
            strategy: RecoveryStrategy::FailFast,
            template: "The tracking service rejected the request as invalid. Check the provided field values.",
        },
        ErrorCategory::SchemaValidation => CategoryProfile {
            severity: Severity::Medium,
            strategy: RecoveryStrategy::FailFast,
            template: "The request did not match the expected input schema.",
        },
        ErrorCategory::Authentication => CategoryProfile {
            severity: Severity::Critical,
            strategy: RecoveryStrategy::RequireIntervention,
            template: "Authentication failed. Please check your API credentials.",
        },
        ErrorCategory::Permission => CategoryProfile {
            severity: Severity::High,
            strategy: RecoveryStrategy::RequireIntervention,
            template: "You do not have permission to perform this operation.",
        },
        ErrorCategory::NotFound => CategoryProfile {
            severity: Severity::Low,
            strategy: RecoveryStrategy::FailFast,
            template: "The requested artifact could not be found.",
        },
        ErrorCategory::ResourceConflict => CategoryProfile {
            severity: Severity::Medium,
            strategy: RecoveryStrategy::RetryImmediate { max_attempts: 2 },
            template: "The artifact was modified concurrently. Refresh it and retry the operation.",
        },
        ErrorCategory::RateLimit => CategoryProfile {
            severity: Severity::Medium,
            strategy: RecoveryStrategy::RetryWithBackoff {
                max_attempts: 3,
                base_delay_ms: 2000,
                multiplier: 2.0,
            },
            template: "Too many requests. Please slow down and try again.",
        },
        ErrorCategory::ServiceUnavailable => CategoryProfile {
            severity: Severity::High,
            strategy: RecoveryStrategy::RetryWithBackoff {
                max_attempts: 3,
                base_delay_ms: 1000,
                multiplier: 2.0,
            },
            template: "The tracking service is temporarily unavailable. Please try again later.",
        },
        ErrorCategory::Timeout => CategoryProfile {
            severity: Severity::Medium,
            strategy: RecoveryStrategy::RetryWithBackoff {
                max_attempts: 3,
                base_delay_ms: 1000,
                multiplier: 2.0,
            },
            template: "The operation timed out. Please try again later.",
        },
        ErrorCategory::Network => CategoryProfile {
            severity: Severity::High,
            strategy: RecoveryStrategy::RetryImmediate { max_attempts: 2 },
            template: "A network problem prevented the request from completing.",
        },
        ErrorCategory::SslCertificate => CategoryProfile {
            severity: Severity::Critical,
            strategy: RecoveryStrategy::RequireIntervention,
            template: "The secure connection to the tracking service could not be verified.",
        },
        ErrorCategory::Configuration => CategoryProfile {
            severity: Severity::Critical,
            strategy: RecoveryStrategy::RequireIntervention,
            template: "The bridge is misconfigured. Review the server configuration.",
        },
        ErrorCategory::Protocol => CategoryProfile {
            severity: Severity::Medium,
            strategy: RecoveryStrategy::FailFast,
            template: "The tracking service rejected the request.",
        },
        ErrorCategory::Serialization => CategoryProfile {
            severity: Severity::Medium,
            strategy: RecoveryStrategy::DegradeGracefully,
            template: "The response from the tracking service could not be parsed.",
        },
        ErrorCategory::DataTransformation => CategoryProfile {
            severity: Severity::Medium,
            strategy: RecoveryStrategy::FailFast,
            template: "The record could not be converted between naming conventions.",
        },
        ErrorCategory::Internal => CategoryProfile {
            severity: Severity::High,
            strategy: RecoveryStrategy::CircuitBreaker {
                failure_threshold: 5,
                reset_timeout_ms: 30_000,
            },
            template: "The tracking service reported an internal error.",
        },
        ErrorCategory::Unexpected => CategoryProfile {
            severity: Severity::High,
            strategy: RecoveryStrategy::FailFast,
            template: "An unexpected error occurred.",
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_category_has_a_profile() {
        for category in ErrorCategory::ALL {
            let p = profile(category);
            assert!(!p.template.is_empty());
        }
    }

    #[test]
    fn authentication_is_critical_and_manual() {
        let p = profile(ErrorCategory::Authentication);
        assert_eq!(p.severity, Severity::Critical);
        assert_eq!(p.strategy, RecoveryStrategy::RequireIntervention);
    }

    #[test]
    fn rate_limit_recommends_nonzero_backoff() {
        match profile(ErrorCategory::RateLimit).strategy {
            RecoveryStrategy::RetryWithBackoff {
                max_attempts,
                base_delay_ms,
                ..
            } => {
                assert!(max_attempts > 0);
                assert!(base_delay_ms > 0);
            }
            other => panic!("expected backoff recommendation, got {other:?}"),
        }
    }
}
