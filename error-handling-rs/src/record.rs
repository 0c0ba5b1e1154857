//! # Diagnostic Records
//!
//! The classifier's output: one record per raw failure, created at the
//! boundary where the failure was caught and never mutated afterwards,
//! except to note resolution once the caller reports the operation as
//! recovered.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::category::{ErrorCategory, RecoveryStrategy, Severity};

/// Where and when the failure happened, captured at classification time.
#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticContext {
    pub operation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Resolution metadata, recorded once if the caller reports recovery.
#[derive(Debug, Clone, Serialize)]
pub struct Resolution {
    pub resolved_by: String,
    pub resolution_time: DateTime<Utc>,
}

/// One classified failure.
///
/// `message` is the fixed per-category template and is safe to show to the
/// invoking agent. Raw provider text is only reachable through `details`
/// and `source_error_code`, which are operator-facing.
#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticRecord {
    pub category: ErrorCategory,
    pub severity: Severity,
    pub message: String,
    pub recovery_strategy: RecoveryStrategy,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_error_code: Option<String>,
    pub correlation_id: String,
    pub context: DiagnosticContext,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<Resolution>,
}

impl DiagnosticRecord {
    /// Record that the failure was recovered. Only the first report sticks.
    pub fn mark_resolved(&mut self, resolved_by: impl Into<String>) {
        if self.resolution.is_none() {
            self.resolution = Some(Resolution {
                resolved_by: resolved_by.into(),
                resolution_time: Utc::now(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::profile;

    fn sample() -> DiagnosticRecord {
        let p = profile(ErrorCategory::Timeout);
        DiagnosticRecord {
            category: ErrorCategory::Timeout,
            severity: p.severity,
            message: p.template.to_string(),
            recovery_strategy: p.strategy,
            source_error_code: Some("504".to_string()),
            correlation_id: "cid-1".to_string(),
            context: DiagnosticContext {
                operation: "query_stories".to_string(),
                endpoint: None,
                timestamp: Utc::now(),
            },
            details: None,
            resolution: None,
        }
    }

    #[test]
    fn resolution_is_recorded_once() {
        let mut record = sample();
        record.mark_resolved("retry");
        let first = record.resolution.clone().unwrap();
        record.mark_resolved("operator");
        assert_eq!(record.resolution.unwrap().resolved_by, first.resolved_by);
    }

    #[test]
    fn serializes_with_kebab_category() {
        let encoded = serde_json::to_value(sample()).unwrap();
        assert_eq!(encoded["category"], "timeout");
        assert_eq!(encoded["severity"], "medium");
        assert_eq!(encoded["recovery_strategy"]["strategy"], "retry-with-backoff");
    }
}
