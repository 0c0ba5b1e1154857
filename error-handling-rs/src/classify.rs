//! # Classification Pipeline
//!
//! Precedence-ordered mapping of raw failures onto the taxonomy:
//!
//! 1. structured HTTP status → status table (most specific, always wins)
//! 2. transport code/message → network-pattern table
//! 3. generic exception → name/message substring rules
//! 4. anything else → `unexpected`
//!
//! The tables are data. Adding a status code or failure pattern is a row,
//! not a branch.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use once_cell::sync::Lazy;
use tracing::debug;

use crate::category::{ErrorCategory, RecoveryStrategy, Severity};
use crate::context::{new_correlation_id, OperationContext};
use crate::failure::RawFailure;
use crate::profile::profile;
use crate::record::{DiagnosticContext, DiagnosticRecord};

/// One status-table row. `severity`/`strategy` override the category
/// profile when set; most rows inherit the profile defaults.
struct StatusRule {
    status: u16,
    category: ErrorCategory,
    severity: Option<Severity>,
    strategy: Option<RecoveryStrategy>,
}

const STATUS_RULES: &[StatusRule] = &[
    StatusRule { status: 400, category: ErrorCategory::Validation, severity: None, strategy: None },
    StatusRule { status: 401, category: ErrorCategory::Authentication, severity: Some(Severity::Critical), strategy: Some(RecoveryStrategy::RequireIntervention) },
    StatusRule { status: 403, category: ErrorCategory::Permission, severity: None, strategy: None },
    StatusRule { status: 404, category: ErrorCategory::NotFound, severity: None, strategy: None },
    StatusRule { status: 408, category: ErrorCategory::Timeout, severity: None, strategy: None },
    StatusRule { status: 409, category: ErrorCategory::ResourceConflict, severity: None, strategy: None },
    StatusRule { status: 422, category: ErrorCategory::Validation, severity: None, strategy: None },
    StatusRule { status: 429, category: ErrorCategory::RateLimit, severity: None, strategy: None },
    StatusRule { status: 500, category: ErrorCategory::Internal, severity: None, strategy: None },
    StatusRule { status: 502, category: ErrorCategory::ServiceUnavailable, severity: None, strategy: None },
    StatusRule { status: 503, category: ErrorCategory::ServiceUnavailable, severity: None, strategy: None },
    StatusRule { status: 504, category: ErrorCategory::Timeout, severity: Some(Severity::High), strategy: None },
];

static STATUS_BY_CODE: Lazy<HashMap<u16, &'static StatusRule>> =
    Lazy::new(|| STATUS_RULES.iter().map(|rule| (rule.status, rule)).collect());

/// One network-pattern row: lowercase needles matched against the transport
/// code and message, with the canonical code recorded when the raw failure
/// carried none. First match wins; certificate problems are checked before
/// timeouts so a failed TLS handshake never classifies as `timeout`.
struct NetworkRule {
    needles: &'static [&'static str],
    canonical_code: &'static str,
    category: ErrorCategory,
}

const NETWORK_RULES: &[NetworkRule] = &[
    NetworkRule {
        needles: &["certificate", "ssl", "tls", "self signed", "unable to verify"],
        canonical_code: "CERT_VERIFICATION_FAILED",
        category: ErrorCategory::SslCertificate,
    },
    NetworkRule {
        needles: &["econnrefused", "connection refused"],
        canonical_code: "ECONNREFUSED",
        category: ErrorCategory::Network,
    },
    NetworkRule {
        needles: &["enotfound", "eai_again", "dns", "name resolution", "failed to lookup"],
        canonical_code: "ENOTFOUND",
        category: ErrorCategory::Network,
    },
    NetworkRule {
        needles: &["econnreset", "connection reset", "broken pipe", "epipe"],
        canonical_code: "ECONNRESET",
        category: ErrorCategory::Network,
    },
    NetworkRule {
        needles: &["etimedout", "timed out", "timeout"],
        canonical_code: "ETIMEDOUT",
        category: ErrorCategory::Timeout,
    },
];

/// Exception substring rules, applied to `name` and `message` lowercased.
const EXCEPTION_RULES: &[(&[&str], ErrorCategory)] = &[
    (&["schema"], ErrorCategory::SchemaValidation),
    (&["validation", "invalid"], ErrorCategory::Validation),
    (&["authentication", "unauthorized"], ErrorCategory::Authentication),
    (&["permission", "forbidden"], ErrorCategory::Permission),
    (&["deserialize", "serialize", "parse", "decode"], ErrorCategory::Serialization),
];

/// Shared classification state: per-category counters and a bounded history
/// of diagnostic records, oldest evicted first. Injectable so tests reset it
/// trivially and independent classifier instances share nothing unless
/// explicitly wired to the same state.
#[derive(Debug)]
pub struct ClassifierState {
    inner: Mutex<StateInner>,
    history_capacity: usize,
}

#[derive(Debug, Default)]
struct StateInner {
    counts: HashMap<ErrorCategory, u64>,
    history: VecDeque<DiagnosticRecord>,
}

impl ClassifierState {
    /// State with a history ring of `history_capacity` records.
    pub fn new(history_capacity: usize) -> Self {
        Self {
            inner: Mutex::new(StateInner::default()),
            history_capacity,
        }
    }

    fn lock(&self) -> MutexGuard<'_, StateInner> {
        // A panic while holding the lock must not take classification down
        // with it; the counters are best-effort bookkeeping.
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn record(&self, record: &DiagnosticRecord) {
        let mut inner = self.lock();
        *inner.counts.entry(record.category).or_insert(0) += 1;
        if self.history_capacity > 0 {
            if inner.history.len() == self.history_capacity {
                inner.history.pop_front();
            }
            inner.history.push_back(record.clone());
        }
    }

    /// Snapshot of the per-category counters, including zero entries.
    pub fn category_counts(&self) -> HashMap<ErrorCategory, u64> {
        let inner = self.lock();
        ErrorCategory::ALL
            .iter()
            .map(|category| (*category, inner.counts.get(category).copied().unwrap_or(0)))
            .collect()
    }

    /// Snapshot of the retained history, oldest first.
    pub fn history(&self) -> Vec<DiagnosticRecord> {
        self.lock().history.iter().cloned().collect()
    }

    /// Clear counters and history.
    pub fn reset(&self) {
        let mut inner = self.lock();
        inner.counts.clear();
        inner.history.clear();
    }
}

impl Default for ClassifierState {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

const DEFAULT_HISTORY_CAPACITY: usize = 256;

/// The classifier. Cheap to clone; clones share the same state.
#[derive(Debug, Clone)]
pub struct ErrorClassifier {
    state: Arc<ClassifierState>,
}

impl Default for ErrorClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl ErrorClassifier {
    /// Classifier with its own default-capacity state.
    pub fn new() -> Self {
        Self {
            state: Arc::new(ClassifierState::default()),
        }
    }

    /// Classifier over an explicitly provided state.
    pub fn with_state(state: Arc<ClassifierState>) -> Self {
        Self { state }
    }

    /// The shared state, for aggregate reporting.
    pub fn state(&self) -> &ClassifierState {
        &self.state
    }

    /// Map one raw failure onto the taxonomy.
    ///
    /// Never fails and performs no I/O. The returned record carries the
    /// caller's correlation id, or a fresh one when none was supplied.
    pub fn classify(&self, failure: &RawFailure, context: &OperationContext) -> DiagnosticRecord {
        let outcome = match failure {
            RawFailure::Http { status, body } => classify_status(*status, body.as_deref()),
            RawFailure::Transport { code, message } => classify_transport(code.as_deref(), message),
            RawFailure::Exception { name, message } => classify_exception(name.as_deref(), message),
            RawFailure::Value(value) => Outcome {
                category: ErrorCategory::Unexpected,
                severity: None,
                strategy: None,
                source_error_code: None,
                details: Some(value.to_string()),
            },
        };

        let defaults = profile(outcome.category);
        let record = DiagnosticRecord {
            category: outcome.category,
            severity: outcome.severity.unwrap_or(defaults.severity),
            message: defaults.template.to_string(),
            recovery_strategy: outcome.strategy.unwrap_or(defaults.strategy),
            source_error_code: outcome.source_error_code,
            correlation_id: context
                .correlation_id
                .clone()
                .unwrap_or_else(new_correlation_id),
            context: DiagnosticContext {
                operation: context.operation.clone(),
                endpoint: context.endpoint.clone(),
                timestamp: chrono::Utc::now(),
            },
            details: outcome.details,
            resolution: None,
        };

        self.state.record(&record);
        debug!(
            category = %record.category,
            operation = %record.context.operation,
            correlation_id = %record.correlation_id,
            "failure classified"
        );
        record
    }
}

struct Outcome {
    category: ErrorCategory,
    severity: Option<Severity>,
    strategy: Option<RecoveryStrategy>,
    source_error_code: Option<String>,
    details: Option<String>,
}

fn classify_status(status: u16, body: Option<&str>) -> Outcome {
    let rule = STATUS_BY_CODE.get(&status).copied();
    let (category, severity, strategy) = match rule {
        Some(rule) => (rule.category, rule.severity, rule.strategy),
        // The taxonomy is closed: unmapped server statuses read as the
        // remote's internal failure, unmapped client statuses as a
        // protocol-level rejection.
        None if status >= 500 => (ErrorCategory::Internal, None, None),
        None if status >= 400 => (ErrorCategory::Protocol, None, None),
        None => (ErrorCategory::Unexpected, None, None),
    };
    Outcome {
        category,
        severity,
        strategy,
        source_error_code: Some(status.to_string()),
        details: body.map(str::to_string),
    }
}

fn classify_transport(code: Option<&str>, message: &str) -> Outcome {
    let haystack = format!("{} {}", code.unwrap_or_default(), message).to_lowercase();
    let matched = NETWORK_RULES
        .iter()
        .find(|rule| rule.needles.iter().any(|needle| haystack.contains(needle)));

    let (category, canonical) = match matched {
        Some(rule) => (rule.category, rule.canonical_code),
        // A transport failure with no recognizable pattern is still a
        // network failure.
        None => (ErrorCategory::Network, "UNKNOWN"),
    };
    Outcome {
        category,
        severity: None,
        strategy: None,
        source_error_code: Some(code.unwrap_or(canonical).to_string()),
        details: Some(message.to_string()),
    }
}

fn classify_exception(name: Option<&str>, message: &str) -> Outcome {
    let haystack = format!("{} {}", name.unwrap_or_default(), message).to_lowercase();
    let category = EXCEPTION_RULES
        .iter()
        .find(|(needles, _)| needles.iter().any(|needle| haystack.contains(needle)))
        .map(|(_, category)| *category)
        .unwrap_or(ErrorCategory::Internal);

    let details = match name {
        Some(name) => format!("{name}: {message}"),
        None => message.to_string(),
    };
    Outcome {
        category,
        severity: None,
        strategy: None,
        source_error_code: None,
        details: Some(details),
    }
}
