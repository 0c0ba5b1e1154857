//! Process-wide request metrics for the Rally client.
//!
//! Plain atomic counters, readable as a string map for operator surfaces.
//! Recording is lock-free; the snapshot is eventually consistent.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use once_cell::sync::Lazy;

#[derive(Debug, Default)]
struct ClientMetrics {
    request_count: AtomicU64,
    success_count: AtomicU64,
    error_count: AtomicU64,
    bytes_sent: AtomicU64,
    bytes_received: AtomicU64,
}

static GLOBAL_METRICS: Lazy<ClientMetrics> = Lazy::new(ClientMetrics::default);

/// Record one completed request.
pub fn record_request(success: bool, bytes_sent: Option<u64>, bytes_received: Option<u64>) {
    GLOBAL_METRICS.request_count.fetch_add(1, Ordering::Relaxed);
    if success {
        GLOBAL_METRICS.success_count.fetch_add(1, Ordering::Relaxed);
    } else {
        GLOBAL_METRICS.error_count.fetch_add(1, Ordering::Relaxed);
    }
    if let Some(bytes) = bytes_sent {
        GLOBAL_METRICS.bytes_sent.fetch_add(bytes, Ordering::Relaxed);
    }
    if let Some(bytes) = bytes_received {
        GLOBAL_METRICS
            .bytes_received
            .fetch_add(bytes, Ordering::Relaxed);
    }
}

/// Snapshot of all counters.
pub fn snapshot() -> HashMap<String, String> {
    let mut map = HashMap::new();
    map.insert(
        "request_count".to_string(),
        GLOBAL_METRICS.request_count.load(Ordering::Relaxed).to_string(),
    );
    map.insert(
        "success_count".to_string(),
        GLOBAL_METRICS.success_count.load(Ordering::Relaxed).to_string(),
    );
    map.insert(
        "error_count".to_string(),
        GLOBAL_METRICS.error_count.load(Ordering::Relaxed).to_string(),
    );
    map.insert(
        "bytes_sent".to_string(),
        GLOBAL_METRICS.bytes_sent.load(Ordering::Relaxed).to_string(),
    );
    map.insert(
        "bytes_received".to_string(),
        GLOBAL_METRICS.bytes_received.load(Ordering::Relaxed).to_string(),
    );
    map
}

/// Zero all counters.
pub fn reset() {
    GLOBAL_METRICS.request_count.store(0, Ordering::Relaxed);
    GLOBAL_METRICS.success_count.store(0, Ordering::Relaxed);
    GLOBAL_METRICS.error_count.store(0, Ordering::Relaxed);
    GLOBAL_METRICS.bytes_sent.store(0, Ordering::Relaxed);
    GLOBAL_METRICS.bytes_received.store(0, Ordering::Relaxed);
}
