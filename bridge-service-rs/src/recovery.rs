//! Recovery execution.
//!
//! The classifier only recommends; this is where the recommendation is
//! honored. Retryable strategies re-run the operation up to their attempt
//! budget, everything else surfaces the diagnostic record immediately.
//! Every attempt's failure is classified and counted on its own, under the
//! correlation id carried by the operation context.

use std::future::Future;
use std::time::Duration;

use error_handling_rs::{
    DiagnosticRecord, ErrorClassifier, OperationContext, RawFailure, RecoveryStrategy,
};
use tracing::{debug, warn};

/// Run `operation`, retrying per the classified recovery recommendation.
///
/// Returns the operation's value, or the diagnostic record of the attempt
/// that exhausted its recommendation.
pub async fn run_with_recovery<F, Fut, T>(
    classifier: &ErrorClassifier,
    context: &OperationContext,
    operation: F,
) -> Result<T, DiagnosticRecord>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, RawFailure>>,
{
    let mut attempts_used: u32 = 0;
    loop {
        match operation().await {
            Ok(value) => {
                if attempts_used > 0 {
                    debug!(
                        operation = %context.operation,
                        attempts = attempts_used,
                        "operation recovered after retries"
                    );
                }
                return Ok(value);
            }
            Err(failure) => {
                let record = classifier.classify(&failure, context);
                let delay = match record.recovery_strategy {
                    RecoveryStrategy::RetryImmediate { max_attempts }
                        if attempts_used < max_attempts =>
                    {
                        Duration::ZERO
                    }
                    RecoveryStrategy::RetryWithBackoff {
                        max_attempts,
                        base_delay_ms,
                        multiplier,
                    } if attempts_used < max_attempts => {
                        let factor = multiplier.powi(attempts_used as i32);
                        Duration::from_millis((base_delay_ms as f64 * factor).round() as u64)
                    }
                    _ => return Err(record),
                };

                attempts_used += 1;
                warn!(
                    operation = %context.operation,
                    attempt = attempts_used,
                    category = %record.category,
                    delay_ms = delay.as_millis() as u64,
                    "retrying after classified failure"
                );
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}
