//! Retry policy for outbound calls
//!
//! Exponential backoff with a fixed attempt budget. Only failures the
//! caller classifies as retryable are attempted again; everything else
//! returns immediately.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::client::ReportError;

/// Run `op` up to `1 + max_retries` times, sleeping an exponentially
/// growing delay between attempts. Non-retryable errors short-circuit.
pub async fn with_retries<T, F, Fut>(
    max_retries: u32,
    base_delay: Duration,
    mut op: F,
) -> Result<T, ReportError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ReportError>>,
{
    let mut attempt: u32 = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if attempt < max_retries && err.is_retryable() => {
                attempt += 1;
                let delay = base_delay.saturating_mul(1 << (attempt - 1));
                warn!(error = %err, attempt, delay_ms = delay.as_millis() as u64, "outbound call failed, retrying with backoff");
                tokio::time::sleep(delay).await;
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn retries_retryable_failures_up_to_the_budget() {
        let attempts = AtomicU32::new(0);
        let result: Result<(), _> = with_retries(2, Duration::from_millis(200), || {
            attempts.fetch_add(1, Ordering::SeqCst);
            async { Err(ReportError::Status(500)) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn does_not_retry_client_errors() {
        let attempts = AtomicU32::new(0);
        let result: Result<(), _> = with_retries(2, Duration::from_millis(200), || {
            attempts.fetch_add(1, Ordering::SeqCst);
            async { Err(ReportError::Status(404)) }
        })
        .await;

        assert!(matches!(result, Err(ReportError::Status(404))));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_after_transient_failures() {
        let attempts = AtomicU32::new(0);
        let result = with_retries(2, Duration::from_millis(200), || {
            let n = attempts.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(ReportError::Transport("connection reset".into()))
                } else {
                    Ok(n)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 2);
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn backoff_doubles_between_attempts() {
        let start = Instant::now();
        let _: Result<(), _> = with_retries(2, Duration::from_millis(200), || async {
            Err(ReportError::Status(500))
        })
        .await;

        // 200ms after the first failure + 400ms after the second.
        assert_eq!(start.elapsed(), Duration::from_millis(600));
    }
}
