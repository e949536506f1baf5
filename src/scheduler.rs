//! Delay and cancellation for simulated calls.
//!
//! Every call owns exactly one timer and at most one abort listener. Both
//! live inside the future returned by [`schedule`], so whichever exit path
//! fires first drops the other.

use crate::signal::{AbortReason, AbortSignal};
use std::time::Duration;
use tracing::debug;

/// Delay applied when the caller does not choose one.
pub const DEFAULT_DELAY_MS: u64 = 1000;

/// Convert an optional millisecond delay into a [`Duration`].
pub fn delay_from_ms(delay_ms: Option<u64>) -> Duration {
    Duration::from_millis(delay_ms.unwrap_or(DEFAULT_DELAY_MS))
}

/// Run `resolve` once `delay` has elapsed, unless `signal` fires first.
///
/// `resolve` is never invoked on the cancellation path. A signal that has
/// already fired when the call starts rejects without waiting.
pub async fn schedule<T, F>(
    resolve: F,
    delay: Duration,
    signal: Option<&AbortSignal>,
) -> Result<T, AbortReason>
where
    F: FnOnce() -> T,
{
    let Some(signal) = signal else {
        tokio::time::sleep(delay).await;
        return Ok(resolve());
    };

    if let Some(reason) = signal.reason() {
        debug!(reason = %reason, "Signal already aborted, rejecting immediately");
        return Err(reason);
    }

    tokio::select! {
        biased;

        reason = signal.aborted() => {
            debug!(reason = %reason, "Simulated call aborted before delay elapsed");
            Err(reason)
        }
        _ = tokio::time::sleep(delay) => {
            debug!(delay_ms = delay.as_millis() as u64, "Simulated delay elapsed");
            Ok(resolve())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::AbortController;
    use serde_json::json;
    use std::cell::Cell;
    use tokio::time::Instant;

    #[test]
    fn test_delay_from_ms() {
        assert_eq!(delay_from_ms(None), Duration::from_millis(1000));
        assert_eq!(delay_from_ms(Some(10)), Duration::from_millis(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_resolves_after_delay() {
        let start = Instant::now();
        let result = schedule(|| 42, Duration::from_millis(100), None).await;

        assert_eq!(result, Ok(42));
        assert_eq!(start.elapsed(), Duration::from_millis(100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_before_expiry_skips_resolver() {
        let controller = AbortController::new();
        let signal = controller.signal();
        let invoked = Cell::new(false);

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            controller.abort_with("mock-reason");
        });

        let start = Instant::now();
        let result = schedule(
            || invoked.set(true),
            Duration::from_millis(100),
            Some(&signal),
        )
        .await;

        assert_eq!(result, Err(AbortReason::Custom(json!("mock-reason"))));
        assert!(!invoked.get());
        assert_eq!(start.elapsed(), Duration::from_millis(50));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_after_settlement_is_noop() {
        let controller = AbortController::new();
        let signal = controller.signal();

        let result = schedule(|| "done", Duration::from_millis(10), Some(&signal)).await;
        controller.abort();

        assert_eq!(result, Ok("done"));
        assert!(signal.is_aborted());
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_signal_cancels() {
        let signal = AbortSignal::timeout(Duration::from_millis(50));
        let result = schedule(|| (), Duration::from_millis(100), Some(&signal)).await;

        assert_eq!(result, Err(AbortReason::TimedOut));
    }

    #[tokio::test(start_paused = true)]
    async fn test_pre_aborted_signal_rejects_immediately() {
        let controller = AbortController::new();
        controller.abort();

        let start = Instant::now();
        let result = schedule(|| (), Duration::from_millis(100), Some(&controller.signal())).await;

        assert_eq!(result, Err(AbortReason::Aborted));
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_calls_are_independent() {
        let controller = AbortController::new();
        let signal = controller.signal();

        let cancelled = schedule(|| 1, Duration::from_millis(100), Some(&signal));
        let untouched = schedule(|| 2, Duration::from_millis(100), None);
        let abort = async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            controller.abort();
        };

        let (cancelled, untouched, ()) = tokio::join!(cancelled, untouched, abort);
        assert_eq!(cancelled, Err(AbortReason::Aborted));
        assert_eq!(untouched, Ok(2));
    }
}
