//! Shared "simulate a call" capability.
//!
//! A [`ResponseShape`] turns a settled [`Outcome`] or an abort into the
//! value a particular API style hands back to its caller. [`simulate`]
//! drives resolver and scheduler and defers presentation to the shape.

use crate::resolver::{resolve, MockSpec, Outcome};
use crate::scheduler::schedule;
use crate::signal::{AbortReason, AbortSignal};
use std::time::Duration;

/// Presentation strategy for simulated calls.
pub trait ResponseShape<S, E> {
    /// Value produced on settlement
    type Output;
    /// Error produced on cancellation or rejected settlement
    type Error;

    /// Present a resolved outcome.
    fn settle(&self, outcome: Outcome<'_, S, E>) -> Result<Self::Output, Self::Error>;

    /// Present a cancellation.
    fn abort(&self, reason: AbortReason) -> Self::Error;
}

/// Simulate one call against `mock`, presented through `shape`.
pub async fn simulate<S, E, Sh>(
    shape: &Sh,
    mock: &MockSpec<S, E>,
    delay: Duration,
    signal: Option<&AbortSignal>,
) -> Result<Sh::Output, Sh::Error>
where
    Sh: ResponseShape<S, E>,
{
    match schedule(|| resolve(mock), delay, signal).await {
        Ok(outcome) => shape.settle(outcome),
        Err(reason) => Err(shape.abort(reason)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::AbortController;
    use serde_json::{json, Value};

    /// Records the status only, to check the wiring.
    struct StatusShape;

    impl ResponseShape<Value, Value> for StatusShape {
        type Output = u16;
        type Error = String;

        fn settle(&self, outcome: Outcome<'_, Value, Value>) -> Result<u16, String> {
            match outcome {
                Outcome::Success { status, .. } => Ok(status),
                Outcome::Failure { status, .. } => Err(format!("failed with {}", status)),
            }
        }

        fn abort(&self, reason: AbortReason) -> String {
            format!("aborted: {}", reason)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_simulate_success() {
        let mock: MockSpec = MockSpec::new().with_success(json!({})).with_status(204);
        let result = simulate(&StatusShape, &mock, Duration::from_millis(10), None).await;
        assert_eq!(result, Ok(204));
    }

    #[tokio::test(start_paused = true)]
    async fn test_simulate_failure() {
        let mock: MockSpec = MockSpec::new().with_status(404);
        let result = simulate(&StatusShape, &mock, Duration::from_millis(10), None).await;
        assert_eq!(result, Err("failed with 404".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_simulate_abort() {
        let controller = AbortController::new();
        controller.abort_with("stop");

        let mock: MockSpec = MockSpec::new();
        let result = simulate(
            &StatusShape,
            &mock,
            Duration::from_millis(10),
            Some(&controller.signal()),
        )
        .await;
        assert_eq!(result, Err("aborted: stop".to_string()));
    }
}
