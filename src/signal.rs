//! Cancellation signals for pending simulated calls.
//!
//! An [`AbortController`] owns the abort side; any number of
//! [`AbortSignal`] clones can be handed to calls. A signal may also carry a
//! deadline ([`AbortSignal::timeout`]) after which it counts as aborted.

use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;

/// Why a call was cancelled.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "reason", rename_all = "snake_case")]
pub enum AbortReason {
    /// Aborted without an explicit reason
    Aborted,
    /// The signal's deadline passed
    TimedOut,
    /// Caller-supplied reason, passed through unchanged
    Custom(Value),
}

impl AbortReason {
    /// Conventional error name for the reason.
    pub fn name(&self) -> &'static str {
        match self {
            AbortReason::TimedOut => "TimeoutError",
            AbortReason::Aborted | AbortReason::Custom(_) => "AbortError",
        }
    }
}

impl fmt::Display for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbortReason::Aborted => write!(f, "AbortError: This operation was aborted"),
            AbortReason::TimedOut => {
                write!(f, "TimeoutError: The operation was aborted due to timeout")
            }
            AbortReason::Custom(Value::String(reason)) => f.write_str(reason),
            AbortReason::Custom(reason) => write!(f, "{}", reason),
        }
    }
}

/// Owner of the abort side of a signal.
#[derive(Debug)]
pub struct AbortController {
    tx: watch::Sender<Option<AbortReason>>,
    signal: AbortSignal,
}

impl AbortController {
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(None);
        Self {
            tx,
            signal: AbortSignal {
                rx: Some(rx),
                deadline: None,
            },
        }
    }

    /// A signal observing this controller.
    pub fn signal(&self) -> AbortSignal {
        self.signal.clone()
    }

    /// Abort with the conventional reason.
    pub fn abort(&self) {
        self.abort_with_reason(AbortReason::Aborted);
    }

    /// Abort with a caller-supplied reason.
    pub fn abort_with(&self, reason: impl Into<Value>) {
        self.abort_with_reason(AbortReason::Custom(reason.into()));
    }

    /// Only the first abort is recorded; later calls are no-ops.
    fn abort_with_reason(&self, reason: AbortReason) {
        self.tx.send_if_modified(|current| {
            if current.is_some() {
                return false;
            }
            *current = Some(reason);
            true
        });
    }
}

impl Default for AbortController {
    fn default() -> Self {
        Self::new()
    }
}

/// Observer side of a cancellation request.
#[derive(Debug, Clone)]
pub struct AbortSignal {
    rx: Option<watch::Receiver<Option<AbortReason>>>,
    deadline: Option<Instant>,
}

impl AbortSignal {
    /// A signal that aborts with [`AbortReason::TimedOut`] once `after` has elapsed.
    pub fn timeout(after: Duration) -> Self {
        Self {
            rx: None,
            deadline: Some(Instant::now() + after),
        }
    }

    /// A signal that is already aborted with `reason`.
    pub fn aborted_with(reason: AbortReason) -> Self {
        let (_tx, rx) = watch::channel(Some(reason));
        Self {
            rx: Some(rx),
            deadline: None,
        }
    }

    /// The abort reason, if the signal has fired.
    pub fn reason(&self) -> Option<AbortReason> {
        if let Some(reason) = self.rx.as_ref().and_then(|rx| rx.borrow().clone()) {
            return Some(reason);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(AbortReason::TimedOut),
            _ => None,
        }
    }

    pub fn is_aborted(&self) -> bool {
        self.reason().is_some()
    }

    /// Wait until the signal fires.
    ///
    /// Never completes for a signal that cannot fire any more (controller
    /// dropped without aborting, no deadline).
    pub async fn aborted(&self) -> AbortReason {
        let rx = self.rx.clone();
        let by_controller = async move {
            if let Some(mut rx) = rx {
                if let Ok(current) = rx.wait_for(Option::is_some).await {
                    if let Some(reason) = (*current).clone() {
                        return reason;
                    }
                }
            }
            std::future::pending().await
        };

        match self.deadline {
            Some(deadline) => tokio::select! {
                reason = by_controller => reason,
                _ = tokio::time::sleep_until(deadline) => AbortReason::TimedOut,
            },
            None => by_controller.await,
        }
    }
}

/// Signals compare by state: equal when they report the same reason.
impl PartialEq for AbortSignal {
    fn eq(&self, other: &Self) -> bool {
        self.reason() == other.reason()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_fresh_signal_not_aborted() {
        let controller = AbortController::new();
        assert!(!controller.signal().is_aborted());
        assert_eq!(controller.signal().reason(), None);
    }

    #[test]
    fn test_abort_default_reason() {
        let controller = AbortController::new();
        let signal = controller.signal();
        controller.abort();

        assert_eq!(signal.reason(), Some(AbortReason::Aborted));
        assert_eq!(AbortReason::Aborted.name(), "AbortError");
    }

    #[test]
    fn test_first_abort_wins() {
        let controller = AbortController::new();
        controller.abort_with("first");
        controller.abort_with("second");
        controller.abort();

        assert_eq!(
            controller.signal().reason(),
            Some(AbortReason::Custom(json!("first")))
        );
    }

    #[test]
    fn test_reason_display() {
        assert_eq!(AbortReason::Custom(json!("mock-reason")).to_string(), "mock-reason");
        assert_eq!(AbortReason::Custom(json!({"a": 1})).to_string(), r#"{"a":1}"#);
        assert!(AbortReason::TimedOut.to_string().starts_with("TimeoutError"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_aborted_resolves_on_abort() {
        let controller = AbortController::new();
        let signal = controller.signal();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            controller.abort_with("mock-reason");
        });

        assert_eq!(signal.aborted().await, AbortReason::Custom(json!("mock-reason")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_signal() {
        let signal = AbortSignal::timeout(Duration::from_millis(50));
        assert!(!signal.is_aborted());

        let start = Instant::now();
        assert_eq!(signal.aborted().await, AbortReason::TimedOut);
        assert_eq!(start.elapsed(), Duration::from_millis(50));
        assert_eq!(signal.reason(), Some(AbortReason::TimedOut));
        assert_eq!(AbortReason::TimedOut.name(), "TimeoutError");
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_controller_never_fires() {
        let signal = AbortController::new().signal();
        let result =
            tokio::time::timeout(Duration::from_secs(10), signal.aborted()).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_pre_aborted_signal() {
        let signal = AbortSignal::aborted_with(AbortReason::Aborted);
        assert!(signal.is_aborted());
        assert_eq!(signal.aborted().await, AbortReason::Aborted);
    }
}
