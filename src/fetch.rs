//! Fetch-style adapter.
//!
//! Mirrors the shape of `fetch`: a call never fails because of the mocked
//! status. Failures come back as a [`MockResponse`] with `ok == false`; only
//! cancellation (and unserializable mock payloads) produce an error.

use crate::resolver::{MockSpec, Outcome};
use crate::scheduler::{delay_from_ms, DEFAULT_DELAY_MS};
use crate::shape::{simulate, ResponseShape};
use crate::signal::{AbortReason, AbortSignal};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Errors surfaced by fetch-style calls.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The call was cancelled before it settled
    #[error("{0}")]
    Aborted(AbortReason),

    /// The body could not be converted
    #[error("invalid mock body: {0}")]
    Body(#[from] serde_json::Error),
}

impl FetchError {
    /// The abort reason, if this error is a cancellation.
    pub fn abort_reason(&self) -> Option<&AbortReason> {
        match self {
            FetchError::Aborted(reason) => Some(reason),
            FetchError::Body(_) => None,
        }
    }
}

/// Per-request options, the counterpart of `RequestInit`.
#[derive(Debug, Clone, Default)]
pub struct RequestInit {
    pub method: Option<String>,
    pub headers: HashMap<String, String>,
    pub body: Option<String>,
    pub signal: Option<AbortSignal>,
}

impl RequestInit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn signal(mut self, signal: AbortSignal) -> Self {
        self.signal = Some(signal);
        self
    }
}

/// Simulated response returned by fetch-style calls.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MockResponse {
    url: String,
    ok: bool,
    status: u16,
    #[serde(skip)]
    body: Value,
}

impl MockResponse {
    /// The request target, echoed back.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// `false` when the simulated outcome was a failure.
    pub fn ok(&self) -> bool {
        self.ok
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    /// Decode the body into `T`.
    pub async fn json<T: DeserializeOwned>(&self) -> Result<T, FetchError> {
        Ok(T::deserialize(&self.body)?)
    }

    /// The body as compact JSON text, keys in their original order.
    pub async fn text(&self) -> Result<String, FetchError> {
        Ok(serde_json::to_string(&self.body)?)
    }
}

/// Presents outcomes as [`MockResponse`]s for one target.
struct FetchShape {
    url: String,
}

impl<S: Serialize, E: Serialize> ResponseShape<S, E> for FetchShape {
    type Output = MockResponse;
    type Error = FetchError;

    fn settle(&self, outcome: Outcome<'_, S, E>) -> Result<MockResponse, FetchError> {
        Ok(MockResponse {
            url: self.url.clone(),
            ok: outcome.is_success(),
            status: outcome.status(),
            body: outcome.body_value()?,
        })
    }

    fn abort(&self, reason: AbortReason) -> FetchError {
        FetchError::Aborted(reason)
    }
}

/// A fetch stand-in with the mock bound once and reused for every call.
///
/// ```no_run
/// # async fn demo() -> Result<(), unready::FetchError> {
/// use serde_json::json;
/// use unready::{MockSpec, RequestInit, UnreadyFetch};
///
/// let mock: MockSpec = MockSpec::new().with_success(json!({"message": "Success!"}));
/// let fetch = UnreadyFetch::new(mock).with_delay_ms(500);
/// let response = fetch.fetch("https://api.example.com/data", RequestInit::new().method("GET")).await?;
/// if response.ok() {
///     println!("{}", response.text().await?);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct UnreadyFetch<S = Value, E = Value> {
    mock: MockSpec<S, E>,
    delay: Duration,
}

impl<S: Serialize, E: Serialize> UnreadyFetch<S, E> {
    /// Bind `mock` for all calls made through this value.
    pub fn new(mock: MockSpec<S, E>) -> Self {
        warn!("Unready fetch used! Please change to real fetch after API is ready!");
        Self {
            mock,
            delay: Duration::from_millis(DEFAULT_DELAY_MS),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_delay_ms(self, delay_ms: u64) -> Self {
        self.with_delay(Duration::from_millis(delay_ms))
    }

    pub fn mock(&self) -> &MockSpec<S, E> {
        &self.mock
    }

    /// Simulate a request to `target`.
    pub async fn fetch(
        &self,
        target: impl Into<String>,
        init: RequestInit,
    ) -> Result<MockResponse, FetchError> {
        let shape = FetchShape { url: target.into() };
        debug!(
            url = %shape.url,
            method = init.method.as_deref().unwrap_or("GET"),
            delay_ms = self.delay.as_millis() as u64,
            "Simulating fetch"
        );
        simulate(&shape, &self.mock, self.delay, init.signal.as_ref()).await
    }
}

impl Default for UnreadyFetch {
    fn default() -> Self {
        Self::new(MockSpec::default())
    }
}

/// Bind an optional mock and delay, returning a reusable fetch stand-in.
pub fn unready_fetcher<S: Serialize, E: Serialize>(
    mock: Option<MockSpec<S, E>>,
    delay_ms: Option<u64>,
) -> UnreadyFetch<S, E> {
    UnreadyFetch::new(mock.unwrap_or_default()).with_delay(delay_from_ms(delay_ms))
}

/// One-shot fetch stand-in: simulate a single request to `target`.
///
/// A missing mock behaves like an empty [`MockSpec`]; a missing delay uses
/// [`DEFAULT_DELAY_MS`].
pub async fn unready_fetch(
    target: impl Into<String>,
    init: RequestInit,
    mock: Option<&MockSpec>,
    delay_ms: Option<u64>,
) -> Result<MockResponse, FetchError> {
    let default_mock = MockSpec::default();
    let mock = mock.unwrap_or(&default_mock);
    let shape = FetchShape { url: target.into() };
    simulate(&shape, mock, delay_from_ms(delay_ms), init.signal.as_ref()).await
}
