//! Unready
//!
//! Stand-ins for network request APIs that are not ready yet. Calls look
//! like real `fetch`-style or HTTP-client-style requests but settle with
//! canned data after a configurable delay, so frontend-facing code can be
//! written and tested before the backend exists.
//!
//! # Features
//!
//! - **Outcome Rules**: Success or failure decided from the mock alone
//! - **Default Bodies**: Built-in success and error payloads
//! - **Latency Simulation**: One timer per call, 1000 ms by default
//! - **Cancellation**: Abort controllers and timeout signals
//! - **Two Shapes**: `fetch`-style responses and client-style errors
//!
//! # Example
//!
//! ```no_run
//! # async fn demo() -> Result<(), unready::FetchError> {
//! use serde_json::{json, Value};
//! use unready::{unready_fetch, MockSpec, RequestInit};
//!
//! let mock = MockSpec::new().with_success(json!({"data": {"id": 1, "name": "Test"}}));
//! let response = unready_fetch("mock-url", RequestInit::new().method("GET"), Some(&mock), Some(10)).await?;
//! assert!(response.ok());
//! let body: Value = response.json().await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod fetch;
pub mod resolver;
pub mod scheduler;
pub mod shape;
pub mod signal;

pub use client::{
    unready_client, CanceledError, ClientError, ClientResponse, ErrorCode, RequestConfig,
    StatusError, UnreadyClient,
};
pub use config::UnreadyConfig;
pub use fetch::{unready_fetch, unready_fetcher, FetchError, MockResponse, RequestInit, UnreadyFetch};
pub use resolver::{resolve, DefaultBody, MockSpec, Outcome};
pub use scheduler::DEFAULT_DELAY_MS;
pub use signal::{AbortController, AbortReason, AbortSignal};
