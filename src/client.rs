//! Client-style adapter.
//!
//! Mirrors HTTP client libraries that raise on error statuses: a failed
//! outcome rejects with a [`StatusError`] holding a snapshot of the
//! response, and cancellation rejects with a separate [`CanceledError`].

use crate::resolver::{MockSpec, Outcome};
use crate::scheduler::{delay_from_ms, DEFAULT_DELAY_MS};
use crate::shape::{simulate, ResponseShape};
use crate::signal::{AbortReason, AbortSignal};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Accept header every normalized config carries unless overridden.
pub const DEFAULT_ACCEPT: &str = "application/json, text/plain, */*";

/// Transport-level configuration for one request.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RequestConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,

    pub headers: HashMap<String, String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,

    #[serde(skip)]
    pub signal: Option<AbortSignal>,
}

impl RequestConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn signal(mut self, signal: AbortSignal) -> Self {
        self.signal = Some(signal);
        self
    }

    /// Copy of this config with the default `Accept` header merged in.
    ///
    /// Caller headers win; names compare case-insensitively.
    pub fn normalized(&self) -> Self {
        let mut headers = HashMap::with_capacity(self.headers.len() + 1);
        if !self
            .headers
            .keys()
            .any(|name| name.eq_ignore_ascii_case("accept"))
        {
            headers.insert("Accept".to_string(), DEFAULT_ACCEPT.to_string());
        }
        headers.extend(self.headers.iter().map(|(k, v)| (k.clone(), v.clone())));

        Self {
            headers,
            ..self.clone()
        }
    }
}

/// Successful response, or the response snapshot inside a [`StatusError`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientResponse<T = Value> {
    pub data: T,
    pub status: u16,
    pub status_text: String,
    pub headers: HashMap<String, String>,
    pub request: Value,
    pub config: RequestConfig,
}

impl<T> ClientResponse<T> {
    fn new(data: T, status: u16, config: RequestConfig) -> Self {
        Self {
            data,
            status,
            status_text: String::new(),
            headers: HashMap::new(),
            request: json!({}),
            config,
        }
    }
}

/// Error code tags carried by client errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    ErrBadRequest,
    ErrBadResponse,
    ErrCanceled,
}

impl ErrorCode {
    /// Tag for a failed outcome with `status`.
    pub fn for_status(status: u16) -> Self {
        if status >= 500 {
            ErrorCode::ErrBadResponse
        } else {
            ErrorCode::ErrBadRequest
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ErrBadRequest => "ERR_BAD_REQUEST",
            ErrorCode::ErrBadResponse => "ERR_BAD_RESPONSE",
            ErrorCode::ErrCanceled => "ERR_CANCELED",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rejection for a failed outcome.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusError<E = Value> {
    pub message: String,
    pub code: ErrorCode,
    pub config: RequestConfig,
    pub response: ClientResponse<E>,
}

/// Rejection for a cancelled request. Carries no response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CanceledError {
    pub message: String,
    pub code: ErrorCode,
    pub reason: AbortReason,
    pub config: RequestConfig,
}

/// Errors surfaced by client-style requests.
#[derive(Debug, Error)]
pub enum ClientError<E = Value> {
    /// The mocked outcome was a failure
    #[error("{}", .0.message)]
    Status(Box<StatusError<E>>),

    /// The request was cancelled before it settled
    #[error("{}", .0.message)]
    Canceled(CanceledError),

    /// The built-in body could not be represented as the mock's payload type
    #[error("invalid mock body: {0}")]
    Body(#[from] serde_json::Error),
}

impl<E> ClientError<E> {
    /// Whether this error is a cancellation.
    pub fn is_cancel(&self) -> bool {
        matches!(self, ClientError::Canceled(_))
    }

    /// Response snapshot for status failures.
    pub fn response(&self) -> Option<&ClientResponse<E>> {
        match self {
            ClientError::Status(err) => Some(&err.response),
            _ => None,
        }
    }

    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            ClientError::Status(err) => Some(err.code),
            ClientError::Canceled(err) => Some(err.code),
            ClientError::Body(_) => None,
        }
    }
}

/// Presents outcomes for one normalized request config.
struct ClientShape {
    config: RequestConfig,
}

impl<S, E> ResponseShape<S, E> for ClientShape
where
    S: Clone + DeserializeOwned,
    E: Clone + DeserializeOwned,
{
    type Output = ClientResponse<S>;
    type Error = ClientError<E>;

    fn settle(&self, outcome: Outcome<'_, S, E>) -> Result<ClientResponse<S>, ClientError<E>> {
        match outcome {
            Outcome::Success { status, body } => Ok(ClientResponse::new(
                body.to_owned_payload()?,
                status,
                self.config.clone(),
            )),
            Outcome::Failure { status, body } => {
                let response = ClientResponse::new(body.to_owned_payload()?, status, self.config.clone());
                Err(ClientError::Status(Box::new(StatusError {
                    message: format!("Request failed with status code {}", status),
                    code: ErrorCode::for_status(status),
                    config: self.config.clone(),
                    response,
                })))
            }
        }
    }

    fn abort(&self, reason: AbortReason) -> ClientError<E> {
        ClientError::Canceled(CanceledError {
            message: "canceled".to_string(),
            code: ErrorCode::ErrCanceled,
            reason,
            config: self.config.clone(),
        })
    }
}

/// A client stand-in with the mock bound at construction.
#[derive(Debug, Clone)]
pub struct UnreadyClient<S = Value, E = Value> {
    mock: MockSpec<S, E>,
    delay: Duration,
}

impl<S, E> UnreadyClient<S, E>
where
    S: Clone + DeserializeOwned,
    E: Clone + DeserializeOwned,
{
    pub fn new(mock: MockSpec<S, E>) -> Self {
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

    /// Simulate one request.
    pub async fn request(&self, config: RequestConfig) -> Result<ClientResponse<S>, ClientError<E>> {
        let shape = ClientShape {
            config: config.normalized(),
        };
        debug!(
            url = shape.config.url.as_deref().unwrap_or(""),
            method = shape.config.method.as_deref().unwrap_or("GET"),
            delay_ms = self.delay.as_millis() as u64,
            "Simulating client request"
        );
        simulate(&shape, &self.mock, self.delay, config.signal.as_ref()).await
    }

    pub async fn get(&self, url: impl Into<String>) -> Result<ClientResponse<S>, ClientError<E>> {
        self.request(RequestConfig::new().method("GET").url(url)).await
    }

    pub async fn delete(&self, url: impl Into<String>) -> Result<ClientResponse<S>, ClientError<E>> {
        self.request(RequestConfig::new().method("DELETE").url(url)).await
    }

    pub async fn post(
        &self,
        url: impl Into<String>,
        data: Value,
    ) -> Result<ClientResponse<S>, ClientError<E>> {
        self.request(RequestConfig::new().method("POST").url(url).data(data))
            .await
    }

    pub async fn put(
        &self,
        url: impl Into<String>,
        data: Value,
    ) -> Result<ClientResponse<S>, ClientError<E>> {
        self.request(RequestConfig::new().method("PUT").url(url).data(data))
            .await
    }

    pub async fn patch(
        &self,
        url: impl Into<String>,
        data: Value,
    ) -> Result<ClientResponse<S>, ClientError<E>> {
        self.request(RequestConfig::new().method("PATCH").url(url).data(data))
            .await
    }
}

impl Default for UnreadyClient {
    fn default() -> Self {
        Self::new(MockSpec::default())
    }
}

/// Bind an optional mock and delay, returning a client stand-in.
pub fn unready_client<S, E>(mock: Option<MockSpec<S, E>>, delay_ms: Option<u64>) -> UnreadyClient<S, E>
where
    S: Clone + DeserializeOwned,
    E: Clone + DeserializeOwned,
{
    UnreadyClient::new(mock.unwrap_or_default()).with_delay(delay_from_ms(delay_ms))
}
