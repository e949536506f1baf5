//! Outcome resolution for simulated calls.
//!
//! Decides, from a [`MockSpec`] alone, whether a call succeeds or fails and
//! which status and body it carries. Resolution is pure: the same spec
//! always yields the same [`Outcome`].

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Status used for successful outcomes when the mock does not set one.
pub const DEFAULT_SUCCESS_STATUS: u16 = 200;

/// Status used for error-only mocks when the mock does not set one.
pub const DEFAULT_ERROR_STATUS: u16 = 400;

/// Statuses at or above this threshold always fail.
pub const FAILURE_THRESHOLD: u16 = 400;

/// Caller-supplied description of the response a call should produce.
///
/// A spec is borrowed for the duration of each call and never consumed,
/// so one spec can back any number of calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MockSpec<S = Value, E = Value> {
    /// Body for successful outcomes
    #[serde(default)]
    pub success: Option<S>,

    /// Body for failed outcomes
    #[serde(default)]
    pub error: Option<E>,

    /// Explicit HTTP status, echoed verbatim
    #[serde(default)]
    pub status: Option<u16>,
}

impl<S, E> Default for MockSpec<S, E> {
    fn default() -> Self {
        Self {
            success: None,
            error: None,
            status: None,
        }
    }
}

impl<S, E> MockSpec<S, E> {
    /// Create an empty spec (default success body, status 200).
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the success body.
    pub fn with_success(mut self, success: S) -> Self {
        self.success = Some(success);
        self
    }

    /// Set the error body.
    pub fn with_error(mut self, error: E) -> Self {
        self.error = Some(error);
        self
    }

    /// Set the status code.
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }
}

/// Built-in bodies used when the mock leaves a payload out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultBody {
    Success,
    Error,
}

impl DefaultBody {
    /// Build the body. Keys keep the order written here.
    pub fn to_value(self) -> Value {
        match self {
            DefaultBody::Success => json!({
                "status": "success",
                "code": 200,
                "data": {
                    "id": 123,
                    "name": "Sample Data",
                },
                "errors": null,
            }),
            DefaultBody::Error => json!({
                "status": "error",
                "code": 400,
                "data": null,
                "errors": [
                    {
                        "field": "email",
                        "message": "Email is required",
                    }
                ],
                "trace_id": "abc123xyz",
            }),
        }
    }
}

/// Payload of an outcome: either borrowed from the mock or a built-in body.
#[derive(Debug, Clone, PartialEq)]
pub enum Body<'a, T> {
    Mocked(&'a T),
    Default(DefaultBody),
}

impl<T: Serialize> Body<'_, T> {
    /// Serialize the payload into a JSON value.
    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        match self {
            Body::Mocked(payload) => serde_json::to_value(payload),
            Body::Default(default) => Ok(default.to_value()),
        }
    }
}

impl<T: Clone + serde::de::DeserializeOwned> Body<'_, T> {
    /// Produce an owned payload of the mock's own type.
    ///
    /// Built-in bodies are converted through JSON, which fails when `T`
    /// cannot represent them.
    pub fn to_owned_payload(&self) -> Result<T, serde_json::Error> {
        match self {
            Body::Mocked(payload) => Ok((*payload).clone()),
            Body::Default(default) => serde_json::from_value(default.to_value()),
        }
    }
}

/// Resolved decision for one call.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<'a, S, E> {
    Success { status: u16, body: Body<'a, S> },
    Failure { status: u16, body: Body<'a, E> },
}

impl<S, E> Outcome<'_, S, E> {
    /// Status carried by the outcome.
    pub fn status(&self) -> u16 {
        match self {
            Outcome::Success { status, .. } | Outcome::Failure { status, .. } => *status,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success { .. })
    }
}

impl<S: Serialize, E: Serialize> Outcome<'_, S, E> {
    /// Serialize whichever body the outcome carries.
    pub fn body_value(&self) -> Result<Value, serde_json::Error> {
        match self {
            Outcome::Success { body, .. } => body.to_value(),
            Outcome::Failure { body, .. } => body.to_value(),
        }
    }
}

/// Decide the outcome of a call. First matching rule wins:
///
/// 1. `status >= 400` fails with the mocked error (or the default error body).
/// 2. An error without a success body fails with status `status` or 400.
/// 3. Anything else succeeds with the mocked success (or the default body)
///    and status `status` or 200.
pub fn resolve<S, E>(spec: &MockSpec<S, E>) -> Outcome<'_, S, E> {
    if let Some(status) = spec.status.filter(|s| *s >= FAILURE_THRESHOLD) {
        return Outcome::Failure {
            status,
            body: error_body(spec),
        };
    }

    if spec.success.is_none() && spec.error.is_some() {
        return Outcome::Failure {
            status: spec.status.unwrap_or(DEFAULT_ERROR_STATUS),
            body: error_body(spec),
        };
    }

    Outcome::Success {
        status: spec.status.unwrap_or(DEFAULT_SUCCESS_STATUS),
        body: match &spec.success {
            Some(success) => Body::Mocked(success),
            None => Body::Default(DefaultBody::Success),
        },
    }
}

fn error_body<S, E>(spec: &MockSpec<S, E>) -> Body<'_, E> {
    match &spec.error {
        Some(error) => Body::Mocked(error),
        None => Body::Default(DefaultBody::Error),
    }
}
