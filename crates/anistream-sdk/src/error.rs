//! Error normalization for the AniStream client
//!
//! Every failure the client can observe (an HTTP error response, a timeout, a
//! transport error, an arbitrary JSON error shape) is folded into one
//! [`ApiError`] with a code from a closed set. The normalizer never fails and
//! is idempotent: normalizing an [`ApiError`] hands it back unchanged.

use reqwest::Response;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, ApiError>;

/// Closed classification of normalized failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Missing, expired or invalid credential (401)
    Unauthorized,
    /// Authenticated but not permitted (403)
    Forbidden,
    /// Any 5xx response
    ServerError,
    /// Transport deadline exceeded
    Timeout,
    /// Any other failed request
    RequestFailed,
    /// Nothing structured to go on
    UnknownError,
}

impl ErrorCode {
    /// Wire representation of the code
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::Unauthorized => "unauthorized",
            ErrorCode::Forbidden => "forbidden",
            ErrorCode::ServerError => "server_error",
            ErrorCode::Timeout => "timeout",
            ErrorCode::RequestFailed => "request_failed",
            ErrorCode::UnknownError => "unknown_error",
        }
    }

    /// Message used when the server does not supply one
    pub fn default_message(&self) -> &'static str {
        match self {
            ErrorCode::Unauthorized => "Session expired. Please sign in again.",
            ErrorCode::Forbidden => "Access denied.",
            ErrorCode::ServerError => "Something went wrong on our side. Please try again.",
            ErrorCode::Timeout => "Request timed out. Please retry.",
            ErrorCode::RequestFailed => "Request failed. Please try again.",
            ErrorCode::UnknownError => "Unexpected error occurred.",
        }
    }

    /// Parse a wire code; unknown strings yield `None`
    pub fn parse(code: &str) -> Option<Self> {
        match code {
            "unauthorized" => Some(ErrorCode::Unauthorized),
            "forbidden" => Some(ErrorCode::Forbidden),
            "server_error" => Some(ErrorCode::ServerError),
            "timeout" => Some(ErrorCode::Timeout),
            "request_failed" => Some(ErrorCode::RequestFailed),
            "unknown_error" => Some(ErrorCode::UnknownError),
            _ => None,
        }
    }

    /// Classify by HTTP status alone
    pub fn from_status(status: u16) -> Self {
        match status {
            401 => ErrorCode::Unauthorized,
            403 => ErrorCode::Forbidden,
            s if s >= 500 => ErrorCode::ServerError,
            _ => ErrorCode::RequestFailed,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of one failure instance.
///
/// Clones of an [`ApiError`] share the marker, so a failure that surfaces
/// through several call sites is only acted on once.
#[derive(Clone, Default)]
struct FailureMarker(Arc<AtomicBool>);

impl FailureMarker {
    /// Returns `true` only for the first caller
    fn mark_handled(&self) -> bool {
        !self.0.swap(true, Ordering::AcqRel)
    }

    fn is_handled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

impl fmt::Debug for FailureMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("FailureMarker").field(&self.is_handled()).finish()
    }
}

/// Normalized API error
///
/// `code` carries the server-supplied code verbatim when there is one;
/// [`ApiError::kind`] is always one of the closed [`ErrorCode`] set.
#[derive(Debug, Clone, Error, Serialize)]
#[error("{message}")]
pub struct ApiError {
    code: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Value>,
    #[serde(skip)]
    kind: ErrorCode,
    #[serde(skip)]
    marker: FailureMarker,
}

impl PartialEq for ApiError {
    fn eq(&self, other: &Self) -> bool {
        self.code == other.code
            && self.message == other.message
            && self.status == other.status
            && self.details == other.details
            && self.kind == other.kind
    }
}

impl ApiError {
    /// Build an error from its parts
    pub fn new(kind: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code: kind.as_str().to_string(),
            message: message.into(),
            status: None,
            details: None,
            kind,
            marker: FailureMarker::default(),
        }
    }

    /// Attach an HTTP status
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Terminal session failure surfaced by the refresh path
    pub fn session_expired() -> Self {
        Self::new(ErrorCode::Unauthorized, "Session expired").with_status(401)
    }

    /// Code as reported, possibly server-defined
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Closed classification
    pub fn kind(&self) -> ErrorCode {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn status(&self) -> Option<u16> {
        self.status
    }

    pub fn details(&self) -> Option<&Value> {
        self.details.as_ref()
    }

    /// Whether this failure calls for re-authentication
    pub fn is_auth_failure(&self) -> bool {
        matches!(self.status, Some(401) | Some(403))
    }

    /// Whether this exact failure instance was already broadcast
    pub fn is_handled(&self) -> bool {
        self.marker.is_handled()
    }

    /// Mark this failure instance handled; `true` if it was not before
    pub(crate) fn mark_handled(&self) -> bool {
        self.marker.mark_handled()
    }
}

/// Raw failure as observed by the client, before normalization
#[derive(Debug, Clone)]
pub enum Failure {
    /// The server answered with a non-success status
    Response {
        status: u16,
        body: Option<Value>,
        message: Option<String>,
    },
    /// No response within the transport deadline
    Timeout { message: String },
    /// No response for any other reason (connect, decode, ...)
    Transport { message: String },
    /// Already normalized
    Normalized(ApiError),
    /// Arbitrary error value, normalized by shape
    Value(Value),
    /// Nothing known
    Unknown,
}

impl Failure {
    /// Capture a failed response, consuming its body
    pub async fn from_response(response: Response) -> Self {
        let status = response.status();
        let body = response
            .text()
            .await
            .ok()
            .and_then(|text| serde_json::from_str::<Value>(&text).ok());

        Failure::Response {
            status: status.as_u16(),
            body,
            message: Some(format!(
                "Request failed with status code {}",
                status.as_u16()
            )),
        }
    }

    /// HTTP status, when a response was received
    pub fn status(&self) -> Option<u16> {
        match self {
            Failure::Response { status, .. } => Some(*status),
            Failure::Normalized(err) => err.status(),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for Failure {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Failure::Timeout {
                message: err.to_string(),
            }
        } else if let Some(status) = err.status() {
            Failure::Response {
                status: status.as_u16(),
                body: None,
                message: Some(err.to_string()),
            }
        } else {
            Failure::Transport {
                message: err.to_string(),
            }
        }
    }
}

impl From<ApiError> for Failure {
    fn from(err: ApiError) -> Self {
        Failure::Normalized(err)
    }
}

impl From<Value> for Failure {
    fn from(value: Value) -> Self {
        Failure::Value(value)
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        normalize(err)
    }
}

/// Server-supplied overrides read from an error body
struct ErrorBody<'a> {
    code: Option<&'a str>,
    message: Option<&'a str>,
    details: Option<&'a Value>,
}

impl<'a> ErrorBody<'a> {
    fn read(body: Option<&'a Value>) -> Self {
        let field = |name: &str| body.and_then(|b| b.get(name));
        Self {
            code: field("code").and_then(Value::as_str).filter(|s| !s.is_empty()),
            message: field("message")
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty()),
            details: field("details").filter(|d| !d.is_null()),
        }
    }
}

/// Normalize any failure into an [`ApiError`]
pub fn normalize(failure: impl Into<Failure>) -> ApiError {
    match failure.into() {
        Failure::Normalized(err) => err,
        Failure::Response {
            status,
            body,
            message,
        } => from_response(status, body.as_ref(), message.as_deref()),
        Failure::Timeout { .. } => {
            ApiError::new(ErrorCode::Timeout, ErrorCode::Timeout.default_message())
        }
        Failure::Transport { message } => ApiError::new(
            ErrorCode::RequestFailed,
            if message.is_empty() {
                ErrorCode::RequestFailed.default_message().to_string()
            } else {
                message
            },
        ),
        Failure::Value(value) => from_value(value),
        Failure::Unknown => unknown(),
    }
}

fn from_response(status: u16, body: Option<&Value>, transport_message: Option<&str>) -> ApiError {
    let kind = ErrorCode::from_status(status);
    let overrides = ErrorBody::read(body);

    let message = match (overrides.message, kind) {
        (Some(message), _) => message.to_string(),
        (None, ErrorCode::RequestFailed) => transport_message
            .filter(|m| !m.is_empty())
            .unwrap_or(kind.default_message())
            .to_string(),
        (None, _) => kind.default_message().to_string(),
    };

    let mut err = ApiError::new(kind, message).with_status(status);
    if let Some(code) = overrides.code {
        err.code = code.to_string();
    }
    if let Some(details) = overrides.details {
        err.details = Some(details.clone());
    }
    err
}

/// Anything carrying string `code` and `message` is taken as already normalized
fn from_value(value: Value) -> ApiError {
    let code = value.get("code").and_then(Value::as_str);
    let message = value.get("message").and_then(Value::as_str);

    match (code, message) {
        (Some(code), Some(message)) if !code.is_empty() && !message.is_empty() => {
            let status = value
                .get("status")
                .and_then(Value::as_u64)
                .and_then(|s| u16::try_from(s).ok());
            let kind = ErrorCode::parse(code)
                .or_else(|| status.map(ErrorCode::from_status))
                .unwrap_or(ErrorCode::UnknownError);

            let mut err = ApiError::new(kind, message);
            err.code = code.to_string();
            err.status = status;
            err.details = value.get("details").filter(|d| !d.is_null()).cloned();
            err
        }
        _ => unknown(),
    }
}

fn unknown() -> ApiError {
    ApiError::new(
        ErrorCode::UnknownError,
        ErrorCode::UnknownError.default_message(),
    )
}
