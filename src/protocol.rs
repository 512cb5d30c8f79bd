//! Invoke API wire protocol types
//!
//! Types and constants shared by the request router and the response
//! encoder. The shapes here mirror the real Lambda Invoke API: success
//! responses carry the function's return value verbatim, function errors
//! are signalled with the `X-Amz-Function-Error` header on a 200 response,
//! and protocol-level errors use a `{"Message": ...}` JSON body.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Request header selecting the invocation type.
pub const INVOCATION_TYPE_HEADER: &str = "x-amz-invocation-type";
/// Request header selecting log capture ("Tail" or "None").
pub const LOG_TYPE_HEADER: &str = "x-amz-log-type";
/// Request header carrying opaque client-context metadata.
pub const CLIENT_CONTEXT_HEADER: &str = "x-amz-client-context";
/// Response header present only when the function itself failed.
pub const FUNCTION_ERROR_HEADER: &str = "x-amz-function-error";
/// Response header carrying the base64-encoded log tail.
pub const LOG_RESULT_HEADER: &str = "x-amz-log-result";
/// Response header naming the protocol error class on 4xx responses.
pub const ERROR_TYPE_HEADER: &str = "x-amzn-errortype";

/// The only invocation type token the local service supports.
pub const INVOCATION_TYPE_REQUEST_RESPONSE: &str = "RequestResponse";

/// Maximum number of log-tail bytes returned in `X-Amz-Log-Result`.
pub const LOG_TAIL_MAX_BYTES: usize = 4096;

/// Invocation type requested by the client.
///
/// Only the synchronous request-response type is supported locally; any
/// other token is a client error, never silently accepted and dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InvocationType {
    #[default]
    RequestResponse,
}

impl InvocationType {
    /// Parse the `X-Amz-Invocation-Type` header value.
    ///
    /// A missing header defaults to `RequestResponse`. An unsupported token
    /// is returned in the error so the response can name it.
    pub fn from_header(value: Option<&str>) -> std::result::Result<Self, String> {
        match value {
            None => Ok(Self::RequestResponse),
            Some(v) if v == INVOCATION_TYPE_REQUEST_RESPONSE => Ok(Self::RequestResponse),
            Some(other) => Err(other.to_string()),
        }
    }
}

/// Log capture mode requested by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogType {
    #[default]
    None,
    Tail,
}

impl LogType {
    /// Parse the `X-Amz-Log-Type` header value. Anything other than the
    /// literal "Tail" is treated as `None`.
    pub fn from_header(value: Option<&str>) -> Self {
        match value {
            Some("Tail") => Self::Tail,
            _ => Self::None,
        }
    }
}

/// A validated invoke request, produced by the request router.
#[derive(Debug, Clone)]
pub struct InvocationRequest {
    /// Target function identifier (bare name or full ARN).
    pub function_name: String,
    /// Always `RequestResponse`; other types are rejected at the router.
    pub invocation_type: InvocationType,
    /// Raw invocation payload. May be empty.
    pub payload: Bytes,
    /// Opaque client-context metadata, passed through unmodified.
    pub client_context: Option<String>,
    /// Whether the client asked for the log tail.
    pub log_type: LogType,
}

impl InvocationRequest {
    /// Build a synchronous request with no client context or log capture.
    pub fn new(function_name: impl Into<String>, payload: impl Into<Bytes>) -> Self {
        Self {
            function_name: function_name.into(),
            invocation_type: InvocationType::RequestResponse,
            payload: payload.into(),
            client_context: None,
            log_type: LogType::None,
        }
    }

    pub fn with_log_type(mut self, log_type: LogType) -> Self {
        self.log_type = log_type;
        self
    }
}

/// Outcome status of a dispatched invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvocationStatus {
    Success,
    FunctionError,
}

/// Result of one dispatched invocation, ready for wire encoding.
#[derive(Debug, Clone)]
pub struct InvocationResult {
    pub status: InvocationStatus,
    /// Function return value, or the structured error body.
    pub payload: Bytes,
    /// Error type for the `X-Amz-Function-Error` header. Present only when
    /// status is `FunctionError`.
    pub error_type: Option<String>,
    /// Truncated log tail. `None` when the client did not request capture.
    pub log_tail: Option<Vec<u8>>,
}

impl InvocationResult {
    pub fn success(payload: Bytes, logs: &[u8], log_type: LogType) -> Self {
        Self {
            status: InvocationStatus::Success,
            payload,
            error_type: None,
            log_tail: capture_log_tail(logs, log_type),
        }
    }

    pub fn function_error(
        error_type: impl Into<String>,
        body: &ErrorBody,
        logs: &[u8],
        log_type: LogType,
    ) -> Self {
        Self {
            status: InvocationStatus::FunctionError,
            payload: Bytes::from(body.to_json()),
            error_type: Some(error_type.into()),
            log_tail: capture_log_tail(logs, log_type),
        }
    }
}

/// Structured function error body, matching the platform's
/// `Unhandled`/`Handled` error shapes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub error_message: String,
    pub error_type: String,
    #[serde(default)]
    pub stack_trace: Vec<String>,
}

impl ErrorBody {
    pub fn new(error_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error_message: message.into(),
            error_type: error_type.into(),
            stack_trace: Vec::new(),
        }
    }

    pub fn with_stack_trace(mut self, stack_trace: Vec<String>) -> Self {
        self.stack_trace = stack_trace;
        self
    }

    /// Serialize to the wire JSON shape.
    pub fn to_json(&self) -> Vec<u8> {
        // Serialization of a plain struct with string fields cannot fail.
        serde_json::to_vec(self).unwrap_or_default()
    }
}

/// Protocol-level error body (`{"Message": ...}`), used for 4xx responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProtocolErrorBody {
    #[serde(rename = "Message")]
    pub message: String,
}

impl ProtocolErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Keep at most [`LOG_TAIL_MAX_BYTES`] of the *most recent* log output.
pub fn truncate_log_tail(logs: &[u8]) -> Vec<u8> {
    let start = logs.len().saturating_sub(LOG_TAIL_MAX_BYTES);
    logs[start..].to_vec()
}

fn capture_log_tail(logs: &[u8], log_type: LogType) -> Option<Vec<u8>> {
    match log_type {
        LogType::Tail => Some(truncate_log_tail(logs)),
        LogType::None => None,
    }
}

/// Extract the bare function name from an identifier that may be a full
/// `arn:aws:lambda:<region>:<account>:function:<name>[:qualifier]` ARN.
pub fn extract_function_name(identifier: &str) -> &str {
    if !identifier.starts_with("arn:") {
        return identifier;
    }
    let parts: Vec<&str> = identifier.split(':').collect();
    match parts.get(5) {
        Some(&"function") => parts.get(6).copied().unwrap_or(identifier),
        _ => identifier,
    }
}

/// Render the ARN-like name used in protocol error messages.
pub fn function_arn(name: &str) -> String {
    format!("arn:aws:lambda:us-east-1:012345678901:function:{name}")
}
