//! Error types for lambda-local
//!
//! This module defines the main error types used throughout the service.
//! Invocation-level failures (function errors, timeouts, sandbox failures)
//! are represented separately in [`crate::engine::ExecutionError`] because
//! they are recovered into wire responses and never propagate as server
//! faults; the types here cover startup and listener failures.

use thiserror::Error;

/// Result type alias for lambda-local operations
pub type Result<T> = std::result::Result<T, LambdaError>;

/// Structured template error domain.
///
/// All variants are fatal to startup: an invalid template must prevent the
/// listener from binding, and the underlying validation message must reach
/// the user unchanged.
#[derive(Debug, Error, Clone)]
pub enum TemplateError {
    #[error("template not found: {path}")]
    NotFound { path: String },
    #[error("{path}: {reason}")]
    Parse { path: String, reason: String },
    #[error("function '{name}': {reason}")]
    InvalidFunction { name: String, reason: String },
    #[error("env vars file {path}: {reason}")]
    EnvVarsFile { path: String, reason: String },
    #[error("{0}")]
    Message(String),
}

impl TemplateError {
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound { path: path.into() }
    }

    pub fn parse(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Parse {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_function(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidFunction {
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub fn env_vars_file(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::EnvVarsFile {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

impl From<String> for TemplateError {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}

impl From<&str> for TemplateError {
    fn from(value: &str) -> Self {
        Self::Message(value.to_string())
    }
}

/// Structured server error domain
#[derive(Debug, Error, Clone)]
pub enum ServerError {
    #[error("bind failed on {address}: {reason}")]
    BindFailed { address: String, reason: String },
    #[error("connection error: {0}")]
    ConnectionError(String),
    #[error("{0}")]
    Message(String),
}

impl ServerError {
    pub fn bind_failed(address: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::BindFailed {
            address: address.into(),
            reason: reason.into(),
        }
    }

    pub fn connection(detail: impl Into<String>) -> Self {
        Self::ConnectionError(detail.into())
    }
}

impl From<String> for ServerError {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}

impl From<&str> for ServerError {
    fn from(value: &str) -> Self {
        Self::Message(value.to_string())
    }
}

/// Main error type for lambda-local
#[derive(Error, Debug)]
pub enum LambdaError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Template error: {0}")]
    Template(#[from] TemplateError),

    #[error("Server error: {0}")]
    Server(#[from] ServerError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for LambdaError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization(value.to_string())
    }
}
