//! Execution engine interface.
//!
//! The dispatcher talks to the sandbox purely through [`ExecutionEngine`],
//! keeping protocol and dispatch logic independent of the concrete sandbox
//! technology. One sandbox session exists per invocation, owned by that
//! invocation and torn down when it completes, times out, or is cancelled;
//! a warmed container kept between invocations is an engine-private
//! optimization, never a contract of this interface.

pub mod container;

pub use container::{ContainerEngine, ContainerEngineConfig};

use crate::catalog::{DebugConfig, FunctionSpec};
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// One sandboxed run request.
#[derive(Debug, Clone)]
pub struct EngineRequest {
    /// Unique session identifier; `cancel` addresses the session by it.
    pub invocation_id: String,
    /// Function to execute.
    pub spec: Arc<FunctionSpec>,
    /// Raw invocation payload.
    pub payload: Bytes,
    /// Opaque client-context metadata, forwarded unmodified.
    pub client_context: Option<String>,
    /// Wall-clock budget for the run. The dispatcher also enforces this
    /// deadline externally; engines may use it to bound their own waits.
    pub timeout: Duration,
}

/// Output of a successful sandboxed run.
#[derive(Debug, Clone, Default)]
pub struct EngineOutput {
    /// Function return value.
    pub payload: Bytes,
    /// Raw log output captured from the sandbox.
    pub logs: Vec<u8>,
}

/// Typed execution failure.
///
/// `Application` means the function's own code failed and is reported back
/// to the client as a function error; `Infrastructure` means the sandbox
/// could not run the function at all. Neither is fatal to the server.
#[derive(Debug, Error, Clone)]
pub enum ExecutionError {
    #[error("{error_type}: {message}")]
    Application {
        error_type: String,
        message: String,
        stack_trace: Vec<String>,
        /// Logs emitted before the failure, if any were captured.
        logs: Vec<u8>,
    },
    #[error("sandbox failed to start: {0}")]
    Infrastructure(String),
}

impl ExecutionError {
    pub fn application(error_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Application {
            error_type: error_type.into(),
            message: message.into(),
            stack_trace: Vec::new(),
            logs: Vec::new(),
        }
    }

    pub fn infrastructure(reason: impl Into<String>) -> Self {
        Self::Infrastructure(reason.into())
    }
}

/// Sandbox backend consumed by the invocation dispatcher.
#[async_trait]
pub trait ExecutionEngine: Send + Sync {
    /// Run one invocation inside an isolated sandbox.
    async fn run(&self, request: EngineRequest) -> Result<EngineOutput, ExecutionError>;

    /// Best-effort teardown of a session that is still running, keyed by
    /// invocation id. Unknown ids are ignored.
    async fn cancel(&self, invocation_id: &str);
}

/// Debug settings for a request, if the function has them.
pub(crate) fn debug_config(request: &EngineRequest) -> Option<&DebugConfig> {
    request.spec.debug.as_ref()
}
