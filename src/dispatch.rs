//! Invocation dispatcher.
//!
//! Looks the target function up in the catalog, enforces the per-function
//! debug serialization and the configured timeout, invokes the execution
//! engine, and maps every outcome into an [`InvocationResult`]. Engine
//! failures are recovered per-invocation; nothing here terminates the
//! server or other in-flight invocations.

use crate::catalog::FunctionCatalog;
use crate::engine::{EngineRequest, ExecutionEngine, ExecutionError};
use crate::protocol::{
    function_arn, ErrorBody, InvocationRequest, InvocationResult,
};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Error type reported when the sandbox cannot start the function.
pub const ERROR_TYPE_FAILED_TO_START: &str = "Sandbox.FailedToStart";
/// Error type reported when the function outlives its configured timeout.
pub const ERROR_TYPE_TIMEOUT: &str = "Sandbox.Timeout";

/// Dispatch-level failure surfaced as a protocol response, not a function
/// error.
#[derive(Debug, Error, Clone)]
pub enum DispatchError {
    #[error("Function not found: {arn}")]
    FunctionNotFound { arn: String },
}

impl DispatchError {
    pub fn function_not_found(identifier: &str) -> Self {
        Self::FunctionNotFound {
            arn: function_arn(crate::protocol::extract_function_name(identifier)),
        }
    }
}

/// Routes validated invoke requests into the execution engine.
pub struct InvocationDispatcher {
    catalog: Arc<FunctionCatalog>,
    engine: Arc<dyn ExecutionEngine>,
    /// Per-function debug locks, created lazily. Each lock covers only the
    /// sandbox execution of debug-enabled invocations; non-debug
    /// invocations never touch it.
    debug_locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl InvocationDispatcher {
    pub fn new(catalog: Arc<FunctionCatalog>, engine: Arc<dyn ExecutionEngine>) -> Self {
        Self {
            catalog,
            engine,
            debug_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Dispatch one invocation and produce its wire-encodable result.
    pub async fn dispatch(
        &self,
        request: InvocationRequest,
    ) -> Result<InvocationResult, DispatchError> {
        let spec = self
            .catalog
            .resolve(&request.function_name)
            .ok_or_else(|| {
                warn!(function = %request.function_name, "Invoke of unknown function");
                DispatchError::function_not_found(&request.function_name)
            })?;

        let invocation_id = Uuid::new_v4().to_string();
        let engine_request = EngineRequest {
            invocation_id: invocation_id.clone(),
            spec: spec.clone(),
            payload: request.payload.clone(),
            client_context: request.client_context.clone(),
            timeout: spec.timeout(),
        };

        // Serialize debug-enabled invocations of the same function: a single
        // debugger can attach to only one sandbox on the fixed port. The
        // guard is held across the engine call only and released on every
        // exit path when it drops.
        let _debug_guard = if spec.debug_enabled() {
            let lock = self.debug_lock_for(&spec.name);
            debug!(function = %spec.name, "Waiting for debug lock");
            Some(lock.lock_owned().await)
        } else {
            None
        };

        info!(
            function = %spec.name,
            invocation = %invocation_id,
            payload_bytes = request.payload.len(),
            "Invoking function"
        );

        let outcome =
            tokio::time::timeout(spec.timeout(), self.engine.run(engine_request)).await;

        let result = match outcome {
            Ok(Ok(output)) => {
                debug!(
                    function = %spec.name,
                    invocation = %invocation_id,
                    output_bytes = output.payload.len(),
                    "Invocation succeeded"
                );
                InvocationResult::success(output.payload, &output.logs, request.log_type)
            }
            Ok(Err(ExecutionError::Application {
                error_type,
                message,
                stack_trace,
                logs,
            })) => {
                debug!(
                    function = %spec.name,
                    invocation = %invocation_id,
                    error_type = %error_type,
                    "Function reported an error"
                );
                let body = ErrorBody::new(&error_type, message).with_stack_trace(stack_trace);
                InvocationResult::function_error(error_type, &body, &logs, request.log_type)
            }
            Ok(Err(ExecutionError::Infrastructure(reason))) => {
                error!(
                    function = %spec.name,
                    invocation = %invocation_id,
                    reason = %reason,
                    "Sandbox failed to start"
                );
                let body = ErrorBody::new(ERROR_TYPE_FAILED_TO_START, reason);
                InvocationResult::function_error(
                    ERROR_TYPE_FAILED_TO_START,
                    &body,
                    &[],
                    request.log_type,
                )
            }
            Err(_elapsed) => {
                warn!(
                    function = %spec.name,
                    invocation = %invocation_id,
                    timeout_secs = spec.timeout_secs,
                    "Invocation timed out; cancelling sandbox"
                );
                self.engine.cancel(&invocation_id).await;
                let body = ErrorBody::new(
                    ERROR_TYPE_TIMEOUT,
                    format!(
                        "Function '{}' timed out after {} seconds",
                        spec.name, spec.timeout_secs
                    ),
                );
                InvocationResult::function_error(ERROR_TYPE_TIMEOUT, &body, &[], request.log_type)
            }
        };

        Ok(result)
    }

    fn debug_lock_for(&self, function_name: &str) -> Arc<tokio::sync::Mutex<()>> {
        self.debug_locks
            .lock()
            .entry(function_name.to_string())
            .or_default()
            .clone()
    }
}
