//! Invocation server startup.
//!
//! Binds the configured host:port and serves the invoke router. One task
//! per request; an executing invocation never blocks the accept loop. By
//! the time this runs, the catalog has already loaded successfully — a
//! template failure is fatal before any socket is bound.

use crate::dispatch::InvocationDispatcher;
use crate::error::{Result, ServerError};
use crate::server::invoke_api::{create_invoke_router, InvokeApiState};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

/// Start the local invocation server. Runs until the process is terminated.
pub async fn start_invoke_server(
    addr: SocketAddr,
    dispatcher: Arc<InvocationDispatcher>,
) -> Result<()> {
    let app = create_invoke_router(InvokeApiState::new(dispatcher));

    let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e| {
        let reason = if e.kind() == std::io::ErrorKind::AddrInUse {
            format!(
                "port {} is already in use. Fix: pass --port to pick a different port, \
                 or stop the existing process",
                addr.port()
            )
        } else {
            e.to_string()
        };
        ServerError::bind_failed(addr.to_string(), reason)
    })?;

    info!(addr = %addr, "Local Lambda invocation endpoint listening");
    info!(
        "Invoke with: aws lambda invoke --function-name <name> --endpoint-url http://{addr} out.json"
    );

    axum::serve(listener, app)
        .await
        .map_err(|e| ServerError::connection(e.to_string()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::FunctionCatalog;
    use crate::engine::{EngineOutput, EngineRequest, ExecutionEngine, ExecutionError};
    use async_trait::async_trait;

    struct NullEngine;

    #[async_trait]
    impl ExecutionEngine for NullEngine {
        async fn run(
            &self,
            _request: EngineRequest,
        ) -> std::result::Result<EngineOutput, ExecutionError> {
            Ok(EngineOutput::default())
        }

        async fn cancel(&self, _invocation_id: &str) {}
    }

    #[tokio::test]
    async fn test_bind_failure_is_reported() {
        let holder = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = holder.local_addr().unwrap();

        let dispatcher = Arc::new(InvocationDispatcher::new(
            Arc::new(FunctionCatalog::from_specs(Vec::new())),
            Arc::new(NullEngine),
        ));
        let err = start_invoke_server(addr, dispatcher).await.unwrap_err();
        assert!(err.to_string().contains("already in use"));
    }
}
