//! Lambda Invoke API
//!
//! The wire surface of the service: a single route matching the real
//! platform's synchronous Invoke operation,
//! `POST /2015-03-31/functions/{FunctionName}/invocations`. The handler
//! validates the protocol subset this service supports, dispatches the
//! invocation, and encodes the result byte-for-byte compatibly: function
//! errors are a 200 with `X-Amz-Function-Error`, protocol errors a 4xx
//! with a `{"Message": ...}` body.

use crate::dispatch::{DispatchError, InvocationDispatcher};
use crate::protocol::{
    InvocationRequest, InvocationResult, InvocationType, LogType, ProtocolErrorBody,
    CLIENT_CONTEXT_HEADER, ERROR_TYPE_HEADER, FUNCTION_ERROR_HEADER, INVOCATION_TYPE_HEADER,
    LOG_RESULT_HEADER, LOG_TYPE_HEADER,
};
use axum::{
    body::Bytes,
    extract::{OriginalUri, Path, State},
    http::{header::CONTENT_TYPE, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use std::sync::Arc;
use tracing::debug;

/// Shared state for the invoke API.
#[derive(Clone)]
pub struct InvokeApiState {
    pub dispatcher: Arc<InvocationDispatcher>,
}

impl InvokeApiState {
    pub fn new(dispatcher: Arc<InvocationDispatcher>) -> Self {
        Self { dispatcher }
    }
}

/// Build the invoke router.
pub fn create_invoke_router(state: InvokeApiState) -> Router {
    Router::new()
        .route(
            "/2015-03-31/functions/:function_name/invocations",
            post(invoke_function).fallback(method_not_allowed),
        )
        .fallback(path_not_found)
        .with_state(state)
}

async fn invoke_function(
    State(state): State<InvokeApiState>,
    Path(function_name): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let request = match parse_request(function_name, &headers, body) {
        Ok(request) => request,
        Err(response) => return response,
    };

    match state.dispatcher.dispatch(request).await {
        Ok(result) => encode_result(&result),
        Err(DispatchError::FunctionNotFound { arn }) => protocol_error(
            StatusCode::NOT_FOUND,
            "ResourceNotFound",
            format!("Function not found: {arn}"),
        ),
    }
}

/// Validate the raw request into an [`InvocationRequest`].
fn parse_request(
    function_name: String,
    headers: &HeaderMap,
    body: Bytes,
) -> Result<InvocationRequest, Response> {
    let invocation_type = header_str(headers, INVOCATION_TYPE_HEADER);
    let invocation_type = InvocationType::from_header(invocation_type).map_err(|unsupported| {
        protocol_error(
            StatusCode::BAD_REQUEST,
            "UnsupportedInvocationType",
            format!(
                "invocation type '{unsupported}' is not supported; \
                 only 'RequestResponse' invocations can be executed locally"
            ),
        )
    })?;

    let log_type = LogType::from_header(header_str(headers, LOG_TYPE_HEADER));
    let client_context = header_str(headers, CLIENT_CONTEXT_HEADER).map(str::to_string);

    debug!(
        function = %function_name,
        log_type = ?log_type,
        payload_bytes = body.len(),
        "Parsed invoke request"
    );

    Ok(InvocationRequest {
        function_name,
        invocation_type,
        payload: body,
        client_context,
        log_type,
    })
}

/// Encode an invocation result into the wire response.
///
/// Both success and function error are HTTP 200; the platform signals
/// function errors via the `X-Amz-Function-Error` header, never via the
/// HTTP status.
fn encode_result(result: &InvocationResult) -> Response {
    let mut builder = Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, "application/json");

    if let Some(error_type) = &result.error_type {
        builder = builder.header(FUNCTION_ERROR_HEADER, error_type);
    }
    if let Some(tail) = &result.log_tail {
        builder = builder.header(LOG_RESULT_HEADER, BASE64.encode(tail));
    }

    builder
        .body(axum::body::Body::from(result.payload.clone()))
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}

/// Encode a protocol-level error response.
fn protocol_error(status: StatusCode, error_type: &str, message: String) -> Response {
    (
        status,
        [(ERROR_TYPE_HEADER, error_type.to_string())],
        Json(ProtocolErrorBody::new(message)),
    )
        .into_response()
}

async fn method_not_allowed(method: axum::http::Method) -> Response {
    protocol_error(
        StatusCode::METHOD_NOT_ALLOWED,
        "MethodNotAllowed",
        format!("method {method} is not allowed; invocations must use POST"),
    )
}

async fn path_not_found(OriginalUri(uri): OriginalUri) -> Response {
    protocol_error(
        StatusCode::NOT_FOUND,
        "PathNotFound",
        format!("Path not found: {}", uri.path()),
    )
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{FunctionCatalog, FunctionSpec};
    use crate::engine::{EngineOutput, EngineRequest, ExecutionEngine, ExecutionError};
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use std::collections::BTreeMap;
    use tower::ServiceExt;

    struct EchoEngine;

    #[async_trait]
    impl ExecutionEngine for EchoEngine {
        async fn run(&self, request: EngineRequest) -> Result<EngineOutput, ExecutionError> {
            Ok(EngineOutput {
                payload: request.payload,
                logs: b"START RequestId\nEND\n".to_vec(),
            })
        }

        async fn cancel(&self, _invocation_id: &str) {}
    }

    fn test_app() -> Router {
        let spec = FunctionSpec {
            name: "Echo".to_string(),
            handler: "app.handler".to_string(),
            runtime: "python3.12".to_string(),
            memory_mb: 128,
            timeout_secs: 3,
            env_vars: BTreeMap::new(),
            code_uri: ".".to_string(),
            debug: None,
        };
        let dispatcher = InvocationDispatcher::new(
            Arc::new(FunctionCatalog::from_specs(vec![spec])),
            Arc::new(EchoEngine),
        );
        create_invoke_router(InvokeApiState::new(Arc::new(dispatcher)))
    }

    #[tokio::test]
    async fn test_invoke_echo() {
        let app = test_app();
        let resp = app
            .oneshot(
                Request::post("/2015-03-31/functions/Echo/invocations")
                    .body(Body::from(r#"{"x":1}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(resp.headers().get(FUNCTION_ERROR_HEADER).is_none());
        let body = axum::body::to_bytes(resp.into_body(), 50_000).await.unwrap();
        assert_eq!(&body[..], br#"{"x":1}"#);
    }

    #[tokio::test]
    async fn test_invoke_unknown_path() {
        let app = test_app();
        let resp = app
            .oneshot(
                Request::post("/not/the/invoke/path")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body = axum::body::to_bytes(resp.into_body(), 50_000).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert!(json["Message"].as_str().unwrap().contains("/not/the/invoke/path"));
    }

    #[tokio::test]
    async fn test_invoke_wrong_method() {
        let app = test_app();
        let resp = app
            .oneshot(
                Request::get("/2015-03-31/functions/Echo/invocations")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(
            resp.headers().get(ERROR_TYPE_HEADER).unwrap(),
            "MethodNotAllowed"
        );
        let body = axum::body::to_bytes(resp.into_body(), 50_000).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert!(json["Message"].as_str().unwrap().contains("POST"));
    }

    #[tokio::test]
    async fn test_invoke_event_type_rejected() {
        let app = test_app();
        let resp = app
            .oneshot(
                Request::post("/2015-03-31/functions/Echo/invocations")
                    .header("x-amz-invocation-type", "Event")
                    .body(Body::from("{}"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            resp.headers().get(ERROR_TYPE_HEADER).unwrap(),
            "UnsupportedInvocationType"
        );
    }

    #[tokio::test]
    async fn test_invoke_log_tail_header() {
        let app = test_app();
        let resp = app
            .oneshot(
                Request::post("/2015-03-31/functions/Echo/invocations")
                    .header("x-amz-log-type", "Tail")
                    .body(Body::from("{}"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let header = resp.headers().get(LOG_RESULT_HEADER).unwrap();
        let decoded = BASE64.decode(header.as_bytes()).unwrap();
        assert_eq!(decoded, b"START RequestId\nEND\n");
    }

    #[tokio::test]
    async fn test_invoke_unknown_function() {
        let app = test_app();
        let resp = app
            .oneshot(
                Request::post("/2015-03-31/functions/Ghost/invocations")
                    .body(Body::from("{}"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body = axum::body::to_bytes(resp.into_body(), 50_000).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert!(json["Message"].as_str().unwrap().contains("Ghost"));
    }
}
