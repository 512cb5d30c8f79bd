//! HTTP server for the local Invoke endpoint.

pub mod http;
pub mod invoke_api;

pub use http::start_invoke_server;
pub use invoke_api::{create_invoke_router, InvokeApiState};
