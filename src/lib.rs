//! lambda-local - a local Lambda Invoke endpoint
//!
//! Emulates the synchronous Invoke operation of AWS Lambda on a developer's
//! machine: clients built on the official SDK/CLI point their endpoint URL
//! at this server and invoke functions defined in a local deployment
//! template. Responses are wire-compatible with the real Invoke API,
//! including error-shape and log-tail semantics.
//!
//! # Architecture
//!
//! ```text
//! client request
//!    │
//!    ▼
//! ┌──────────────┐   ┌────────────────────┐   ┌──────────────────┐
//! │ Invoke API   │──▶│ Invocation         │──▶│ Execution Engine │
//! │ (router +    │   │ Dispatcher         │   │ (one sandbox per │
//! │  encoder)    │◀──│ (lookup, timeout,  │◀──│  invocation)     │
//! └──────────────┘   │  debug lock)       │   └──────────────────┘
//!                    └────────────────────┘
//!                              │
//!                       ┌──────┴────────┐
//!                       │ Function      │
//!                       │ Catalog       │
//!                       └───────────────┘
//! ```
//!
//! The catalog is read-only after load. Invocations of different functions,
//! or of the same function without debugging enabled, execute fully in
//! parallel; debug-enabled invocations of one function serialize on a
//! per-function lock because a debugger can attach to only one sandbox.

pub mod catalog;
pub mod config;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod protocol;
pub mod server;

pub use catalog::{DebugConfig, FunctionCatalog, FunctionSpec, TemplateOptions};
pub use config::{ServerArgs, ServiceConfig};
pub use dispatch::InvocationDispatcher;
pub use engine::{ContainerEngine, ContainerEngineConfig, ExecutionEngine};
pub use error::{LambdaError, Result, ServerError, TemplateError};
pub use server::{create_invoke_router, start_invoke_server, InvokeApiState};
