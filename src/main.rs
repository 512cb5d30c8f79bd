//! lambda-local - local Lambda Invoke endpoint
//!
//! Thin CLI entry point: parse and validate startup configuration, load the
//! function catalog (fatal on template errors, before any socket is bound),
//! then run the invocation server until terminated.

use clap::Parser;
use lambda_local::{
    start_invoke_server, ContainerEngine, FunctionCatalog, InvocationDispatcher, LambdaError,
    Result, ServerArgs, ServiceConfig,
};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    if let Err(e) = run() {
        eprintln!("lambda-local failed to start: {e}");
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn run() -> Result<()> {
    let args = ServerArgs::parse();
    let config = ServiceConfig::from_args(args)?;

    init_logging(&config)?;

    // Load the catalog before binding: an invalid template must prevent
    // startup and surface its validation message to the user.
    let catalog = FunctionCatalog::load(&config.template, &config.template_options())?;
    info!(
        template = %config.template.display(),
        functions = catalog.len(),
        "Function catalog loaded"
    );
    for name in catalog.names() {
        info!(function = %name, "Function available for invocation");
    }

    let addr = config.socket_addr()?;
    let engine = Arc::new(ContainerEngine::new(config.engine_config()));
    let dispatcher = Arc::new(InvocationDispatcher::new(Arc::new(catalog), engine));

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| LambdaError::Config(format!("failed to create Tokio runtime: {e}")))?;

    runtime.block_on(start_invoke_server(addr, dispatcher))
}

fn init_logging(config: &ServiceConfig) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    match &config.log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Arc::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt().with_env_filter(filter).init();
        }
    }
    Ok(())
}
