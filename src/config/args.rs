//! Command-line arguments for the lambda-local server
//!
//! This module defines the CLI arguments structure using clap.

use clap::Parser;
use std::path::PathBuf;

use super::defaults::*;

/// Command-line arguments for the lambda-local server
#[derive(Parser, Debug, Clone)]
#[command(name = "lambda-local")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(
    about = "Starts a local endpoint you can use to invoke your local Lambda functions"
)]
pub struct ServerArgs {
    /// Host to bind the invocation endpoint to
    #[arg(long, env = "LAMBDA_LOCAL_HOST", default_value = DEFAULT_HOST)]
    pub host: String,

    /// Port to bind the invocation endpoint to
    #[arg(short, long, env = "LAMBDA_LOCAL_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Deployment template describing the invocable functions
    #[arg(short, long, env = "LAMBDA_LOCAL_TEMPLATE", default_value = DEFAULT_TEMPLATE)]
    pub template: PathBuf,

    /// JSON file with per-function environment variable overrides,
    /// keyed by function name
    #[arg(long, env = "LAMBDA_LOCAL_ENV_VARS")]
    pub env_vars: Option<PathBuf>,

    /// Publish this port from the sandbox for a debugger to attach to.
    /// 0 disables debugging. While a debug-enabled invocation is running,
    /// further invokes of the same function wait for it to complete.
    #[arg(long, env = "LAMBDA_LOCAL_DEBUG_PORT", default_value_t = 0)]
    pub debug_port: u16,

    /// Extra arguments handed to the runtime's debugger entry point
    #[arg(
        long,
        env = "LAMBDA_LOCAL_DEBUG_ARGS",
        num_args = 0..,
        value_delimiter = ' ',
        allow_hyphen_values = true
    )]
    pub debug_args: Vec<String>,

    /// Base directory that relative code locations are resolved against
    #[arg(long, env = "LAMBDA_LOCAL_DOCKER_VOLUME_BASEDIR")]
    pub docker_volume_basedir: Option<PathBuf>,

    /// Docker network to attach invocation containers to
    #[arg(long, env = "LAMBDA_LOCAL_DOCKER_NETWORK")]
    pub docker_network: Option<String>,

    /// Redirect logs to this file instead of stderr
    #[arg(long, env = "LAMBDA_LOCAL_LOG_FILE")]
    pub log_file: Option<PathBuf>,

    /// Skip pulling runtime images before the first invocation
    #[arg(long, env = "LAMBDA_LOCAL_SKIP_PULL_IMAGE")]
    pub skip_pull_image: bool,

    /// Credential profile name exported into the sandbox
    #[arg(long, env = "LAMBDA_LOCAL_PROFILE")]
    pub profile: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LAMBDA_LOCAL_LOG_LEVEL", default_value = DEFAULT_LOG_LEVEL)]
    pub log_level: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = ServerArgs::parse_from(["lambda-local"]);
        assert_eq!(args.host, "127.0.0.1");
        assert_eq!(args.port, 3001);
        assert_eq!(args.template, PathBuf::from("template.yaml"));
        assert_eq!(args.debug_port, 0);
        assert!(!args.skip_pull_image);
    }

    #[test]
    fn test_explicit_flags() {
        let args = ServerArgs::parse_from([
            "lambda-local",
            "--host",
            "0.0.0.0",
            "--port",
            "3999",
            "--template",
            "sam.yaml",
            "--skip-pull-image",
        ]);
        assert_eq!(args.host, "0.0.0.0");
        assert_eq!(args.port, 3999);
        assert_eq!(args.template, PathBuf::from("sam.yaml"));
        assert!(args.skip_pull_image);
    }

    #[test]
    fn test_debug_args_split() {
        let args = ServerArgs::parse_from([
            "lambda-local",
            "--debug-port",
            "5890",
            "--debug-args",
            "--inspect-brk --port=5890",
        ]);
        assert_eq!(args.debug_port, 5890);
        assert_eq!(
            args.debug_args,
            vec!["--inspect-brk".to_string(), "--port=5890".to_string()]
        );
    }
}
