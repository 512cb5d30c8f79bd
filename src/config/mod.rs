//! Configuration module for lambda-local
//!
//! CLI arguments are parsed and validated into a plain [`ServiceConfig`]
//! before the server is constructed; the server itself takes no dependency
//! on command-line concerns.

mod args;
mod defaults;

pub use args::ServerArgs;
pub use defaults::*;

use crate::catalog::{DebugConfig, TemplateOptions};
use crate::engine::ContainerEngineConfig;
use crate::error::{LambdaError, Result};
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

/// Resolved startup configuration for the invocation service.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
    pub template: PathBuf,
    pub env_vars: Option<PathBuf>,
    pub debug_port: u16,
    pub debug_args: Vec<String>,
    pub docker_volume_basedir: Option<PathBuf>,
    pub docker_network: Option<String>,
    pub log_file: Option<PathBuf>,
    pub skip_pull_image: bool,
    pub profile: Option<String>,
    pub log_level: String,
}

impl ServiceConfig {
    /// Build the configuration from parsed CLI arguments.
    pub fn from_args(args: ServerArgs) -> Result<Self> {
        let config = Self {
            host: args.host,
            port: args.port,
            template: args.template,
            env_vars: args.env_vars,
            debug_port: args.debug_port,
            debug_args: args.debug_args,
            docker_volume_basedir: args.docker_volume_basedir,
            docker_network: args.docker_network,
            log_file: args.log_file,
            skip_pull_image: args.skip_pull_image,
            profile: args.profile,
            log_level: args.log_level,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        self.host
            .parse::<IpAddr>()
            .map_err(|_| LambdaError::Config(format!("invalid bind host '{}'", self.host)))?;
        if self.debug_port == 0 && !self.debug_args.is_empty() {
            return Err(LambdaError::Config(
                "--debug-args requires --debug-port".to_string(),
            ));
        }
        Ok(())
    }

    /// The socket address the server binds to.
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|_| LambdaError::Config(format!("invalid bind host '{}'", self.host)))?;
        Ok(SocketAddr::new(ip, self.port))
    }

    /// Template loading options derived from this configuration.
    pub fn template_options(&self) -> TemplateOptions {
        TemplateOptions {
            env_vars_file: self.env_vars.clone(),
            debug: DebugConfig::from_options(self.debug_port, &self.debug_args),
        }
    }

    /// Container engine settings derived from this configuration.
    pub fn engine_config(&self) -> ContainerEngineConfig {
        ContainerEngineConfig {
            volume_basedir: self.docker_volume_basedir.clone(),
            network: self.docker_network.clone(),
            skip_pull_image: self.skip_pull_image,
            profile: self.profile.clone(),
        }
    }
}
