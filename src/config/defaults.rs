//! Default constants for lambda-local configuration.

/// Default bind host.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default bind port, matching the port SDK examples point at.
pub const DEFAULT_PORT: u16 = 3001;

/// Default deployment template location.
pub const DEFAULT_TEMPLATE: &str = "template.yaml";

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";
