//! Function specification types.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Debugger attachment settings for a function.
///
/// A single debugger can attach to only one sandboxed process on a fixed
/// port, so at most one in-flight invocation may hold an active debug
/// session per function; the dispatcher serializes the rest behind it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebugConfig {
    /// Port published from the sandbox for the debugger to attach to.
    pub port: u16,
    /// Extra arguments forwarded to the runtime's debug entry point.
    #[serde(default)]
    pub args: Vec<String>,
}

impl DebugConfig {
    /// Build a debug config from CLI inputs. A port of 0 means disabled.
    pub fn from_options(port: u16, args: &[String]) -> Option<Self> {
        if port == 0 {
            return None;
        }
        Some(Self {
            port,
            args: args.to_vec(),
        })
    }
}

/// Specification of one locally-defined function.
///
/// Immutable once loaded from the deployment template; the catalog hands
/// out shared references for the lifetime of the server process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionSpec {
    /// Logical function identifier, unique within the catalog.
    pub name: String,
    /// Handler reference, e.g. `app.lambda_handler`.
    pub handler: String,
    /// Runtime identifier, e.g. `python3.12` or `nodejs20.x`.
    pub runtime: String,
    /// Memory size in megabytes.
    pub memory_mb: u32,
    /// Invocation timeout in whole seconds. Always > 0.
    pub timeout_secs: u64,
    /// Environment variables, in declaration order.
    #[serde(default)]
    pub env_vars: BTreeMap<String, String>,
    /// Code artifact location (directory or archive path).
    pub code_uri: String,
    /// Debugger settings; `None` when debugging is disabled.
    pub debug: Option<DebugConfig>,
}

impl FunctionSpec {
    /// The invocation deadline for this function.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Whether invocations of this function must serialize on the debug lock.
    pub fn debug_enabled(&self) -> bool {
        self.debug.as_ref().is_some_and(|d| d.port != 0)
    }
}
