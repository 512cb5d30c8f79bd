//! Container-backed sandbox engine.
//!
//! Runs each invocation in a single-use container by shelling out to the
//! `docker` CLI: the function's code directory is mounted read-only at
//! `/var/task`, the payload is written to the container's stdin, the
//! function result is read from stdout, and log output from stderr. The
//! container is named after the invocation id so that `cancel` can kill it.

use super::{debug_config, EngineOutput, EngineRequest, ExecutionEngine, ExecutionError};
use crate::protocol::ErrorBody;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Task code mount point inside the container.
const TASK_MOUNT: &str = "/var/task";
/// Image repository providing the local runtime sandboxes.
const IMAGE_REPO: &str = "lambci/lambda";

/// Placeholder credentials injected when the caller provides none; local
/// functions expect the standard variables to exist even without real
/// cloud access.
const DUMMY_CREDENTIALS: &[(&str, &str)] = &[
    ("AWS_ACCESS_KEY_ID", "defaultkey"),
    ("AWS_SECRET_ACCESS_KEY", "defaultsecret"),
    ("AWS_REGION", "us-east-1"),
    ("AWS_DEFAULT_REGION", "us-east-1"),
];

/// Settings for the container backend, resolved by the CLI layer.
#[derive(Debug, Clone, Default)]
pub struct ContainerEngineConfig {
    /// Base directory that relative code locations are resolved against
    /// when the template lives on a different host than the daemon.
    pub volume_basedir: Option<PathBuf>,
    /// Docker network to attach invocation containers to.
    pub network: Option<String>,
    /// Skip pulling runtime images before the first invocation.
    pub skip_pull_image: bool,
    /// Credential profile name exported into the sandbox.
    pub profile: Option<String>,
}

/// `docker`-CLI-backed [`ExecutionEngine`].
pub struct ContainerEngine {
    config: ContainerEngineConfig,
    /// Containers currently running, by invocation id.
    running: Mutex<HashSet<String>>,
    /// Images already pulled in this process.
    pulled: Mutex<HashSet<String>>,
}

impl ContainerEngine {
    pub fn new(config: ContainerEngineConfig) -> Self {
        info!(
            skip_pull = config.skip_pull_image,
            network = config.network.as_deref().unwrap_or("default"),
            "Container engine initialised"
        );
        Self {
            config,
            running: Mutex::new(HashSet::new()),
            pulled: Mutex::new(HashSet::new()),
        }
    }

    /// Pull the runtime image once per process unless pulling is disabled.
    async fn ensure_image(&self, image: &str) {
        if self.config.skip_pull_image || self.pulled.lock().contains(image) {
            return;
        }
        debug!(image, "Pulling runtime image");
        let pulled = Command::new("docker")
            .args(["pull", image])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await;
        match pulled {
            Ok(status) if status.success() => {
                self.pulled.lock().insert(image.to_string());
            }
            Ok(status) => {
                warn!(image, code = ?status.code(), "Image pull failed; using local image if present");
            }
            Err(e) => {
                warn!(image, error = %e, "Image pull failed; using local image if present");
            }
        }
    }

    fn mark_running(&self, invocation_id: &str) {
        self.running.lock().insert(invocation_id.to_string());
    }

    fn mark_finished(&self, invocation_id: &str) {
        self.running.lock().remove(invocation_id);
    }
}

#[async_trait]
impl ExecutionEngine for ContainerEngine {
    async fn run(&self, request: EngineRequest) -> Result<EngineOutput, ExecutionError> {
        let image = runtime_image(&request.spec.runtime);
        self.ensure_image(&image).await;

        let args = build_run_args(&request, &self.config);
        debug!(
            function = %request.spec.name,
            invocation = %request.invocation_id,
            image = %image,
            "Starting sandbox container"
        );

        let mut child = Command::new("docker")
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| ExecutionError::infrastructure(format!("docker spawn failed: {e}")))?;

        self.mark_running(&request.invocation_id);

        if let Some(mut stdin) = child.stdin.take() {
            if let Err(e) = stdin.write_all(&request.payload).await {
                self.mark_finished(&request.invocation_id);
                return Err(ExecutionError::infrastructure(format!(
                    "failed to write payload to sandbox: {e}"
                )));
            }
            // Close stdin so the runtime sees EOF on the payload.
            drop(stdin);
        }

        let output = child.wait_with_output().await;
        self.mark_finished(&request.invocation_id);

        let output = output
            .map_err(|e| ExecutionError::infrastructure(format!("sandbox wait failed: {e}")))?;

        if output.status.success() {
            return Ok(EngineOutput {
                payload: output.stdout.into(),
                logs: output.stderr,
            });
        }

        // The runtime reports handler failures as a structured JSON body on
        // stdout; anything else is surfaced as an unhandled error.
        Err(classify_failure(
            &output.stdout,
            output.stderr,
            output.status.code(),
        ))
    }

    async fn cancel(&self, invocation_id: &str) {
        if !self.running.lock().contains(invocation_id) {
            return;
        }
        let name = container_name(invocation_id);
        debug!(container = %name, "Killing sandbox container");
        let killed = Command::new("docker")
            .args(["kill", &name])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await;
        if let Err(e) = killed {
            warn!(container = %name, error = %e, "Failed to kill sandbox container");
        }
        // The run future that owned this entry was dropped at the timeout,
        // so the cancelled invocation is untracked here.
        self.mark_finished(invocation_id);
    }
}

/// Runtime image for a runtime identifier, e.g. `lambci/lambda:python3.12`.
fn runtime_image(runtime: &str) -> String {
    format!("{IMAGE_REPO}:{runtime}")
}

/// Container name for an invocation id.
fn container_name(invocation_id: &str) -> String {
    format!("lambda-local-{invocation_id}")
}

/// Resolve the host path mounted at `/var/task`.
fn resolve_code_path(code_uri: &str, basedir: Option<&Path>) -> PathBuf {
    match basedir {
        Some(base) => base.join(code_uri),
        None => PathBuf::from(code_uri),
    }
}

/// Build the full `docker run` argument list for one invocation.
///
/// Pure function so command construction is testable without docker.
fn build_run_args(request: &EngineRequest, config: &ContainerEngineConfig) -> Vec<String> {
    let spec = &request.spec;
    let mut args = vec![
        "run".to_string(),
        "--rm".to_string(),
        "-i".to_string(),
        "--name".to_string(),
        container_name(&request.invocation_id),
        "--memory".to_string(),
        format!("{}m", spec.memory_mb),
        "--volume".to_string(),
        format!(
            "{}:{}:ro",
            resolve_code_path(&spec.code_uri, config.volume_basedir.as_deref()).display(),
            TASK_MOUNT
        ),
    ];

    if let Some(network) = &config.network {
        args.push("--network".to_string());
        args.push(network.clone());
    }

    for (key, value) in DUMMY_CREDENTIALS {
        if !spec.env_vars.contains_key(*key) {
            args.push("--env".to_string());
            args.push(format!("{key}={value}"));
        }
    }
    if let Some(profile) = &config.profile {
        args.push("--env".to_string());
        args.push(format!("AWS_PROFILE={profile}"));
    }
    args.push("--env".to_string());
    args.push(format!("AWS_LAMBDA_FUNCTION_NAME={}", spec.name));
    args.push("--env".to_string());
    args.push(format!("AWS_LAMBDA_FUNCTION_MEMORY_SIZE={}", spec.memory_mb));
    args.push("--env".to_string());
    args.push(format!("AWS_LAMBDA_FUNCTION_TIMEOUT={}", spec.timeout_secs));
    for (key, value) in &spec.env_vars {
        args.push("--env".to_string());
        args.push(format!("{key}={value}"));
    }
    if let Some(context) = &request.client_context {
        args.push("--env".to_string());
        args.push(format!("AWS_LAMBDA_CLIENT_CONTEXT={context}"));
    }

    if let Some(debug) = debug_config(request) {
        args.push("--publish".to_string());
        args.push(format!("{0}:{0}", debug.port));
    }

    args.push(runtime_image(&spec.runtime));
    args.push(spec.handler.clone());

    // Debugger startup arguments ride after the handler so the runtime's
    // bootstrap can hand them to the language debugger.
    if let Some(debug) = debug_config(request) {
        args.extend(debug.args.iter().cloned());
    }

    args
}

/// Map a nonzero container exit into a typed execution error.
///
/// Docker reserves exits 125 (daemon error), 126 (entrypoint not runnable)
/// and 127 (entrypoint not found) for runs where the container never
/// started; those are sandbox failures, not function errors.
fn classify_failure(stdout: &[u8], logs: Vec<u8>, exit_code: Option<i32>) -> ExecutionError {
    if let Ok(body) = serde_json::from_slice::<ErrorBody>(stdout) {
        return ExecutionError::Application {
            error_type: body.error_type,
            message: body.error_message,
            stack_trace: body.stack_trace,
            logs,
        };
    }
    if let Some(code @ 125..=127) = exit_code {
        let detail = String::from_utf8_lossy(&logs);
        let detail = detail.trim();
        return ExecutionError::infrastructure(if detail.is_empty() {
            format!("docker run failed with status {code}")
        } else {
            format!("docker run failed with status {code}: {detail}")
        });
    }
    let message = match exit_code {
        Some(code) => format!("function exited with status {code}"),
        None => "function terminated by signal".to_string(),
    };
    ExecutionError::Application {
        error_type: "Unhandled".to_string(),
        message,
        stack_trace: Vec::new(),
        logs,
    }
}
