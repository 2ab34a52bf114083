//! Handler module loading.
//!
//! # Responsibilities
//! - Resolve the handler module from disk on every call
//! - List a module's exports (startup check)
//! - Run one export with one event
//!
//! # Design Decisions
//! - Nothing is cached between calls; edits apply on the next request
//! - The invocation pipeline only sees the `ModuleLoader` trait
//! - The default loader runs the module as a child process, one per call
//!
//! # Process protocol
//! ```text
//! exports:     <module> --exports          → stdout: ["handler", ...] or one name per line
//! invocation:  <module> <export> < event   → exit 0, stdout: result JSON (last line wins)
//!                                          → exit ≠ 0, stdout: {"errorMessage", "errorType", "stackTrace"}
//!                                            or a message on stderr
//! ```
//! When an interpreter is configured it is run with the module path as its
//! first argument.

use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};

use async_trait::async_trait;
use serde_json::Value;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::config::HandlerEnvironment;
use crate::handler::types::{HandlerErrorReport, InvocationContext, InvocationFailure, InvokeError};

/// Flag asking a process module to list its exports.
pub const EXPORTS_FLAG: &str = "--exports";

/// Environment variable naming the export being invoked.
pub const HANDLER_ENV: &str = "_HANDLER";

/// Environment variable carrying the invocation's request id.
pub const REQUEST_ID_ENV: &str = "LAMBDA_LOCAL_REQUEST_ID";

/// Environment variable carrying the project configuration location.
pub const PROJECT_ENV: &str = "LAMBDA_LOCAL_PROJECT";

/// Capability to load a handler module fresh, bypassing any cache.
#[async_trait]
pub trait ModuleLoader: Send + Sync + std::fmt::Debug {
    /// Load the module at `location` as it currently exists on disk.
    async fn load_fresh(&self, location: &Path) -> Result<Box<dyn HandlerModule>, InvokeError>;
}

/// A freshly loaded handler module.
#[async_trait]
pub trait HandlerModule: Send + Sync {
    /// Names of the exports this module defines.
    async fn exports(&self) -> Result<Vec<String>, InvokeError>;

    /// Run `export` with the serialized event.
    async fn invoke(
        &self,
        export: &str,
        event: &Value,
        context: &InvocationContext,
    ) -> Result<Value, InvocationFailure>;
}

/// Loads handler modules as executables run in a child process.
#[derive(Debug, Clone, Default)]
pub struct ProcessModuleLoader {
    interpreter: Option<String>,
    environment: HandlerEnvironment,
    project: Option<PathBuf>,
}

impl ProcessModuleLoader {
    pub fn new(environment: HandlerEnvironment) -> Self {
        Self {
            environment,
            ..Self::default()
        }
    }

    /// Run modules through `program` instead of executing them directly.
    pub fn with_interpreter(mut self, program: impl Into<String>) -> Self {
        self.interpreter = Some(program.into());
        self
    }

    /// Forward a project configuration location to the handler runtime.
    pub fn with_project(mut self, project: impl Into<PathBuf>) -> Self {
        self.project = Some(project.into());
        self
    }
}

#[async_trait]
impl ModuleLoader for ProcessModuleLoader {
    async fn load_fresh(&self, location: &Path) -> Result<Box<dyn HandlerModule>, InvokeError> {
        let metadata = tokio::fs::metadata(location)
            .await
            .map_err(|source| InvokeError::NotFound {
                path: location.to_path_buf(),
                source,
            })?;
        if !metadata.is_file() {
            return Err(InvokeError::NotAFile {
                path: location.to_path_buf(),
            });
        }

        tracing::trace!(path = %location.display(), size = metadata.len(), "Handler module loaded");

        Ok(Box::new(ProcessModule {
            path: location.to_path_buf(),
            interpreter: self.interpreter.clone(),
            environment: self.environment.clone(),
            project: self.project.clone(),
        }))
    }
}

/// One handler module snapshot; every call spawns a new process.
#[derive(Debug)]
struct ProcessModule {
    path: PathBuf,
    interpreter: Option<String>,
    environment: HandlerEnvironment,
    project: Option<PathBuf>,
}

impl ProcessModule {
    fn command(&self) -> Command {
        let mut command = match &self.interpreter {
            Some(program) => {
                let mut command = Command::new(program);
                command.arg(&self.path);
                command
            }
            None => Command::new(&self.path),
        };
        command
            .envs(self.environment.iter())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(project) = &self.project {
            command.env(PROJECT_ENV, project);
        }
        command
    }

    fn spawn_error(&self, source: std::io::Error) -> InvokeError {
        InvokeError::Spawn {
            path: self.path.clone(),
            source,
        }
    }
}

#[async_trait]
impl HandlerModule for ProcessModule {
    async fn exports(&self) -> Result<Vec<String>, InvokeError> {
        let output = self
            .command()
            .arg(EXPORTS_FLAG)
            .output()
            .await
            .map_err(|e| self.spawn_error(e))?;

        if !output.status.success() {
            return Err(InvokeError::Exports {
                path: self.path.clone(),
                reason: failure_from_output(output.status, &output.stdout, &output.stderr).message,
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        if let Ok(names) = serde_json::from_str::<Vec<String>>(stdout.trim()) {
            return Ok(names);
        }
        Ok(stdout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }

    async fn invoke(
        &self,
        export: &str,
        event: &Value,
        context: &InvocationContext,
    ) -> Result<Value, InvocationFailure> {
        let payload = serde_json::to_vec(event)
            .map_err(|e| InvocationFailure::new(format!("failed to serialize event: {e}")))?;

        let mut child = self
            .command()
            .arg(export)
            .env(HANDLER_ENV, export)
            .env(REQUEST_ID_ENV, &context.request_id)
            .stdin(Stdio::piped())
            .spawn()
            .map_err(|e| InvocationFailure::from(self.spawn_error(e)))?;

        // Feed stdin concurrently so a handler writing before it reads cannot
        // deadlock against a full pipe.
        if let Some(mut stdin) = child.stdin.take() {
            let request_id = context.request_id.clone();
            tokio::spawn(async move {
                if let Err(e) = stdin.write_all(&payload).await {
                    tracing::debug!(request_id = %request_id, error = %e, "Handler closed stdin early");
                }
            });
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| InvocationFailure::from(self.spawn_error(e)))?;

        for line in String::from_utf8_lossy(&output.stderr).lines() {
            tracing::info!(target: "lambda_local::handler", request_id = %context.request_id, "{line}");
        }

        if output.status.success() {
            parse_result(&output.stdout)
        } else {
            Err(failure_from_output(output.status, &output.stdout, &output.stderr))
        }
    }
}

/// Parse a successful handler's stdout. The whole output is tried first, then
/// its last non-empty line, so earlier lines may carry log output.
fn parse_result(stdout: &[u8]) -> Result<Value, InvocationFailure> {
    let text = String::from_utf8_lossy(stdout);
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(Value::Null);
    }
    if let Ok(value) = serde_json::from_str(trimmed) {
        return Ok(value);
    }
    let last = trimmed.lines().map(str::trim).rfind(|line| !line.is_empty()).unwrap_or_default();
    serde_json::from_str(last)
        .map_err(|e| InvocationFailure::new(format!("handler returned invalid JSON: {e}")).with_type("InvalidResult"))
}

/// Build a failure from a non-zero exit: a JSON error report on stdout wins,
/// then the last stderr line, then the exit status.
fn failure_from_output(status: ExitStatus, stdout: &[u8], stderr: &[u8]) -> InvocationFailure {
    let stdout = String::from_utf8_lossy(stdout);
    let report = serde_json::from_str::<HandlerErrorReport>(stdout.trim()).ok().or_else(|| {
        stdout
            .lines()
            .rev()
            .find(|line| !line.trim().is_empty())
            .and_then(|line| serde_json::from_str::<HandlerErrorReport>(line.trim()).ok())
    });
    if let Some(report) = report {
        return report.into();
    }

    let stderr = String::from_utf8_lossy(stderr);
    let lines: Vec<String> = stderr
        .lines()
        .map(str::trim_end)
        .filter(|line| !line.trim().is_empty())
        .map(str::to_string)
        .collect();
    match lines.last() {
        Some(last) => InvocationFailure::new(last.clone()).with_trace(lines),
        None => InvocationFailure::new(format!("handler exited with {status}")),
    }
}
