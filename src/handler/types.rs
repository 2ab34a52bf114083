//! Handler invocation types and error definitions.

use std::path::PathBuf;

use serde::Deserialize;
use thiserror::Error;

use crate::event::ClaimsError;

/// Errors raised while loading a handler module or inspecting its exports.
#[derive(Debug, Error)]
pub enum InvokeError {
    #[error("handler module not found at {path}: {source}")]
    NotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("handler module at {path} is not a file")]
    NotAFile { path: PathBuf },

    #[error("failed to run handler module {path}: {source}")]
    Spawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("handler module {path} did not list its exports: {reason}")]
    Exports { path: PathBuf, reason: String },

    #[error("handler {export:?} not found in {path}")]
    MissingExport { export: String, path: PathBuf },
}

/// A single invocation failed. Converted into a 500 reply; never fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct InvocationFailure {
    /// Message returned to the caller as the reply body.
    pub message: String,
    /// Error class reported by the handler, if any.
    pub error_type: Option<String>,
    /// Diagnostic trace reported by the handler, if any.
    pub trace: Vec<String>,
}

impl InvocationFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            error_type: None,
            trace: Vec::new(),
        }
    }

    pub fn with_type(mut self, error_type: impl Into<String>) -> Self {
        self.error_type = Some(error_type.into());
        self
    }

    pub fn with_trace(mut self, trace: Vec<String>) -> Self {
        self.trace = trace;
        self
    }
}

impl From<InvokeError> for InvocationFailure {
    fn from(err: InvokeError) -> Self {
        Self::new(err.to_string()).with_type("LoadError")
    }
}

impl From<ClaimsError> for InvocationFailure {
    fn from(err: ClaimsError) -> Self {
        Self::new(err.to_string()).with_type("ClaimsError")
    }
}

/// Error object a handler process prints when it fails.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct HandlerErrorReport {
    pub error_message: String,
    #[serde(default)]
    pub error_type: Option<String>,
    #[serde(default)]
    pub stack_trace: Vec<String>,
}

impl From<HandlerErrorReport> for InvocationFailure {
    fn from(report: HandlerErrorReport) -> Self {
        Self {
            message: report.error_message,
            error_type: report.error_type,
            trace: report.stack_trace,
        }
    }
}

/// Per-invocation metadata passed alongside the event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationContext {
    /// Correlates the reply, the log lines and the handler process.
    pub request_id: String,
}

impl InvocationContext {
    pub fn new(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
        }
    }
}
