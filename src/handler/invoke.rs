//! Handler invocation.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::Value;

use crate::event::InvocationEvent;
use crate::handler::loader::ModuleLoader;
use crate::handler::types::{InvocationContext, InvocationFailure, InvokeError};

/// Invokes one named export of one handler module, reloading it every call.
#[derive(Debug, Clone)]
pub struct Invoker {
    loader: Arc<dyn ModuleLoader>,
    location: PathBuf,
    export: String,
}

impl Invoker {
    pub fn new(loader: Arc<dyn ModuleLoader>, location: impl Into<PathBuf>, export: impl Into<String>) -> Self {
        Self {
            loader,
            location: location.into(),
            export: export.into(),
        }
    }

    pub fn location(&self) -> &Path {
        &self.location
    }

    pub fn export(&self) -> &str {
        &self.export
    }

    /// Startup check: the module loads and defines the export.
    pub async fn verify_export(&self) -> Result<(), InvokeError> {
        tracing::info!(path = %self.location.display(), "Loading entrypoint");
        let module = self.loader.load_fresh(&self.location).await?;
        let exports = module.exports().await?;
        if exports.iter().any(|name| name == &self.export) {
            tracing::debug!(export = %self.export, exports = ?exports, "Handler export found");
            Ok(())
        } else {
            Err(InvokeError::MissingExport {
                export: self.export.clone(),
                path: self.location.clone(),
            })
        }
    }

    /// Load the module fresh and run the export with `event`.
    pub async fn invoke(
        &self,
        event: &InvocationEvent,
        context: &InvocationContext,
    ) -> Result<Value, InvocationFailure> {
        let module = self.loader.load_fresh(&self.location).await?;
        module.invoke(&self.export, &event.to_value(), context).await
    }
}
