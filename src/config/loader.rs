//! Configuration loading from disk.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use crate::config::environment::HandlerEnvironment;
use crate::config::schema::{PathTree, DEFAULT_PORT};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path} as JSON: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to parse {path} as TOML: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("{path} must contain an object of name/value pairs")]
    NotAnObject { path: PathBuf },

    #[error("invalid PORT value {0:?}")]
    InvalidPort(String),
}

/// Read a JSON or TOML document, chosen by file extension.
fn read_document<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let is_toml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));

    if is_toml {
        toml::from_str(&content).map_err(|source| ConfigError::Toml {
            path: path.to_path_buf(),
            source,
        })
    } else {
        serde_json::from_str(&content).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Load one route-definition source.
pub fn load_route_source(path: &Path) -> Result<PathTree, ConfigError> {
    let tree: PathTree = read_document(path)?;
    tracing::debug!(path = %path.display(), resources = tree.len(), "Route source loaded");
    Ok(tree)
}

/// Load and merge route-definition sources. Later sources replace top-level
/// keys of earlier ones.
pub fn load_route_sources<P: AsRef<Path>>(paths: &[P]) -> Result<PathTree, ConfigError> {
    let mut merged = PathTree::new();
    for path in paths {
        let path = path.as_ref();
        tracing::info!(path = %path.display(), "Running apis from definitions");
        for (key, node) in load_route_source(path)? {
            if merged.insert(key.clone(), node).is_some() {
                tracing::debug!(resource = %key, path = %path.display(), "Route definition overridden");
            }
        }
    }
    Ok(merged)
}

/// Load the environment source for handler invocations.
///
/// Strings are taken verbatim, numbers and booleans are stringified, and
/// `null` entries are skipped.
pub fn load_environment(path: &Path) -> Result<HandlerEnvironment, ConfigError> {
    tracing::info!(path = %path.display(), "Loading environment variables");
    let document: Value = read_document(path)?;
    let Value::Object(entries) = document else {
        return Err(ConfigError::NotAnObject {
            path: path.to_path_buf(),
        });
    };

    let mut vars = BTreeMap::new();
    for (key, value) in entries {
        let value = match value {
            Value::String(s) => s,
            Value::Null => continue,
            other => other.to_string(),
        };
        tracing::info!(key = %key, value = %value, "Setting environment");
        vars.insert(key, value);
    }
    Ok(HandlerEnvironment::new(vars))
}

/// Resolve the listening port: explicit setting, then the environment source,
/// then the process environment, then [`DEFAULT_PORT`].
pub fn resolve_port(
    explicit: Option<u16>,
    environment: &HandlerEnvironment,
) -> Result<u16, ConfigError> {
    if let Some(port) = explicit {
        return Ok(port);
    }
    let raw = environment
        .get("PORT")
        .map(str::to_string)
        .or_else(|| std::env::var("PORT").ok());
    match raw {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidPort(raw)),
        None => Ok(DEFAULT_PORT),
    }
}
