//! Handler environment variables.
//!
//! Loaded once at startup and shared read-only by every invocation. The
//! simulator never writes these into its own process environment; they are
//! applied to each handler process when it is spawned.

use std::collections::BTreeMap;
use std::sync::Arc;

/// Immutable set of environment variables passed to handler invocations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HandlerEnvironment {
    vars: Arc<BTreeMap<String, String>>,
}

impl HandlerEnvironment {
    /// Freeze a set of variables.
    pub fn new(vars: BTreeMap<String, String>) -> Self {
        Self {
            vars: Arc::new(vars),
        }
    }

    /// Look up a variable.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// Iterate over all variables in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Copy with one extra variable. Used while assembling startup state only.
    pub fn with_var(&self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut vars = (*self.vars).clone();
        vars.insert(key.into(), value.into());
        Self::new(vars)
    }
}
