//! Configuration schema definitions.
//!
//! Route-definition sources and the environment source are deserialized into
//! these types. Simulator settings are assembled from the command line.

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Default listening port when neither the environment source nor the process
/// environment sets `PORT`.
pub const DEFAULT_PORT: u16 = 3000;

/// Top-level route tree: route segment → node.
///
/// A `BTreeMap` keeps the walk order deterministic for a given input.
pub type PathTree = BTreeMap<String, PathDefinitionNode>;

/// One node of a declarative route-definition tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathDefinitionNode {
    /// HTTP methods served at this node's accumulated path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub methods: Option<Vec<String>>,

    /// Child segments, appended to this node's path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paths: Option<PathTree>,

    /// Marks a top-level node as a message endpoint instead of an HTTP resource.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transport: Option<MessageTransport>,
}

impl PathDefinitionNode {
    /// Node serving the given methods with no children.
    pub fn with_methods<I, S>(methods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            methods: Some(methods.into_iter().map(Into::into).collect()),
            ..Self::default()
        }
    }

    /// Add a child segment.
    pub fn child(mut self, segment: impl Into<String>, node: PathDefinitionNode) -> Self {
        self.paths
            .get_or_insert_with(PathTree::new)
            .insert(segment.into(), node);
        self
    }

    /// Message endpoint node.
    pub fn message(transport: MessageTransport) -> Self {
        Self {
            transport: Some(transport),
            ..Self::default()
        }
    }
}

/// Non-HTTP transport markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageTransport {
    /// Queue delivery (one record carrying the body).
    #[serde(alias = "sqs")]
    Queue,
    /// Topic delivery (one record carrying the message).
    #[serde(alias = "sns")]
    Pubsub,
}

/// Settings for one simulator process, fixed at startup.
#[derive(Debug, Clone)]
pub struct SimulatorConfig {
    /// Route-definition sources, merged in order.
    pub route_sources: Vec<PathBuf>,

    /// Name of the export to invoke in the handler module.
    pub handler: String,

    /// Location of the handler module.
    pub entrypoint: PathBuf,

    /// Optional program used to run the handler module.
    pub interpreter: Option<String>,

    /// Optional project configuration forwarded to the handler runtime.
    pub project: Option<PathBuf>,

    /// Optional JSON/TOML file of environment variables for the handler.
    pub environment_file: Option<PathBuf>,

    /// Decode bearer token claims into the request context.
    pub claims: bool,

    /// Listening port; resolved from `PORT` when `None`.
    pub port: Option<u16>,

    /// Interface to bind.
    pub bind_host: String,

    /// Prometheus exporter address, disabled when `None`.
    pub metrics_address: Option<SocketAddr>,
}

impl SimulatorConfig {
    /// Configuration with defaults for everything except the required inputs.
    pub fn new(
        route_source: impl Into<PathBuf>,
        handler: impl Into<String>,
        entrypoint: impl Into<PathBuf>,
    ) -> Self {
        Self {
            route_sources: vec![route_source.into()],
            handler: handler.into(),
            entrypoint: entrypoint.into(),
            interpreter: None,
            project: None,
            environment_file: None,
            claims: false,
            port: None,
            bind_host: "0.0.0.0".to_string(),
            metrics_address: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_deserialize() {
        let tree: PathTree = serde_json::from_str(
            r#"{
                "/pets": {
                    "methods": ["GET", "POST"],
                    "paths": { "/{id}": { "methods": ["GET"] } }
                },
                "/orders": { "transport": "sqs" }
            }"#,
        )
        .unwrap();

        let pets = &tree["/pets"];
        assert_eq!(pets.methods.as_deref(), Some(&["GET".to_string(), "POST".to_string()][..]));
        assert_eq!(
            pets.paths.as_ref().unwrap()["/{id}"],
            PathDefinitionNode::with_methods(["GET"])
        );
        assert_eq!(tree["/orders"].transport, Some(MessageTransport::Queue));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let res: Result<PathTree, _> = serde_json::from_str(r#"{"/a": {"method": ["GET"]}}"#);
        assert!(res.is_err());
    }

    #[test]
    fn test_default_config() {
        let config = SimulatorConfig::new("api.json", "handler", "./fn.sh");
        assert_eq!(config.route_sources, vec![PathBuf::from("api.json")]);
        assert!(!config.claims);
        assert!(config.port.is_none());
        assert_eq!(config.bind_host, "0.0.0.0");
    }
}
