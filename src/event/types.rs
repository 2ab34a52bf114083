//! Invocation event shapes.
//!
//! Field names follow the JSON a cloud platform delivers to a function, so a
//! handler written against the platform's event API reads them unchanged.

use std::collections::BTreeMap;

use axum::body::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Event handed to the handler, one variant per transport kind.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum InvocationEvent {
    Request(RequestEvent),
    Queue(QueueEvent),
    PubSub(PubSubEvent),
}

impl InvocationEvent {
    /// Serialize to the JSON value delivered to the handler.
    pub fn to_value(&self) -> Value {
        // Every field is a string, map, list or bool, so this cannot fail.
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Request/response event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestEvent {
    /// Route pattern in cloud placeholder syntax.
    pub resource: String,
    /// Literal request path.
    pub path: String,
    pub http_method: String,
    pub headers: BTreeMap<String, String>,
    pub multi_value_headers: BTreeMap<String, Vec<String>>,
    pub query_string_parameters: BTreeMap<String, String>,
    pub multi_value_query_string_parameters: BTreeMap<String, Vec<String>>,
    pub path_parameters: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_context: Option<ClaimsContext>,
    pub body: String,
    pub is_base64_encoded: bool,
}

/// Request context carrying decoded token claims.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimsContext {
    pub authorizer: Authorizer,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Authorizer {
    pub claims: Map<String, Value>,
}

impl ClaimsContext {
    pub fn new(claims: Map<String, Value>) -> Self {
        Self {
            authorizer: Authorizer { claims },
        }
    }
}

/// Queue delivery with a single record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueEvent {
    #[serde(rename = "Records")]
    pub records: Vec<QueueRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueRecord {
    pub message_id: String,
    pub event_source: String,
    pub body: String,
}

/// Topic delivery with a single record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PubSubEvent {
    #[serde(rename = "Records")]
    pub records: Vec<PubSubRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PubSubRecord {
    pub event_source: String,
    pub sns: PubSubMessage,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PubSubMessage {
    pub message_id: String,
    pub message: String,
}

/// Transport input gathered by the listener for one inbound request.
///
/// The body is always fully buffered before synthesis. Streaming is not
/// supported, so request size is bounded by available memory.
#[derive(Debug, Clone, Default)]
pub struct RawTransportInput {
    /// Method as received.
    pub method: String,
    /// Literal request path.
    pub path: String,
    /// Header name/value pairs in arrival order.
    pub headers: Vec<(String, String)>,
    /// Captured path parameters, keyed by placeholder name.
    pub path_params: BTreeMap<String, String>,
    /// Raw query string without the leading `?`.
    pub query: Option<String>,
    pub body: Bytes,
}

impl RawTransportInput {
    /// First value of a header, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}
