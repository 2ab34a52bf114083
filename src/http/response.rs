//! Response translation.
//!
//! # Responsibilities
//! - Turn a handler's response envelope into the HTTP reply, verbatim
//! - Acknowledge message deliveries with an empty 200
//! - Map every failure to a 500 whose body is the failure message
//! - Emit exactly one diagnostic line per outcome
//!
//! # Design Decisions
//! - A result that is not a valid envelope is a failure, not a partial reply
//! - Message handlers' return values are ignored beyond success/failure

use std::collections::BTreeMap;

use axum::body::Body;
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::response::Response;
use base64::engine::general_purpose;
use base64::Engine as _;
use serde::Deserialize;
use serde_json::Value;

use crate::handler::InvocationFailure;
use crate::routing::TransportKind;

/// Response shape returned by request-style handlers.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseEnvelope {
    pub status_code: u16,
    #[serde(default)]
    pub headers: Option<BTreeMap<String, Value>>,
    #[serde(default)]
    pub multi_value_headers: Option<BTreeMap<String, Vec<Value>>>,
    #[serde(default)]
    pub body: Option<Value>,
    #[serde(default)]
    pub is_base64_encoded: bool,
}

impl ResponseEnvelope {
    /// Build the HTTP reply described by this envelope.
    pub fn into_response(self) -> Result<Response, InvocationFailure> {
        let status = StatusCode::from_u16(self.status_code)
            .map_err(|_| invalid(format!("invalid status code {}", self.status_code)))?;

        let mut builder = Response::builder().status(status);

        for (name, value) in self.headers.into_iter().flatten() {
            let Some(value) = header_text(&value) else { continue };
            builder = builder.header(header_name(&name)?, header_value(&name, &value)?);
        }
        for (name, values) in self.multi_value_headers.into_iter().flatten() {
            let header = header_name(&name)?;
            for value in values.iter().filter_map(header_text) {
                builder = builder.header(header.clone(), header_value(&name, &value)?);
            }
        }

        let body = match self.body {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::String(text)) if self.is_base64_encoded => general_purpose::STANDARD
                .decode(text.trim())
                .map_err(|e| invalid(format!("body is not valid base64: {e}")))?,
            Some(Value::String(text)) => text.into_bytes(),
            Some(other) => other.to_string().into_bytes(),
        };

        builder
            .body(Body::from(body))
            .map_err(|e| invalid(format!("invalid response: {e}")))
    }
}

fn invalid(message: String) -> InvocationFailure {
    InvocationFailure::new(message).with_type("InvalidResponse")
}

fn header_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn header_name(name: &str) -> Result<HeaderName, InvocationFailure> {
    HeaderName::from_bytes(name.as_bytes()).map_err(|_| invalid(format!("invalid header name {name:?}")))
}

fn header_value(name: &str, value: &str) -> Result<HeaderValue, InvocationFailure> {
    HeaderValue::from_str(value).map_err(|_| invalid(format!("invalid value for header {name:?}")))
}

/// Translate the outcome of one invocation into the reply for its transport.
pub fn translate(
    kind: TransportKind,
    method: &str,
    path: &str,
    outcome: Result<Value, InvocationFailure>,
) -> Response {
    let value = match outcome {
        Ok(value) => value,
        Err(failure) => return failure_reply(kind, method, path, &failure),
    };

    match kind {
        TransportKind::Request => {
            let reply = serde_json::from_value::<ResponseEnvelope>(value)
                .map_err(|e| invalid(format!("handler returned an invalid response: {e}")))
                .and_then(ResponseEnvelope::into_response);
            match reply {
                Ok(response) => {
                    let status = response.status().as_u16();
                    tracing::info!(
                        kind = %kind,
                        method = %method,
                        path = %path,
                        status,
                        "{kind} - {method} {path} responded with {status}"
                    );
                    response
                }
                Err(failure) => failure_reply(kind, method, path, &failure),
            }
        }
        TransportKind::Queue | TransportKind::PubSub => {
            tracing::info!(kind = %kind, path = %path, "{kind} - {path} processed");
            acknowledgement()
        }
    }
}

/// 500 reply carrying the failure message, plus its error log line.
pub fn failure_reply(kind: TransportKind, method: &str, path: &str, failure: &InvocationFailure) -> Response {
    tracing::error!(
        kind = %kind,
        method = %method,
        path = %path,
        error_type = failure.error_type.as_deref().unwrap_or("Error"),
        trace = ?failure.trace,
        "{kind} - {method} {path} threw {}",
        failure.message
    );

    let mut response = Response::new(Body::from(failure.message.clone()));
    *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    response
}

fn acknowledgement() -> Response {
    let mut response = Response::new(Body::empty());
    *response.status_mut() = StatusCode::OK;
    response
}
