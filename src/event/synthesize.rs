//! Event synthesis.
//!
//! Pure reshaping of transport input into the event a platform would deliver
//! for the matched route. The only failure is a malformed bearer token when
//! claims extraction is enabled.

use std::collections::BTreeMap;

use uuid::Uuid;

use crate::event::claims::{self, ClaimsError};
use crate::event::query::QueryParameters;
use crate::event::types::{
    InvocationEvent, PubSubEvent, PubSubMessage, PubSubRecord, QueueEvent, QueueRecord, RawTransportInput,
    RequestEvent,
};
use crate::routing::{RouteEntry, TransportKind, ANY_METHOD};

/// `eventSource` of synthesized queue records.
pub const QUEUE_EVENT_SOURCE: &str = "aws:sqs";

/// `EventSource` of synthesized pub/sub records.
pub const PUBSUB_EVENT_SOURCE: &str = "aws:sns";

/// Builds invocation events for matched routes.
#[derive(Debug, Clone, Copy, Default)]
pub struct EventSynthesizer {
    claims: bool,
}

impl EventSynthesizer {
    /// `claims` enables bearer token decoding into `requestContext`.
    pub fn new(claims: bool) -> Self {
        Self { claims }
    }

    pub fn claims_enabled(&self) -> bool {
        self.claims
    }

    /// Build the event for `entry` from the buffered transport input.
    pub fn synthesize(&self, entry: &RouteEntry, raw: RawTransportInput) -> Result<InvocationEvent, ClaimsError> {
        let body = String::from_utf8_lossy(&raw.body).into_owned();

        match entry.kind {
            TransportKind::Request => self.request_event(entry, raw, body).map(InvocationEvent::Request),
            TransportKind::Queue => Ok(InvocationEvent::Queue(QueueEvent {
                records: vec![QueueRecord {
                    message_id: Uuid::new_v4().to_string(),
                    event_source: QUEUE_EVENT_SOURCE.to_string(),
                    body,
                }],
            })),
            TransportKind::PubSub => Ok(InvocationEvent::PubSub(PubSubEvent {
                records: vec![PubSubRecord {
                    event_source: PUBSUB_EVENT_SOURCE.to_string(),
                    sns: PubSubMessage {
                        message_id: Uuid::new_v4().to_string(),
                        message: body,
                    },
                }],
            })),
        }
    }

    fn request_event(&self, entry: &RouteEntry, raw: RawTransportInput, body: String) -> Result<RequestEvent, ClaimsError> {
        let request_context = if self.claims {
            claims::extract(raw.header("authorization"))?
        } else {
            None
        };

        let http_method = if entry.method == ANY_METHOD {
            raw.method.to_ascii_uppercase()
        } else {
            entry.method.to_ascii_uppercase()
        };

        let mut multi_value_headers: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (name, value) in raw.headers {
            multi_value_headers.entry(name).or_default().push(value);
        }
        let headers = multi_value_headers
            .iter()
            .map(|(name, values)| (name.clone(), values.join(", ")))
            .collect();

        let query = QueryParameters::parse(raw.query.as_deref());

        Ok(RequestEvent {
            resource: entry.pattern.clone(),
            path: raw.path,
            http_method,
            headers,
            multi_value_headers,
            query_string_parameters: query.single,
            multi_value_query_string_parameters: query.multi,
            path_parameters: raw.path_params,
            request_context,
            body,
            is_base64_encoded: false,
        })
    }
}
