//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route Compilation (at startup):
//!     PathTree (merged route sources)
//!     → flatten.rs (depth-first walk, validation)
//!     → Vec<RouteEntry> (cloud pattern syntax)
//!     → pattern.rs (cloud → listener syntax, once per binding)
//!     → registered with the HTTP listener
//!
//! Per request:
//!     listener match → RouteEntry (shared, immutable) → event synthesis
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - Deterministic: same tree always yields the same table
//! - Ambiguous tables are rejected before anything is bound

pub mod flatten;
pub mod pattern;

use std::fmt;

use thiserror::Error;

use crate::config::schema::MessageTransport;

pub use flatten::flatten;

/// Method of the synthetic entry produced for message routes.
pub const MESSAGE_METHOD: &str = "POST";

/// Catch-all method name accepted in route sources.
pub const ANY_METHOD: &str = "ANY";

/// Which invocation shape a route produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportKind {
    /// HTTP request/response.
    Request,
    /// Queue message.
    Queue,
    /// Pub/sub message.
    PubSub,
}

impl TransportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransportKind::Request => "API",
            TransportKind::Queue => "QUEUE",
            TransportKind::PubSub => "PUBSUB",
        }
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<MessageTransport> for TransportKind {
    fn from(transport: MessageTransport) -> Self {
        match transport {
            MessageTransport::Queue => TransportKind::Queue,
            MessageTransport::Pubsub => TransportKind::PubSub,
        }
    }
}

/// One row of the routing table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteEntry {
    /// Path pattern in cloud placeholder syntax.
    pub pattern: String,
    /// Uppercased HTTP method, or [`ANY_METHOD`].
    pub method: String,
    pub kind: TransportKind,
}

impl RouteEntry {
    /// Pattern in the listener's placeholder syntax.
    pub fn listener_pattern(&self) -> String {
        pattern::to_listener_pattern(&self.pattern)
    }

    /// Whether the pattern captures any path parameters.
    pub fn has_captures(&self) -> bool {
        self.pattern.split('/').any(|segment| segment.starts_with('{'))
    }
}

/// Errors detected while building the routing table. All are fatal at startup.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RouteError {
    #[error("invalid route pattern {pattern:?}: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("unsupported method {method:?} on {pattern}")]
    InvalidMethod { pattern: String, method: String },

    #[error("transport marker on {pattern} is only allowed on top-level nodes without methods or paths")]
    MisplacedTransport { pattern: String },

    #[error("{method} {pattern} is defined more than once")]
    Duplicate { pattern: String, method: String },

    #[error("routes {first} and {second} differ only in placeholder names")]
    Conflict { first: String, second: String },
}
