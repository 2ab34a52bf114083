//! Invocation event subsystem.
//!
//! # Data Flow
//! ```text
//! RawTransportInput (headers, captures, query, buffered body)
//!     + RouteEntry (pattern, method, kind)
//!     → synthesize.rs
//!         Request → query.rs (dual encoding)
//!                 → claims.rs (optional, bearer payload)
//!         Queue   → single record, body unmodified
//!         PubSub  → single record, message unmodified
//!     → InvocationEvent (serialized to JSON for the handler)
//! ```
//!
//! # Design Decisions
//! - One event per request, built fresh and discarded after invocation
//! - Transport kinds are matched exhaustively
//! - Only the fields this translation produces are modelled

pub mod claims;
pub mod query;
pub mod synthesize;
pub mod types;

pub use claims::ClaimsError;
pub use synthesize::EventSynthesizer;
pub use types::{ClaimsContext, InvocationEvent, RawTransportInput, RequestEvent};
