//! HTTP transport subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (one binding per pattern/method, request ID, tracing)
//!     → request.rs (buffer body, collect headers, captures, query)
//!     → [event synthesis + handler invocation]
//!     → response.rs (envelope → reply, acknowledgement, 500 on failure)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{GatherError, X_REQUEST_ID};
pub use response::ResponseEnvelope;
pub use server::{AppState, HttpServer, ServerError};
