//! Local serverless invocation simulator library.
//!
//! # Architecture Overview
//!
//! ```text
//!     Route sources ──▶ config ──▶ routing::flatten ──▶ routing table
//!                                                            │
//!     Client Request                                         ▼
//!     ───────────────▶ http::server ──▶ event::synthesize ──▶ handler::Invoker
//!                                                            │ (fresh module per call)
//!     Client Response                                        ▼
//!     ◀─────────────── http::response ◀──────────── handler result / failure
//! ```

// Core subsystems
pub mod config;
pub mod event;
pub mod handler;
pub mod http;
pub mod routing;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use config::SimulatorConfig;
pub use http::HttpServer;
pub use lifecycle::{Shutdown, StartupError};
pub use routing::{RouteEntry, TransportKind};
