//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! route sources (JSON/TOML, one or more)
//!     → loader.rs (parse & merge, later keys win)
//!     → PathTree (immutable)
//!     → routing::flatten
//!
//! environment source (optional)
//!     → loader.rs (stringify values)
//!     → HandlerEnvironment (immutable, Arc-shared)
//!     → applied to every handler invocation
//! ```
//!
//! # Design Decisions
//! - Everything here is loaded once at startup and never mutated afterwards
//! - Route sources merge at top-level key granularity
//! - The simulator's own process environment is never written

pub mod environment;
pub mod loader;
pub mod schema;

pub use environment::HandlerEnvironment;
pub use loader::ConfigError;
pub use schema::{MessageTransport, PathDefinitionNode, PathTree, SimulatorConfig};
