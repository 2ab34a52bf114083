//! Handler loading and invocation subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     Invoker::verify_export
//!     → ModuleLoader::load_fresh(location)
//!     → HandlerModule::exports (missing export is fatal)
//!
//! Per request:
//!     InvocationEvent
//!     → Invoker::invoke
//!     → ModuleLoader::load_fresh(location)   (no cache, every call)
//!     → HandlerModule::invoke(export, event)
//!     → Result<Value, InvocationFailure>
//! ```
//!
//! # Design Decisions
//! - Correctness over throughput: nothing survives between invocations
//! - Failures are values, never panics; the server keeps serving
//! - No invocation timeout: a handler that never exits keeps its request open

pub mod invoke;
pub mod loader;
pub mod types;

pub use invoke::Invoker;
pub use loader::{HandlerModule, ModuleLoader, ProcessModuleLoader};
pub use types::{InvocationContext, InvocationFailure, InvokeError};
