//! Startup orchestration.
//!
//! # Responsibilities
//! - Load the environment source and route sources
//! - Flatten the route tree into a routing table
//! - Load the handler module once and check its export
//! - Bind the listener and serve until shutdown
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Steps run in order, not concurrently
//! - The listener binds last (traffic only when ready)

use std::sync::Arc;

use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;

use crate::config::loader::{load_environment, load_route_sources, resolve_port};
use crate::config::{ConfigError, HandlerEnvironment, SimulatorConfig};
use crate::event::EventSynthesizer;
use crate::handler::{InvokeError, Invoker, ProcessModuleLoader};
use crate::http::{HttpServer, ServerError};
use crate::observability::metrics;
use crate::routing::{flatten, RouteEntry, RouteError};

/// Conditions that stop the simulator before it serves traffic.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Routes(#[from] RouteError),

    #[error("no routes defined: the route definitions produced an empty routing table")]
    NoRoutes,

    #[error(transparent)]
    Handler(#[from] InvokeError),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to start metrics exporter: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),

    #[error(transparent)]
    Server(#[from] ServerError),
}

/// A simulator that has finished every startup check and holds a bound listener.
pub struct Prepared {
    pub server: HttpServer,
    pub listener: TcpListener,
}

/// Routing table built from the configured route sources.
pub fn load_routes(config: &SimulatorConfig) -> Result<Vec<RouteEntry>, StartupError> {
    let tree = load_route_sources(&config.route_sources)?;
    let routes = flatten(&tree)?;
    if routes.is_empty() {
        return Err(StartupError::NoRoutes);
    }
    tracing::debug!(count = routes.len(), "Routing table built");
    Ok(routes)
}

/// Run every startup step up to and including binding the listener.
pub async fn prepare(config: &SimulatorConfig) -> Result<Prepared, StartupError> {
    let environment = match &config.environment_file {
        Some(path) => load_environment(path)?,
        None => HandlerEnvironment::default(),
    };

    let routes = load_routes(config)?;

    let mut loader = ProcessModuleLoader::new(environment.clone());
    if let Some(program) = &config.interpreter {
        loader = loader.with_interpreter(program.clone());
    }
    if let Some(project) = &config.project {
        loader = loader.with_project(project.clone());
    }
    let invoker = Invoker::new(Arc::new(loader), config.entrypoint.clone(), config.handler.clone());
    invoker.verify_export().await?;

    if let Some(addr) = config.metrics_address {
        metrics::init_metrics(addr)?;
    }

    let port = resolve_port(config.port, &environment)?;
    let address = format!("{}:{}", config.bind_host, port);
    let listener = TcpListener::bind(&address)
        .await
        .map_err(|source| StartupError::Bind { address, source })?;

    let server = HttpServer::new(routes, EventSynthesizer::new(config.claims), invoker)?;
    Ok(Prepared { server, listener })
}

/// Start the simulator and serve until a signal or `shutdown` fires.
pub async fn run(config: SimulatorConfig, shutdown: broadcast::Receiver<()>) -> Result<(), StartupError> {
    let Prepared { server, listener } = prepare(&config).await?;
    server.run(listener, shutdown).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn route_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_empty_route_source_is_fatal() {
        let file = route_file("{}");
        let config = SimulatorConfig::new(file.path(), "handler", "handler.sh");
        assert!(matches!(load_routes(&config), Err(StartupError::NoRoutes)));

        let file = route_file(r#"{"/pets": {}}"#);
        let config = SimulatorConfig::new(file.path(), "handler", "handler.sh");
        assert!(matches!(load_routes(&config), Err(StartupError::NoRoutes)));
    }

    #[test]
    fn test_malformed_route_source_is_fatal() {
        let file = route_file("[1, 2]");
        let config = SimulatorConfig::new(file.path(), "handler", "handler.sh");
        assert!(matches!(load_routes(&config), Err(StartupError::Config(_))));

        let file = route_file(r#"{"/pets": {"methods": ["FETCH"]}}"#);
        let config = SimulatorConfig::new(file.path(), "handler", "handler.sh");
        assert!(matches!(load_routes(&config), Err(StartupError::Routes(_))));
    }

    #[tokio::test]
    async fn test_missing_entrypoint_is_fatal() {
        let file = route_file(r#"{"/pets": {"methods": ["GET"]}}"#);
        let mut config = SimulatorConfig::new(file.path(), "handler", "/nonexistent/handler.sh");
        config.port = Some(0);
        assert!(matches!(prepare(&config).await, Err(StartupError::Handler(_))));
    }
}
