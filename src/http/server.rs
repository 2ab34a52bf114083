//! HTTP server setup and route binding.
//!
//! # Responsibilities
//! - Register one listener binding per (pattern, method) in the routing table
//! - Log one startup line per binding
//! - Per request: gather input → synthesize event → invoke handler → translate
//! - Wire up middleware (tracing, request ID)
//! - Serve until SIGINT/SIGTERM or a shutdown broadcast

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    extract::State,
    http::{Method, Request},
    response::Response,
    routing::{any, MethodFilter, MethodRouter},
    Router,
};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;

use crate::event::EventSynthesizer;
use crate::handler::{InvocationContext, InvocationFailure, Invoker};
use crate::http::request::{gather, propagate_request_id_layer, request_id, set_request_id_layer};
use crate::http::response::{failure_reply, translate};
use crate::lifecycle::signals;
use crate::observability::metrics;
use crate::routing::{RouteEntry, ANY_METHOD};

/// Errors raised while binding routes.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("no routes to serve: the route definitions produced an empty routing table")]
    NoRoutes,

    #[error("cannot bind method {method} on {pattern}")]
    UnsupportedMethod { pattern: String, method: String },

    #[error("server error: {0}")]
    Io(#[from] std::io::Error),
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub synthesizer: EventSynthesizer,
    pub invoker: Arc<Invoker>,
}

/// HTTP server for the simulator.
pub struct HttpServer {
    router: Router,
    routes: Arc<[RouteEntry]>,
}

impl HttpServer {
    /// Bind every route to the handler pipeline.
    pub fn new(routes: Vec<RouteEntry>, synthesizer: EventSynthesizer, invoker: Invoker) -> Result<Self, ServerError> {
        if routes.is_empty() {
            return Err(ServerError::NoRoutes);
        }

        let routes: Arc<[RouteEntry]> = routes.into();
        let state = AppState {
            synthesizer,
            invoker: Arc::new(invoker),
        };
        let router = Self::build_router(&routes, state)?;
        Ok(Self { router, routes })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(routes: &[RouteEntry], state: AppState) -> Result<Router, ServerError> {
        let mut bindings: BTreeMap<String, MethodRouter<AppState>> = BTreeMap::new();

        for entry in routes {
            let entry = Arc::new(entry.clone());
            let bound = Arc::clone(&entry);
            let handler = move |State(state): State<AppState>, request: Request<Body>| {
                let entry = Arc::clone(&bound);
                async move { dispatch(state, entry, request).await }
            };

            let pattern = entry.listener_pattern();
            let method_router = bindings.remove(&pattern).unwrap_or_default();
            let method_router = if entry.method == ANY_METHOD {
                any(handler)
            } else {
                method_router.on(method_filter(&entry)?, handler)
            };
            bindings.insert(pattern, method_router);
        }

        let router = bindings
            .into_iter()
            .fold(Router::new(), |router, (pattern, method_router)| router.route(&pattern, method_router));

        Ok(router
            .with_state(state)
            .layer(propagate_request_id_layer())
            .layer(TraceLayer::new_for_http())
            .layer(set_request_id_layer()))
    }

    /// The bound routing table.
    pub fn routes(&self) -> &[RouteEntry] {
        &self.routes
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(self, listener: TcpListener, mut shutdown: broadcast::Receiver<()>) -> Result<(), ServerError> {
        let addr = listener.local_addr()?;

        for entry in self.routes.iter() {
            tracing::info!(
                kind = %entry.kind,
                method = %entry.method,
                pattern = %entry.pattern,
                "{} {} http://localhost:{}{}",
                entry.kind,
                entry.method,
                addr.port(),
                entry.pattern
            );
        }
        tracing::info!(address = %addr, "Api is running here: http://localhost:{}", addr.port());

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                tokio::select! {
                    _ = signals::shutdown_signal() => {}
                    _ = shutdown.recv() => {}
                }
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

fn method_filter(entry: &RouteEntry) -> Result<MethodFilter, ServerError> {
    let unsupported = || ServerError::UnsupportedMethod {
        pattern: entry.pattern.clone(),
        method: entry.method.clone(),
    };
    let method = Method::from_bytes(entry.method.as_bytes()).map_err(|_| unsupported())?;
    MethodFilter::try_from(method).map_err(|_| unsupported())
}

/// One request through the pipeline: gather → synthesize → invoke → translate.
async fn dispatch(state: AppState, entry: Arc<RouteEntry>, request: Request<Body>) -> Response {
    let start = Instant::now();
    let request_id = request_id(&request);
    let method = request.method().as_str().to_ascii_uppercase();
    let path = request.uri().path().to_string();

    tracing::debug!(request_id = %request_id, method = %method, path = %path, "Invoking handler");

    let response = match gather(request, entry.has_captures()).await {
        Err(e) => failure_reply(entry.kind, &method, &path, &InvocationFailure::new(e.to_string())),
        Ok(raw) => match state.synthesizer.synthesize(&entry, raw) {
            Err(e) => failure_reply(entry.kind, &method, &path, &InvocationFailure::from(e)),
            Ok(event) => {
                let outcome = state
                    .invoker
                    .invoke(&event, &InvocationContext::new(request_id.as_str()))
                    .await;
                translate(entry.kind, &method, &path, outcome)
            }
        },
    };

    metrics::record_invocation(entry.kind, response.status().as_u16(), start);
    response
}
