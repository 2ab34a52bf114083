//! Request handling and transformation.
//!
//! # Responsibilities
//! - Tag every request with an `x-request-id` (UUID v4) unless the caller sent one
//! - Gather headers, path captures, query and the buffered body
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - Bodies are read to completion before synthesis; no streaming

use axum::body::{to_bytes, Body};
use axum::extract::rejection::RawPathParamsRejection;
use axum::extract::{FromRequestParts, RawPathParams};
use axum::http::{HeaderName, Request};
use thiserror::Error;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};

use crate::event::RawTransportInput;

/// Header carrying the request id.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Layer assigning a request id to requests that lack one.
pub fn set_request_id_layer() -> SetRequestIdLayer<MakeRequestUuid> {
    SetRequestIdLayer::new(HeaderName::from_static(X_REQUEST_ID), MakeRequestUuid)
}

/// Layer copying the request id onto the response.
pub fn propagate_request_id_layer() -> PropagateRequestIdLayer {
    PropagateRequestIdLayer::new(HeaderName::from_static(X_REQUEST_ID))
}

/// Request id of an incoming request, or a fresh one.
pub fn request_id<B>(request: &Request<B>) -> String {
    request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string())
}

/// Failures while reading an inbound request.
#[derive(Debug, Error)]
pub enum GatherError {
    #[error("failed to read path parameters: {0}")]
    PathParams(#[from] RawPathParamsRejection),

    #[error("failed to read request body: {0}")]
    Body(#[from] axum::Error),
}

/// Split an inbound request into transport input, buffering the whole body.
///
/// `captures` says whether the matched route has placeholders; only then are
/// path parameters extracted, and a rejection is an error.
pub async fn gather(request: Request<Body>, captures: bool) -> Result<RawTransportInput, GatherError> {
    let (mut parts, body) = request.into_parts();

    let path_params = if captures {
        RawPathParams::from_request_parts(&mut parts, &())
            .await?
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect()
    } else {
        Default::default()
    };

    let headers = parts
        .headers
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            )
        })
        .collect();

    let body = to_bytes(body, usize::MAX).await?;

    Ok(RawTransportInput {
        method: parts.method.as_str().to_string(),
        path: parts.uri.path().to_string(),
        headers,
        path_params,
        query: parts.uri.query().map(str::to_string),
        body,
    })
}
