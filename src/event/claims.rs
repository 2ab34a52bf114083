//! Bearer token claims extraction.
//!
//! The payload segment of a `header.payload.signature` token is decoded and
//! attached to the request context. Signatures and expiry are not checked:
//! this is a local-simulation convenience, not a security boundary.

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine as _;
use serde_json::Value;
use thiserror::Error;

use crate::event::types::ClaimsContext;

/// URL-safe alphabet, padding optional. Standard-alphabet input is mapped
/// onto it before decoding.
const PAYLOAD_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// A bearer token was present but its payload could not be read.
#[derive(Debug, Error)]
pub enum ClaimsError {
    #[error("bearer token has no payload segment")]
    MissingPayload,

    #[error("bearer token payload is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("bearer token payload is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("bearer token payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("bearer token payload is not a JSON object")]
    NotAnObject,
}

/// Extract claims from an `Authorization` header value.
///
/// Returns `Ok(None)` when the header is absent or uses another scheme.
pub fn extract(authorization: Option<&str>) -> Result<Option<ClaimsContext>, ClaimsError> {
    let Some(token) = authorization.and_then(bearer_token) else {
        return Ok(None);
    };

    let payload = token
        .split('.')
        .nth(1)
        .filter(|segment| !segment.is_empty())
        .ok_or(ClaimsError::MissingPayload)?;

    let normalized: String = payload
        .trim()
        .chars()
        .map(|c| match c {
            '+' => '-',
            '/' => '_',
            other => other,
        })
        .collect();
    let bytes = PAYLOAD_ENGINE.decode(normalized)?;
    let text = String::from_utf8(bytes)?;

    match serde_json::from_str::<Value>(&text)? {
        Value::Object(claims) => Ok(Some(ClaimsContext::new(claims))),
        _ => Err(ClaimsError::NotAnObject),
    }
}

fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    scheme.eq_ignore_ascii_case("bearer").then(|| token.trim())
}
