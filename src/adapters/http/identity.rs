use axum::{extract::FromRequestParts, http::HeaderMap, http::request::Parts};
use base64::{Engine, engine::general_purpose::STANDARD};

use crate::{
    app_error::{AppError, AppResult},
    domain::entities::identity::{Identity, XRhIdentity},
};

pub const IDENTITY_HEADER: &str = "x-rh-identity";
pub const CERT_CN_HEADER: &str = "x-rh-certauth-cn";

/// Caller identity decoded from the gateway's `x-rh-identity` header.
#[derive(Debug, Clone)]
pub struct RhIdentity(pub Identity);

impl<S> FromRequestParts<S> for RhIdentity
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(IDENTITY_HEADER)
            .ok_or_else(|| AppError::InvalidInput(format!("missing {IDENTITY_HEADER} header")))?;

        decode_identity(raw.as_bytes()).map(RhIdentity)
    }
}

pub fn decode_identity(raw: &[u8]) -> AppResult<Identity> {
    let decoded = STANDARD
        .decode(raw.trim_ascii())
        .map_err(|e| AppError::InvalidInput(format!("invalid {IDENTITY_HEADER} header: {e}")))?;

    let identity: XRhIdentity = serde_json::from_slice(&decoded)
        .map_err(|e| AppError::InvalidInput(format!("invalid {IDENTITY_HEADER} header: {e}")))?;
    Ok(identity.identity)
}

/// First address in `header_name`, as set by the gateway.
pub fn forwarded_ip(headers: &HeaderMap, header_name: &str) -> Option<String> {
    if let Some(forwarded) = headers.get(header_name)
        && let Ok(val) = forwarded.to_str()
        && let Some(first) = val.split(',').next()
    {
        let trimmed = first.trim();
        if !trimmed.is_empty() {
            return Some(trimmed.to_string());
        }
    }
    None
}

pub fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}
