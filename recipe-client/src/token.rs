//! Local decoding of session token payloads
//!
//! Only the payload segment is read; the signature is not (and cannot be)
//! checked here. A successful decode means the token is worth sending, not
//! that the server will accept it.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("token is not a three-part JWT")]
    Malformed,

    #[error("token payload is not valid base64 JSON")]
    BadPayload,

    #[error("token uses the old id-based format")]
    LegacyFormat,

    #[error("token payload has no username")]
    MissingUsername,
}

/// Decodes the `username` claim from a JWT without verifying it
pub fn decode_identity(token: &str) -> Result<Identity, TokenError> {
    let mut segments = token.split('.');
    let (Some(_header), Some(payload), Some(_signature), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        return Err(TokenError::Malformed);
    };

    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|_| TokenError::BadPayload)?;
    let claims: Map<String, Value> =
        serde_json::from_slice(&bytes).map_err(|_| TokenError::BadPayload)?;

    match claims.get("username").and_then(Value::as_str) {
        Some(username) if !username.is_empty() => Ok(Identity {
            username: username.to_string(),
        }),
        _ if claims.contains_key("id") => Err(TokenError::LegacyFormat),
        _ => Err(TokenError::MissingUsername),
    }
}

/// Builds an unsigned token around `payload`
#[cfg(test)]
pub(crate) fn fake_token(payload: &Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let body = URL_SAFE_NO_PAD.encode(payload.to_string());
    format!("{}.{}.signature", header, body)
}
