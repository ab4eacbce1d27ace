//! Session token issuance and verification
//!
//! Tokens are HS256 JWTs carrying only `{username}`. The server keeps no
//! session table: a token is valid when its signature checks out against the
//! process-wide secret and its payload names a user.

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde_json::{Map, Value};
use thiserror::Error;

use super::models::Claims;
use crate::common::ApiError;

pub const BEARER_PREFIX: &str = "Bearer ";

/// Identity resolved from a verified token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub username: String,
}

/// Reasons a bearer credential is rejected, in the order they are checked
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GuardError {
    #[error("No authorization header")]
    MissingCredential,

    #[error("Invalid token format")]
    MalformedCredential,

    #[error("Invalid token: {0}")]
    InvalidSignature(String),

    #[error("Invalid token: missing username")]
    MissingClaim,
}

impl From<GuardError> for ApiError {
    fn from(err: GuardError) -> Self {
        match err {
            GuardError::MissingCredential | GuardError::MalformedCredential => {
                ApiError::Unauthorized(err.to_string())
            }
            GuardError::InvalidSignature(_) | GuardError::MissingClaim => {
                ApiError::InvalidToken(err.to_string())
            }
        }
    }
}

/// Signs a session token for `username`
pub fn issue_token(secret: &str, username: &str) -> Result<String, jsonwebtoken::errors::Error> {
    let claims = Claims {
        username: username.to_string(),
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// Stateless verifier for `Authorization: Bearer <token>` values
pub struct SessionGuard {
    key: DecodingKey,
    validation: Validation,
}

impl SessionGuard {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Tokens carry no expiry
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Checks a raw header value and resolves it to an identity
    pub fn verify(&self, header: Option<&str>) -> Result<Identity, GuardError> {
        let header = header.ok_or(GuardError::MissingCredential)?;
        let token = parse_bearer(header)?;

        let decoded = decode::<Map<String, Value>>(token, &self.key, &self.validation)
            .map_err(|e| GuardError::InvalidSignature(e.to_string()))?;

        match decoded.claims.get("username").and_then(Value::as_str) {
            Some(username) if !username.is_empty() => Ok(Identity {
                username: username.to_string(),
            }),
            _ => Err(GuardError::MissingClaim),
        }
    }
}

fn parse_bearer(header: &str) -> Result<&str, GuardError> {
    let token = header
        .strip_prefix(BEARER_PREFIX)
        .ok_or(GuardError::MalformedCredential)?;

    if token.is_empty() || token.contains(char::is_whitespace) {
        return Err(GuardError::MalformedCredential);
    }

    Ok(token)
}
