//! Authentication extractors for Axum

use async_trait::async_trait;
use axum::{
    extract::{Extension, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use super::guard::{GuardError, SessionGuard};
use crate::common::{ApiError, AppState};

/// Authenticated user extractor
///
/// Runs the `SessionGuard` checks on the `Authorization` header. A rejection
/// short-circuits the handler, so nothing is read from or written to the
/// stores for unauthenticated requests.
#[derive(Debug, Clone)]
pub struct AuthedUser {
    pub username: String,
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Extension(state_lock): Extension<Arc<RwLock<AppState>>> =
            Extension::from_request_parts(parts, state)
                .await
                .map_err(|_| ApiError::InternalServer("missing app state".to_string()))?;

        let jwt_secret = state_lock.read().await.jwt_secret.clone();
        let guard = SessionGuard::new(&jwt_secret);

        let header = match parts.headers.get(AUTHORIZATION) {
            None => None,
            Some(value) => Some(value.to_str().map_err(|_| {
                warn!("Authentication failed: non-ASCII Authorization header");
                ApiError::from(GuardError::MalformedCredential)
            })?),
        };

        match guard.verify(header) {
            Ok(identity) => {
                debug!(username = %identity.username, "Session token verified");
                Ok(AuthedUser {
                    username: identity.username,
                })
            }
            Err(e) => {
                warn!(error = %e, "Authentication failed");
                Err(e.into())
            }
        }
    }
}
