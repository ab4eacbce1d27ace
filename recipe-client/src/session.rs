//! Persisted client session
//!
//! A session is the pair (token, username). Both live in [`SessionStorage`]
//! and are only ever written or removed together. The username is always
//! the one decoded from the token; a stored username that disagrees with
//! its token counts as a broken session.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, info, warn};

use crate::error::ClientError;
use crate::models::LoginResponse;
use crate::storage::{SessionStorage, SESSION_KEYS, TOKEN_KEY, USERNAME_KEY};
use crate::token::{decode_identity, Identity};

#[derive(Debug, Clone)]
struct Session {
    token: String,
    identity: Identity,
}

#[derive(Clone)]
pub struct SessionStore {
    storage: Arc<dyn SessionStorage>,
    current: Arc<RwLock<Option<Session>>>,
}

impl SessionStore {
    /// Restores the session from storage, clearing anything half-written
    /// or undecodable
    pub fn init(storage: Arc<dyn SessionStorage>) -> Self {
        let token = storage.get(TOKEN_KEY);
        let username = storage.get(USERNAME_KEY);

        let restored = match (token, username) {
            (None, None) => None,
            (Some(token), Some(username)) => match decode_identity(&token) {
                Ok(identity) if identity.username == username => {
                    info!(username = %identity.username, "Restored session");
                    Some(Session { token, identity })
                }
                Ok(identity) => {
                    warn!(
                        stored = %username,
                        decoded = %identity.username,
                        "Stored username does not match token, clearing session"
                    );
                    None
                }
                Err(e) => {
                    warn!(error = %e, "Stored token rejected, clearing session");
                    None
                }
            },
            _ => {
                warn!("Found a partial session in storage, clearing it");
                None
            }
        };

        let store = Self {
            storage,
            current: Arc::new(RwLock::new(None)),
        };

        match restored {
            Some(session) => *store.write() = Some(session),
            None => {
                if let Err(e) = store.clear() {
                    warn!(error = %e, "Failed to clear stored session");
                }
            }
        }
        store
    }

    fn read(&self) -> RwLockReadGuard<'_, Option<Session>> {
        self.current.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Option<Session>> {
        self.current.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Adopts a freshly issued token
    pub fn establish(&self, response: &LoginResponse) -> Result<Identity, ClientError> {
        let identity = decode_identity(&response.token).map_err(|e| {
            warn!(error = %e, "Server issued a token this client cannot read");
            ClientError::Decode(e.to_string())
        })?;
        if identity.username != response.username {
            debug!(
                reported = %response.username,
                decoded = %identity.username,
                "Login response username differs from token, using token"
            );
        }

        self.storage.set_all(&[
            (TOKEN_KEY, response.token.as_str()),
            (USERNAME_KEY, identity.username.as_str()),
        ])?;
        *self.write() = Some(Session {
            token: response.token.clone(),
            identity: identity.clone(),
        });

        info!(username = %identity.username, "Session established");
        Ok(identity)
    }

    /// Ends the session. Storage keys are removed before the in-memory
    /// session, and the in-memory session is dropped even if storage fails.
    pub fn clear(&self) -> Result<(), ClientError> {
        let removed = self.storage.remove_all(&SESSION_KEYS);
        *self.write() = None;
        removed
    }

    pub fn identity(&self) -> Option<Identity> {
        self.read().as_ref().map(|s| s.identity.clone())
    }

    pub fn is_authenticated(&self) -> bool {
        self.read().is_some()
    }

    /// Returns the token to attach to a request, re-checking it first
    ///
    /// A token that no longer decodes ends the session and yields
    /// [`ClientError::NotAuthenticated`] without touching the network.
    pub fn bearer(&self) -> Result<String, ClientError> {
        let token = match self.read().as_ref() {
            Some(session) => session.token.clone(),
            None => return Err(ClientError::NotAuthenticated),
        };

        if let Err(e) = decode_identity(&token) {
            warn!(error = %e, "Session token failed pre-flight check");
            if let Err(e) = self.clear() {
                warn!(error = %e, "Failed to clear stored session");
            }
            return Err(ClientError::NotAuthenticated);
        }
        Ok(token)
    }
}
