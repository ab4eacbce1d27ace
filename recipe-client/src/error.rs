use thiserror::Error;

/// `code` the server puts on a 403 caused by the token itself
pub const INVALID_TOKEN_CODE: &str = "INVALID_TOKEN";

/// Errors surfaced to the UI. Every variant renders as a readable message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    #[error("Please log in to continue")]
    NotAuthenticated,

    #[error("Your session is no longer valid ({status}): {message}")]
    Unauthorized { status: u16, message: String },

    #[error("Request failed ({status}): {message}")]
    Http { status: u16, message: String },

    #[error("Network error: {0}")]
    Transport(String),

    #[error("Unexpected response from server: {0}")]
    Decode(String),

    #[error("Could not update saved session: {0}")]
    Storage(String),
}

impl ClientError {
    /// Maps a non-success HTTP status to an error, singling out responses
    /// that reject the credential itself
    ///
    /// Every 401 is a credential failure. A 403 only is when the server tags
    /// it [`INVALID_TOKEN_CODE`]; other 403s deny one action and leave the
    /// session intact.
    pub fn from_status(status: u16, code: Option<&str>, message: impl Into<String>) -> Self {
        let message = message.into();
        match (status, code) {
            (401, _) | (403, Some(INVALID_TOKEN_CODE)) => ClientError::Unauthorized { status, message },
            _ => ClientError::Http { status, message },
        }
    }

    /// Whether this error should end the local session
    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self,
            ClientError::Unauthorized { .. } | ClientError::NotAuthenticated
        )
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ClientError::Decode(e.to_string())
        } else {
            ClientError::Transport(e.to_string())
        }
    }
}
