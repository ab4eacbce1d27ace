use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{info, warn};

use super::guard::issue_token;
use super::models::{CredentialsRequest, LoginResponse, User};
use super::password::{hash_password, verify_against_dummy, verify_password};
use crate::common::{safe_token_log, ApiError, ValidationResult, Validator};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Username and password are required")]
    MissingFields,

    #[error("Username already exists")]
    DuplicateUser,

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Password hashing failed: {0}")]
    Hashing(String),

    #[error("Token signing failed: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingFields => ApiError::ValidationError(err.to_string()),
            AuthError::DuplicateUser => ApiError::Conflict(err.to_string()),
            AuthError::InvalidCredentials => ApiError::Unauthorized(err.to_string()),
            AuthError::Hashing(_) | AuthError::Signing(_) => {
                ApiError::InternalServer(err.to_string())
            }
            AuthError::Database(e) => ApiError::DatabaseError(e),
        }
    }
}

pub struct CredentialsValidator;

impl Validator<CredentialsRequest> for CredentialsValidator {
    fn validate(&self, data: &CredentialsRequest) -> ValidationResult {
        let mut result = ValidationResult::new();

        if data.username.as_deref().map_or(true, |u| u.trim().is_empty()) {
            result.add_error("username", "Username is required");
        }
        if data.password.as_deref().map_or(true, str::is_empty) {
            result.add_error("password", "Password is required");
        }

        result
    }
}

/// Registers users and issues session tokens
pub struct AuthService {
    db: SqlitePool,
    jwt_secret: String,
}

impl AuthService {
    pub fn new(db: SqlitePool, jwt_secret: String) -> Self {
        Self { db, jwt_secret }
    }

    /// Pulls username/password out of a request body, rejecting blanks
    pub fn credentials(request: CredentialsRequest) -> Result<(String, String), AuthError> {
        if !CredentialsValidator.validate(&request).is_valid {
            return Err(AuthError::MissingFields);
        }
        match (request.username, request.password) {
            (Some(username), Some(password)) => Ok((username.trim().to_string(), password)),
            _ => Err(AuthError::MissingFields),
        }
    }

    /// Creates a user with an Argon2 hash of `password`. Returns the username.
    pub async fn register(&self, username: &str, password: &str) -> Result<String, AuthError> {
        if self.find_user(username).await?.is_some() {
            warn!(username = %username, "Registration rejected: username taken");
            return Err(AuthError::DuplicateUser);
        }

        let password = password.to_string();
        let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
            .await
            .map_err(|e| AuthError::Hashing(e.to_string()))?
            .map_err(AuthError::Hashing)?;

        sqlx::query("INSERT INTO users (username, password_hash) VALUES (?, ?)")
            .bind(username)
            .bind(&password_hash)
            .execute(&self.db)
            .await
            .map_err(|e| {
                // Lost a race with a concurrent registration of the same name
                if e.to_string().contains("UNIQUE constraint failed") {
                    AuthError::DuplicateUser
                } else {
                    AuthError::Database(e)
                }
            })?;

        info!(username = %username, "User registered");
        Ok(username.to_string())
    }

    /// Checks credentials and issues a token whose only claim is the username
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginResponse, AuthError> {
        let user = self.find_user(username).await?;

        let password = password.to_string();
        let stored_hash = user.as_ref().map(|u| u.password_hash.clone());
        let verified = tokio::task::spawn_blocking(move || match stored_hash {
            Some(hash) => verify_password(&password, &hash),
            None => {
                verify_against_dummy(&password);
                Ok(false)
            }
        })
        .await
        .map_err(|e| AuthError::Hashing(e.to_string()))?
        .map_err(AuthError::Hashing)?;

        let user = match (user, verified) {
            (Some(user), true) => user,
            _ => {
                warn!(username = %username, "Login rejected");
                return Err(AuthError::InvalidCredentials);
            }
        };

        let token = issue_token(&self.jwt_secret, &user.username)?;
        info!(
            username = %user.username,
            token = %safe_token_log(&token),
            "Login successful"
        );

        Ok(LoginResponse {
            token,
            username: user.username,
            message: "Login successful".to_string(),
        })
    }

    async fn find_user(&self, username: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            "SELECT username, password_hash FROM users WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&self.db)
        .await
    }
}
