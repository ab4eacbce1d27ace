//! Authentication routes

use axum::{routing::post, Router};

use super::handlers;

/// Creates and returns the authentication router
///
/// # Routes
/// - `POST /auth/register` - Create a username/password account
/// - `POST /auth/login` - Exchange credentials for a session token
pub fn auth_routes() -> Router {
    Router::new()
        .route("/auth/register", post(handlers::register_handler))
        .route("/auth/login", post(handlers::login_handler))
}
