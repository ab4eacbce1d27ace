//! Authentication handlers

use axum::{
    extract::{Extension, Json},
    http::StatusCode,
    response::IntoResponse,
};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

use super::models::{CredentialsRequest, LoginResponse, RegisterResponse};
use super::services::AuthService;
use crate::common::{ApiError, ApiJson, AppState};

/// POST /auth/register
///
/// # Request Body
/// ```json
/// { "username": "alice", "password": "pw1" }
/// ```
///
/// # Response (201)
/// ```json
/// { "message": "User registered successfully!", "username": "alice" }
/// ```
pub async fn register_handler(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    ApiJson(payload): ApiJson<CredentialsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (username, password) = AuthService::credentials(payload)?;
    info!(username = %username, "Registration attempt");

    let state = state_lock.read().await;
    let service = AuthService::new(state.db.clone(), state.jwt_secret.clone());
    let username = service.register(&username, &password).await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "User registered successfully!".to_string(),
            username,
        }),
    ))
}

/// POST /auth/login
///
/// # Response (200)
/// ```json
/// { "token": "<jwt>", "username": "alice", "message": "Login successful" }
/// ```
pub async fn login_handler(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    ApiJson(payload): ApiJson<CredentialsRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let (username, password) = AuthService::credentials(payload)?;
    info!(username = %username, "Login attempt");

    let state = state_lock.read().await;
    let service = AuthService::new(state.db.clone(), state.jwt_secret.clone());
    let response = service.login(&username, &password).await?;

    Ok(Json(response))
}
