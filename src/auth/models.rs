//! Authentication data models

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Session token claims
///
/// Exactly one claim is issued. There is no `exp`: tokens stay valid until the
/// signing secret changes.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Claims {
    pub username: String,
}

/// Credential store row. Never serialized: the hash stays on the server.
#[derive(FromRow, Debug)]
pub struct User {
    pub username: String,
    pub password_hash: String,
}

/// Body for both `/auth/register` and `/auth/login`
///
/// Fields are optional so a missing field is reported as a 400 by the
/// validator instead of a JSON rejection.
#[derive(Deserialize, Debug, Default)]
pub struct CredentialsRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct RegisterResponse {
    pub message: String,
    pub username: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct LoginResponse {
    pub token: String,
    pub username: String,
    pub message: String,
}
