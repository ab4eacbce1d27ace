// Application state shared across all modules

use sqlx::SqlitePool;

/// Application state containing the database pool and the token signing secret
///
/// Handlers only ever take the read lock; nothing mutates this after startup.
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub jwt_secret: String,
}
