// Common module - shared types and utilities across all modules

pub mod config;
pub mod error;
pub mod helpers;
pub mod id_generator;
pub mod json;
pub mod migrations;
pub mod state;
pub mod validation;

// Re-export commonly used types for convenience
pub use config::AppConfig;
pub use error::ApiError;
pub use helpers::safe_token_log;
pub use id_generator::{generate_recipe_id, is_valid_recipe_id};
pub use json::ApiJson;
pub use state::AppState;
pub use validation::{ValidationResult, Validator};
