//! # Auth Module
//!
//! This module handles all authentication-related functionality including:
//! - Username/password registration with Argon2 password hashing
//! - Login and session token issuance
//! - Session token verification (`SessionGuard`)
//! - AuthedUser extractor for protected routes

pub mod extractors;
pub mod guard;
pub mod handlers;
pub mod models;
pub mod password;
pub mod routes;
pub mod services;


pub use extractors::AuthedUser;
pub use routes::auth_routes;
