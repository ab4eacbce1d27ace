//! # Recipes Module
//!
//! This module handles all recipe-related functionality including:
//! - Recipe browsing and detail lookup (public)
//! - Recipe creation, update and deletion, gated by ownership
//! - The per-user saved (bookmarked) recipe relation

pub mod handlers;
pub mod models;
pub mod ownership;
pub mod routes;
pub mod saved;
pub mod services;
pub mod validators;

#[cfg(test)]
mod tests;

pub use routes::recipes_routes;
