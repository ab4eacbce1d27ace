// src/common/id_generator.rs
//! Crockford Base32 ID Generator
//!
//! Generates human-readable, prefixed IDs using Crockford Base32 encoding.
//! Format: PREFIX_XXXXXX (e.g., R_K7NP3X for recipes)
//!
//! IDs arriving from clients are checked with [`is_valid_id`] before any
//! store lookup, so a malformed path segment is rejected as bad input
//! rather than reported as a missing record.

use rand::Rng;

/// Crockford Base32 alphabet (excludes I, L, O, U to avoid confusion)
const CROCKFORD_ALPHABET: &[u8; 32] = b"0123456789ABCDEFGHJKMNPQRSTVWXYZ";

/// Number of random characters after the prefix
const ID_LENGTH: usize = 6;

/// Entity type prefixes for ID generation
#[derive(Debug, Clone, Copy)]
pub enum EntityPrefix {
    /// Recipe (R_)
    Recipe,
}

impl EntityPrefix {
    /// Get the string prefix for this entity type
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityPrefix::Recipe => "R",
        }
    }
}

/// Generate a random Crockford Base32 string of specified length
fn generate_crockford_string(length: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| {
            let idx = rng.gen_range(0..32);
            CROCKFORD_ALPHABET[idx] as char
        })
        .collect()
}

/// Generate a prefixed ID using Crockford Base32 encoding
///
/// # Returns
/// A string in format "PREFIX_XXXXXX" (e.g., "R_K7NP3X")
pub fn generate_id(prefix: EntityPrefix) -> String {
    format!("{}_{}", prefix.as_str(), generate_crockford_string(ID_LENGTH))
}

/// Generate a Recipe ID (R_XXXXXX)
pub fn generate_recipe_id() -> String {
    generate_id(EntityPrefix::Recipe)
}

/// Checks that `id` has exactly the shape produced by [`generate_id`] for `prefix`
pub fn is_valid_id(prefix: EntityPrefix, id: &str) -> bool {
    let Some(rest) = id
        .strip_prefix(prefix.as_str())
        .and_then(|r| r.strip_prefix('_'))
    else {
        return false;
    };

    rest.len() == ID_LENGTH && rest.bytes().all(|b| CROCKFORD_ALPHABET.contains(&b))
}

/// Checks that `id` is a well-formed recipe identifier
pub fn is_valid_recipe_id(id: &str) -> bool {
    is_valid_id(EntityPrefix::Recipe, id)
}
