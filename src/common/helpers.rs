// Helper functions for safe logging and serialization

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Masks tokens for safe logging
/// Shows only first and last 4 characters
///
/// # Example
/// ```
/// let masked = safe_token_log("eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9");
/// // Returns: "eyJh...VCJ9"
/// ```
pub fn safe_token_log(token: &str) -> String {
    if token.len() > 8 && token.is_ascii() {
        format!("{}...{}", &token[..4], &token[token.len() - 4..])
    } else {
        "***".to_string()
    }
}

/// Serializes a JSON-encoded string list (as stored in the database) to an array
pub fn serialize_string_list<S>(list: &str, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let items: Vec<String> = serde_json::from_str(list).unwrap_or_default();
    items.serialize(serializer)
}

/// Deserializes an array into a JSON-encoded string for database storage
pub fn deserialize_string_list<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let items: Vec<String> = Vec::deserialize(deserializer)?;
    serde_json::to_string(&items).map_err(serde::de::Error::custom)
}
