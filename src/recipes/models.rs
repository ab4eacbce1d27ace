use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::common::helpers::{deserialize_string_list, serialize_string_list};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    pub id: String,
    pub name: String,
    pub cuisine: String,
    // JSON array string in the database, a plain array on the wire
    #[serde(
        serialize_with = "serialize_string_list",
        deserialize_with = "deserialize_string_list"
    )]
    pub ingredients: String,
    pub instructions: String,
    pub image_url: String,
    pub cooking_time: i64,
    pub owner: String,
    pub created_at: String,
}

/// Ingredients arrive either as an array or as one comma-separated string
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum IngredientsInput {
    List(Vec<String>),
    Text(String),
}

/// Cooking time arrives as a whole number, a fractional number (truncated
/// to whole minutes) or a numeric string
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CookingTimeInput {
    Minutes(i64),
    Fractional(f64),
    Text(String),
}

/// Body for `POST /recipes` and `PUT /recipes/:id`
///
/// There is no owner field: a client-sent `owner`/`userOwner` is dropped as
/// an unknown key.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeRequest {
    pub name: Option<String>,
    pub cuisine: Option<String>,
    pub ingredients: Option<IngredientsInput>,
    pub instructions: Option<String>,
    pub image_url: Option<String>,
    pub cooking_time: Option<CookingTimeInput>,
}

/// Validated recipe fields, before an owner is attached
#[derive(Debug, Clone, PartialEq)]
pub struct RecipeDraft {
    pub name: String,
    pub cuisine: String,
    pub ingredients: Vec<String>,
    pub instructions: String,
    pub image_url: String,
    pub cooking_time: i64,
}

/// A draft the ownership gate has cleared for insertion
#[derive(Debug, Clone, PartialEq)]
pub struct OwnedDraft {
    pub draft: RecipeDraft,
    pub owner: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}
