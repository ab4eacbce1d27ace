//! Ownership rules for mutating recipe operations

use tracing::warn;

use super::models::{OwnedDraft, Recipe, RecipeDraft};
use crate::auth::AuthedUser;
use crate::common::ApiError;

pub struct RecipeOwnershipGate;

impl RecipeOwnershipGate {
    /// Any verified user may create. The owner is always the caller; whatever
    /// owner the client sent was already discarded when the draft was built.
    pub fn authorize_create(user: &AuthedUser, draft: RecipeDraft) -> OwnedDraft {
        OwnedDraft {
            draft,
            owner: user.username.clone(),
        }
    }

    /// Update and delete are limited to the recipe's owner
    pub fn authorize_mutate(user: &AuthedUser, recipe: &Recipe) -> Result<(), ApiError> {
        if user.username == recipe.owner {
            return Ok(());
        }

        warn!(
            username = %user.username,
            recipe_id = %recipe.id,
            owner = %recipe.owner,
            "Rejected change to a recipe owned by another user"
        );
        Err(ApiError::Forbidden(
            "Only the recipe's owner can modify it".to_string(),
        ))
    }
}
