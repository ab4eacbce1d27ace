//! Saved (bookmarked) recipes per user
//!
//! The relation is an ordered list that may hold the same recipe more than
//! once: `save` always appends and `unsave` removes every occurrence. Entries
//! whose recipe has since been deleted are skipped when listing.

use sqlx::SqlitePool;
use tracing::{debug, info};

use super::models::Recipe;
use super::services::ensure_valid_id;
use crate::auth::AuthedUser;
use crate::common::ApiError;

pub struct SavedRelationManager {
    db: SqlitePool,
}

impl SavedRelationManager {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// The token only proves a username was signed; the user must still exist.
    async fn resolve_user(&self, user: &AuthedUser) -> Result<String, ApiError> {
        let row: Option<(String,)> = sqlx::query_as("SELECT username FROM users WHERE username = ?")
            .bind(&user.username)
            .fetch_optional(&self.db)
            .await?;

        row.map(|(username,)| username)
            .ok_or_else(|| ApiError::NotFound("User not found".to_string()))
    }

    pub async fn save(&self, user: &AuthedUser, recipe_id: &str) -> Result<(), ApiError> {
        ensure_valid_id(recipe_id)?;
        let username = self.resolve_user(user).await?;

        let exists: Option<(String,)> = sqlx::query_as("SELECT id FROM recipes WHERE id = ?")
            .bind(recipe_id)
            .fetch_optional(&self.db)
            .await?;
        if exists.is_none() {
            return Err(ApiError::NotFound("Recipe not found".to_string()));
        }

        sqlx::query("INSERT INTO saved_recipes (username, recipe_id) VALUES (?, ?)")
            .bind(&username)
            .bind(recipe_id)
            .execute(&self.db)
            .await?;

        info!(username = %username, recipe_id = %recipe_id, "Recipe saved");
        Ok(())
    }

    /// Removes every occurrence of `recipe_id`. Returns how many were removed;
    /// zero is not an error.
    pub async fn unsave(&self, user: &AuthedUser, recipe_id: &str) -> Result<u64, ApiError> {
        ensure_valid_id(recipe_id)?;
        let username = self.resolve_user(user).await?;

        let result = sqlx::query("DELETE FROM saved_recipes WHERE username = ? AND recipe_id = ?")
            .bind(&username)
            .bind(recipe_id)
            .execute(&self.db)
            .await?;

        info!(
            username = %username,
            recipe_id = %recipe_id,
            removed = result.rows_affected(),
            "Recipe unsaved"
        );
        Ok(result.rows_affected())
    }

    /// Saved recipes in the order they were saved, dangling entries omitted
    pub async fn list_saved(&self, user: &AuthedUser) -> Result<Vec<Recipe>, ApiError> {
        let username = self.resolve_user(user).await?;

        let recipes = sqlx::query_as::<_, Recipe>(
            r#"
            SELECT r.id, r.name, r.cuisine, r.ingredients, r.instructions, r.image_url,
                   r.cooking_time, r.owner, r.created_at
            FROM saved_recipes s
            INNER JOIN recipes r ON r.id = s.recipe_id
            WHERE s.username = ?
            ORDER BY s.seq ASC
            "#,
        )
        .bind(&username)
        .fetch_all(&self.db)
        .await?;

        debug!(username = %username, count = recipes.len(), "Fetched saved recipes");
        Ok(recipes)
    }
}
