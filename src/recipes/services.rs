use chrono::{SecondsFormat, Utc};
use sqlx::SqlitePool;
use tracing::info;

use super::models::{OwnedDraft, Recipe, RecipeDraft};
use crate::common::{generate_recipe_id, is_valid_recipe_id, ApiError};

const RECIPE_COLUMNS: &str =
    "id, name, cuisine, ingredients, instructions, image_url, cooking_time, owner, created_at";

/// Rejects ids that could never have been issued before touching the store
pub fn ensure_valid_id(recipe_id: &str) -> Result<(), ApiError> {
    if is_valid_recipe_id(recipe_id) {
        Ok(())
    } else {
        Err(ApiError::BadRequest("Invalid recipe ID format".to_string()))
    }
}

/// Recipe store
pub struct RecipesService {
    db: SqlitePool,
}

impl RecipesService {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// All recipes, newest first
    pub async fn list_all(&self) -> Result<Vec<Recipe>, ApiError> {
        let recipes = sqlx::query_as::<_, Recipe>(&format!(
            "SELECT {} FROM recipes ORDER BY created_at DESC, rowid DESC",
            RECIPE_COLUMNS
        ))
        .fetch_all(&self.db)
        .await?;

        Ok(recipes)
    }

    /// Recipes created by `owner`, in creation order
    pub async fn list_by_owner(&self, owner: &str) -> Result<Vec<Recipe>, ApiError> {
        let recipes = sqlx::query_as::<_, Recipe>(&format!(
            "SELECT {} FROM recipes WHERE owner = ? ORDER BY created_at ASC, rowid ASC",
            RECIPE_COLUMNS
        ))
        .bind(owner)
        .fetch_all(&self.db)
        .await?;

        Ok(recipes)
    }

    pub async fn find(&self, recipe_id: &str) -> Result<Option<Recipe>, ApiError> {
        let recipe = sqlx::query_as::<_, Recipe>(&format!(
            "SELECT {} FROM recipes WHERE id = ?",
            RECIPE_COLUMNS
        ))
        .bind(recipe_id)
        .fetch_optional(&self.db)
        .await?;

        Ok(recipe)
    }

    /// Lookup by id: malformed id is a 400, unknown id a 404
    pub async fn get(&self, recipe_id: &str) -> Result<Recipe, ApiError> {
        ensure_valid_id(recipe_id)?;
        self.find(recipe_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Recipe not found".to_string()))
    }

    pub async fn create(&self, owned: OwnedDraft) -> Result<Recipe, ApiError> {
        let recipe_id = generate_recipe_id();
        let now = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);
        let ingredients = serde_json::to_string(&owned.draft.ingredients)
            .map_err(|e| ApiError::InternalServer(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO recipes (
                id, name, cuisine, ingredients, instructions, image_url,
                cooking_time, owner, created_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&recipe_id)
        .bind(&owned.draft.name)
        .bind(&owned.draft.cuisine)
        .bind(&ingredients)
        .bind(&owned.draft.instructions)
        .bind(&owned.draft.image_url)
        .bind(owned.draft.cooking_time)
        .bind(&owned.owner)
        .bind(&now)
        .execute(&self.db)
        .await?;

        info!(recipe_id = %recipe_id, owner = %owned.owner, "Recipe created");

        self.get(&recipe_id).await
    }

    /// Replaces the editable fields. Id, owner and creation time never change.
    pub async fn update(&self, recipe_id: &str, draft: RecipeDraft) -> Result<Recipe, ApiError> {
        let ingredients = serde_json::to_string(&draft.ingredients)
            .map_err(|e| ApiError::InternalServer(e.to_string()))?;

        let result = sqlx::query(
            r#"
            UPDATE recipes
            SET name = ?, cuisine = ?, ingredients = ?, instructions = ?,
                image_url = ?, cooking_time = ?
            WHERE id = ?
            "#,
        )
        .bind(&draft.name)
        .bind(&draft.cuisine)
        .bind(&ingredients)
        .bind(&draft.instructions)
        .bind(&draft.image_url)
        .bind(draft.cooking_time)
        .bind(recipe_id)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound("Recipe not found".to_string()));
        }

        info!(recipe_id = %recipe_id, "Recipe updated");
        self.get(recipe_id).await
    }

    /// Deletes the recipe row only. Saved references to it are left dangling.
    pub async fn delete(&self, recipe_id: &str) -> Result<(), ApiError> {
        let result = sqlx::query("DELETE FROM recipes WHERE id = ?")
            .bind(recipe_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound("Recipe not found".to_string()));
        }

        info!(recipe_id = %recipe_id, "Recipe deleted");
        Ok(())
    }
}
