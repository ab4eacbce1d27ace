use super::models::{MessageResponse, RecipeRequest};
use super::ownership::RecipeOwnershipGate;
use super::saved::SavedRelationManager;
use super::services::RecipesService;
use super::validators;
use crate::auth::AuthedUser;
use crate::common::{ApiError, ApiJson, AppState};
use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

// ============================================================================
// Public browsing
// ============================================================================

/// GET /recipes - All recipes, newest first
pub async fn list_recipes(
    Extension(state): Extension<Arc<RwLock<AppState>>>,
) -> Result<impl IntoResponse, ApiError> {
    let app_state = state.read().await;
    let recipes = RecipesService::new(app_state.db.clone()).list_all().await?;

    info!(count = recipes.len(), "Fetched recipes");
    Ok(Json(recipes))
}

/// GET /recipes/:id - Recipe detail
pub async fn get_recipe(
    Extension(state): Extension<Arc<RwLock<AppState>>>,
    Path(recipe_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let app_state = state.read().await;
    let recipe = RecipesService::new(app_state.db.clone())
        .get(&recipe_id)
        .await?;

    Ok(Json(recipe))
}

/// GET /recipes/userRecipes/:username - Recipes shared by one user
pub async fn list_user_recipes(
    Extension(state): Extension<Arc<RwLock<AppState>>>,
    Path(username): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let app_state = state.read().await;
    let recipes = RecipesService::new(app_state.db.clone())
        .list_by_owner(&username)
        .await?;

    Ok(Json(recipes))
}

// ============================================================================
// Owner-scoped mutations
// ============================================================================

/// POST /recipes - Create a recipe owned by the caller
pub async fn create_recipe(
    Extension(state): Extension<Arc<RwLock<AppState>>>,
    user: AuthedUser,
    ApiJson(request): ApiJson<RecipeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let draft = validators::into_draft(request)?;
    let owned = RecipeOwnershipGate::authorize_create(&user, draft);

    let app_state = state.read().await;
    let recipe = RecipesService::new(app_state.db.clone())
        .create(owned)
        .await?;

    Ok((StatusCode::CREATED, Json(recipe)))
}

/// PUT /recipes/:id - Replace a recipe's fields (owner only)
pub async fn update_recipe(
    Extension(state): Extension<Arc<RwLock<AppState>>>,
    user: AuthedUser,
    Path(recipe_id): Path<String>,
    ApiJson(request): ApiJson<RecipeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let app_state = state.read().await;
    let service = RecipesService::new(app_state.db.clone());

    let existing = service.get(&recipe_id).await?;
    RecipeOwnershipGate::authorize_mutate(&user, &existing)?;

    let draft = validators::into_draft(request)?;
    let recipe = service.update(&recipe_id, draft).await?;

    Ok(Json(recipe))
}

/// DELETE /recipes/:id - Delete a recipe (owner only)
pub async fn delete_recipe(
    Extension(state): Extension<Arc<RwLock<AppState>>>,
    user: AuthedUser,
    Path(recipe_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let app_state = state.read().await;
    let service = RecipesService::new(app_state.db.clone());

    let existing = service.get(&recipe_id).await?;
    RecipeOwnershipGate::authorize_mutate(&user, &existing)?;
    service.delete(&recipe_id).await?;

    Ok(Json(MessageResponse::new("Recipe deleted successfully")))
}

// ============================================================================
// Saved recipes
// ============================================================================

/// GET /recipes/saved - The caller's saved recipes
pub async fn list_saved_recipes(
    Extension(state): Extension<Arc<RwLock<AppState>>>,
    user: AuthedUser,
) -> Result<impl IntoResponse, ApiError> {
    let app_state = state.read().await;
    let recipes = SavedRelationManager::new(app_state.db.clone())
        .list_saved(&user)
        .await?;

    Ok(Json(recipes))
}

/// POST /recipes/save/:id - Bookmark a recipe
pub async fn save_recipe(
    Extension(state): Extension<Arc<RwLock<AppState>>>,
    user: AuthedUser,
    Path(recipe_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let app_state = state.read().await;
    SavedRelationManager::new(app_state.db.clone())
        .save(&user, &recipe_id)
        .await?;

    Ok(Json(MessageResponse::new("Recipe saved successfully")))
}

/// DELETE /recipes/save/:id - Remove a bookmark
pub async fn unsave_recipe(
    Extension(state): Extension<Arc<RwLock<AppState>>>,
    user: AuthedUser,
    Path(recipe_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let app_state = state.read().await;
    SavedRelationManager::new(app_state.db.clone())
        .unsave(&user, &recipe_id)
        .await?;

    Ok(Json(MessageResponse::new(
        "Recipe removed from saved recipes",
    )))
}
