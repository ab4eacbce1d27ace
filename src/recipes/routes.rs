use super::handlers;
use axum::{
    routing::{get, post},
    Router,
};

/// Creates the recipes router
///
/// Static segments (`saved`, `save`, `userRecipes`) take priority over the
/// `:id` capture.
pub fn recipes_routes() -> Router {
    Router::new()
        .route(
            "/recipes",
            get(handlers::list_recipes).post(handlers::create_recipe),
        )
        .route("/recipes/saved", get(handlers::list_saved_recipes))
        .route(
            "/recipes/save/:id",
            post(handlers::save_recipe).delete(handlers::unsave_recipe),
        )
        .route(
            "/recipes/userRecipes/:username",
            get(handlers::list_user_recipes),
        )
        .route(
            "/recipes/:id",
            get(handlers::get_recipe)
                .put(handlers::update_recipe)
                .delete(handlers::delete_recipe),
        )
}
