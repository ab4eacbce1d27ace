//! Tests for recipes module
//!
//! These tests drive the full router against an in-memory database:
//! - Session checks on protected routes, and that rejected requests change nothing
//! - Owner assignment on create and owner-only update/delete
//! - Save/unsave/list semantics including duplicates and dangling references

#[cfg(test)]
mod tests {
    use crate::auth::guard::issue_token;
    use crate::common::migrations::test_support::setup_test_db;
    use crate::common::AppState;
    use axum::{
        body::Body,
        http::{
            header::{AUTHORIZATION, CONTENT_TYPE},
            Method, Request, StatusCode,
        },
        Router,
    };
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::{json, Value};
    use sqlx::SqlitePool;
    use std::sync::Arc;
    use tokio::sync::RwLock;
    use tower::ServiceExt;

    const SECRET: &str = "test_secret_key";

    async fn test_app() -> (Router, SqlitePool) {
        let pool = setup_test_db().await;
        let state = Arc::new(RwLock::new(AppState {
            db: pool.clone(),
            jwt_secret: SECRET.to_string(),
        }));
        let app = crate::build_router(state, &["http://localhost:3000".to_string()]);
        (app, pool)
    }

    async fn send_raw(
        app: &Router,
        method: Method,
        uri: &str,
        authorization: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(value) = authorization {
            builder = builder.header(AUTHORIZATION, value);
        }
        let request = match body {
            Some(body) => builder
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let authorization = token.map(|t| format!("Bearer {}", t));
        send_raw(app, method, uri, authorization.as_deref(), body).await
    }

    async fn register_and_login(app: &Router, username: &str, password: &str) -> String {
        let credentials = json!({ "username": username, "password": password });

        let (status, body) = send(app, Method::POST, "/auth/register", None, Some(credentials.clone())).await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        assert_eq!(body["username"], username);

        let (status, body) = send(app, Method::POST, "/auth/login", None, Some(credentials)).await;
        assert_eq!(status, StatusCode::OK, "{}", body);
        assert_eq!(body["username"], username);
        body["token"].as_str().unwrap().to_string()
    }

    fn soup() -> Value {
        json!({
            "name": "Soup",
            "cuisine": "French",
            "ingredients": ["water", "salt"],
            "instructions": "boil",
            "imageUrl": "http://x/y.png",
            "cookingTime": 10
        })
    }

    async fn create(app: &Router, token: &str, body: Value) -> Value {
        let (status, recipe) = send(app, Method::POST, "/recipes", Some(token), Some(body)).await;
        assert_eq!(status, StatusCode::CREATED, "{}", recipe);
        recipe
    }

    async fn count(pool: &SqlitePool, table: &str) -> i64 {
        let (n,): (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {}", table))
            .fetch_one(pool)
            .await
            .unwrap();
        n
    }

    // ------------------------------------------------------------------------
    // End-to-end scenario
    // ------------------------------------------------------------------------

    #[tokio::test]
    async fn test_publish_and_save_scenario() {
        let (app, _pool) = test_app().await;
        let token = register_and_login(&app, "alice", "pw1").await;

        let recipe = create(&app, &token, soup()).await;
        assert_eq!(recipe["owner"], "alice");
        assert_eq!(recipe["name"], "Soup");
        assert_eq!(recipe["ingredients"], json!(["water", "salt"]));
        assert_eq!(recipe["imageUrl"], "http://x/y.png");
        assert_eq!(recipe["cookingTime"], 10);
        let id = recipe["id"].as_str().unwrap().to_string();

        let (status, saved) = send(&app, Method::GET, "/recipes/saved", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(saved, json!([]));

        let (status, _) = send(&app, Method::POST, &format!("/recipes/save/{}", id), Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, saved) = send(&app, Method::GET, "/recipes/saved", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        let saved = saved.as_array().unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0]["id"], id.as_str());
        assert_eq!(saved[0]["name"], "Soup");
    }

    // ------------------------------------------------------------------------
    // Session checks
    // ------------------------------------------------------------------------

    #[tokio::test]
    async fn test_protected_route_rejections_in_order() {
        let (app, pool) = test_app().await;
        register_and_login(&app, "alice", "pw1").await;

        let (status, body) = send_raw(&app, Method::POST, "/recipes", None, Some(soup())).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "No authorization header");

        let good = issue_token(SECRET, "alice").unwrap();
        let (status, body) = send_raw(&app, Method::POST, "/recipes", Some(&good), Some(soup())).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Invalid token format");

        let forged = issue_token("some_other_secret", "alice").unwrap();
        let (status, body) = send(&app, Method::POST, "/recipes", Some(&forged), Some(soup())).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["code"], "INVALID_TOKEN");
        assert!(body["error"].as_str().unwrap().starts_with("Invalid token:"));

        let legacy = encode(
            &Header::default(),
            &json!({ "id": "64b7f0c2e1" }),
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();
        let (status, body) = send(&app, Method::POST, "/recipes", Some(&legacy), Some(soup())).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["code"], "INVALID_TOKEN");
        assert_eq!(body["error"], "Invalid token: missing username");

        // Nothing was written by any rejected request
        assert_eq!(count(&pool, "recipes").await, 0);
    }

    #[tokio::test]
    async fn test_rejected_save_has_no_side_effects() {
        let (app, pool) = test_app().await;
        let token = register_and_login(&app, "alice", "pw1").await;
        let id = create(&app, &token, soup()).await["id"].as_str().unwrap().to_string();

        let forged = issue_token("some_other_secret", "alice").unwrap();
        let (status, _) = send(&app, Method::POST, &format!("/recipes/save/{}", id), Some(&forged), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(count(&pool, "saved_recipes").await, 0);
    }

    // ------------------------------------------------------------------------
    // Auth endpoints
    // ------------------------------------------------------------------------

    #[tokio::test]
    async fn test_register_rejects_duplicate_and_missing_fields() {
        let (app, _pool) = test_app().await;
        register_and_login(&app, "alice", "pw1").await;

        let (status, body) = send(
            &app,
            Method::POST,
            "/auth/register",
            None,
            Some(json!({ "username": "alice", "password": "x" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Username already exists");

        let (status, _) = send(&app, Method::POST, "/auth/register", None, Some(json!({ "username": "bob" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_login_failures_look_identical() {
        let (app, _pool) = test_app().await;
        register_and_login(&app, "alice", "pw1").await;

        let wrong = send(
            &app,
            Method::POST,
            "/auth/login",
            None,
            Some(json!({ "username": "alice", "password": "nope" })),
        )
        .await;
        let unknown = send(
            &app,
            Method::POST,
            "/auth/login",
            None,
            Some(json!({ "username": "nobody", "password": "pw1" })),
        )
        .await;

        assert_eq!(wrong.0, StatusCode::UNAUTHORIZED);
        assert_eq!(wrong, unknown);
    }

    // ------------------------------------------------------------------------
    // Recipe creation and ownership
    // ------------------------------------------------------------------------

    #[tokio::test]
    async fn test_client_supplied_owner_is_ignored() {
        let (app, _pool) = test_app().await;
        let token = register_and_login(&app, "alice", "pw1").await;

        let mut body = soup();
        body["owner"] = json!("mallory");
        assert_eq!(create(&app, &token, body).await["owner"], "alice");

        let mut body = soup();
        body["userOwner"] = json!("mallory");
        assert_eq!(create(&app, &token, body).await["owner"], "alice");
    }

    #[tokio::test]
    async fn test_create_reports_missing_fields() {
        let (app, _pool) = test_app().await;
        let token = register_and_login(&app, "alice", "pw1").await;

        let (status, body) = send(
            &app,
            Method::POST,
            "/recipes",
            Some(&token),
            Some(json!({ "cuisine": "French", "ingredients": ["water"], "instructions": "boil", "cookingTime": 5 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Missing required fields: name, imageUrl");
    }

    #[tokio::test]
    async fn test_create_normalizes_loose_input() {
        let (app, _pool) = test_app().await;
        let token = register_and_login(&app, "alice", "pw1").await;

        let recipe = create(
            &app,
            &token,
            json!({
                "name": "Toast",
                "ingredients": "bread, butter ,",
                "instructions": "toast it",
                "imageUrl": "https://x/t.png",
                "cookingTime": "3"
            }),
        )
        .await;

        assert_eq!(recipe["ingredients"], json!(["bread", "butter"]));
        assert_eq!(recipe["cookingTime"], 3);
        assert_eq!(recipe["cuisine"], "Not specified");
    }

    #[tokio::test]
    async fn test_create_rejects_negative_cooking_time() {
        let (app, _pool) = test_app().await;
        let token = register_and_login(&app, "alice", "pw1").await;

        let mut body = soup();
        body["cookingTime"] = json!(-5);
        let (status, body) = send(&app, Method::POST, "/recipes", Some(&token), Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "cookingTime: Cooking time must not be negative");
    }

    #[tokio::test]
    async fn test_fractional_cooking_time_is_truncated() {
        let (app, _pool) = test_app().await;
        let token = register_and_login(&app, "alice", "pw1").await;

        let mut body = soup();
        body["cookingTime"] = json!(10.5);
        assert_eq!(create(&app, &token, body).await["cookingTime"], 10);

        let mut body = soup();
        body["cookingTime"] = json!(-0.5);
        let (status, body) = send(&app, Method::POST, "/recipes", Some(&token), Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "cookingTime: Cooking time must not be negative");
    }

    #[tokio::test]
    async fn test_mistyped_body_is_validation_error() {
        let (app, pool) = test_app().await;
        let token = register_and_login(&app, "alice", "pw1").await;

        let mut body = soup();
        body["name"] = json!(5);
        let (status, body) = send(&app, Method::POST, "/recipes", Some(&token), Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert!(body["error"].as_str().unwrap().starts_with("Invalid request body:"));

        let (status, body) = send(&app, Method::POST, "/recipes", Some(&token), Some(json!([1, 2]))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");

        assert_eq!(count(&pool, "recipes").await, 0);
    }

    #[tokio::test]
    async fn test_register_without_content_type_is_validation_error() {
        let (app, pool) = test_app().await;

        let request = Request::builder()
            .method(Method::POST)
            .uri("/auth/register")
            .body(Body::from(r#"{"username":"alice","password":"pw1"}"#))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert_eq!(count(&pool, "users").await, 0);
    }

    #[tokio::test]
    async fn test_delete_is_owner_only() {
        let (app, _pool) = test_app().await;
        let alice = register_and_login(&app, "alice", "pw1").await;
        let bob = register_and_login(&app, "bob", "pw2").await;
        let id = create(&app, &alice, soup()).await["id"].as_str().unwrap().to_string();
        let uri = format!("/recipes/{}", id);

        // Anonymous and non-owner deletes are refused; the recipe survives
        let (status, _) = send(&app, Method::DELETE, &uri, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let (status, body) = send(&app, Method::DELETE, &uri, Some(&bob), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        // A denied action, not a dead session
        assert_eq!(body["code"], "FORBIDDEN");
        let (status, _) = send(&app, Method::GET, &uri, None, None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = send(&app, Method::DELETE, &uri, Some(&alice), None).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = send(&app, Method::GET, &uri, None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_update_is_owner_only_and_keeps_identity() {
        let (app, _pool) = test_app().await;
        let alice = register_and_login(&app, "alice", "pw1").await;
        let bob = register_and_login(&app, "bob", "pw2").await;
        let created = create(&app, &alice, soup()).await;
        let uri = format!("/recipes/{}", created["id"].as_str().unwrap());

        let mut changed = soup();
        changed["name"] = json!("Better Soup");
        changed["owner"] = json!("bob");

        let (status, _) = send(&app, Method::PUT, &uri, Some(&bob), Some(changed.clone())).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, updated) = send(&app, Method::PUT, &uri, Some(&alice), Some(changed)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["name"], "Better Soup");
        assert_eq!(updated["id"], created["id"]);
        assert_eq!(updated["owner"], "alice");
        assert_eq!(updated["createdAt"], created["createdAt"]);
    }

    // ------------------------------------------------------------------------
    // Browsing
    // ------------------------------------------------------------------------

    #[tokio::test]
    async fn test_get_recipe_bad_id_and_unknown_id() {
        let (app, _pool) = test_app().await;

        let (status, body) = send(&app, Method::GET, "/recipes/not-an-id", None, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid recipe ID format");

        let (status, body) = send(&app, Method::GET, "/recipes/R_000000", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Recipe not found");
    }

    #[tokio::test]
    async fn test_list_newest_first_and_by_owner() {
        let (app, _pool) = test_app().await;
        let alice = register_and_login(&app, "alice", "pw1").await;
        let bob = register_and_login(&app, "bob", "pw2").await;

        let first = create(&app, &alice, soup()).await;
        let mut stew = soup();
        stew["name"] = json!("Stew");
        let second = create(&app, &bob, stew).await;

        let (status, all) = send(&app, Method::GET, "/recipes", None, None).await;
        assert_eq!(status, StatusCode::OK);
        let all = all.as_array().unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0]["id"], second["id"]);
        assert_eq!(all[1]["id"], first["id"]);

        let (status, mine) = send(&app, Method::GET, "/recipes/userRecipes/alice", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(mine.as_array().unwrap().len(), 1);
        assert_eq!(mine[0]["owner"], "alice");
    }

    // ------------------------------------------------------------------------
    // Saved relation
    // ------------------------------------------------------------------------

    #[tokio::test]
    async fn test_duplicate_saves_removed_by_single_unsave() {
        let (app, _pool) = test_app().await;
        let token = register_and_login(&app, "alice", "pw1").await;
        let id = create(&app, &token, soup()).await["id"].as_str().unwrap().to_string();
        let save_uri = format!("/recipes/save/{}", id);

        for _ in 0..2 {
            let (status, _) = send(&app, Method::POST, &save_uri, Some(&token), None).await;
            assert_eq!(status, StatusCode::OK);
        }
        let (_, saved) = send(&app, Method::GET, "/recipes/saved", Some(&token), None).await;
        assert_eq!(saved.as_array().unwrap().len(), 2);

        let (status, _) = send(&app, Method::DELETE, &save_uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        let (_, saved) = send(&app, Method::GET, "/recipes/saved", Some(&token), None).await;
        assert_eq!(saved, json!([]));
    }

    #[tokio::test]
    async fn test_unsave_never_saved_is_ok() {
        let (app, _pool) = test_app().await;
        let token = register_and_login(&app, "alice", "pw1").await;

        let (status, _) = send(&app, Method::DELETE, "/recipes/save/R_000000", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_save_validation_errors() {
        let (app, _pool) = test_app().await;
        let token = register_and_login(&app, "alice", "pw1").await;
        let id = create(&app, &token, soup()).await["id"].as_str().unwrap().to_string();

        let (status, _) = send(&app, Method::POST, "/recipes/save/bogus", Some(&token), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = send(&app, Method::POST, "/recipes/save/R_000000", Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Recipe not found");

        // Validly signed token for a user the store doesn't know
        let ghost = issue_token(SECRET, "ghost").unwrap();
        let (status, body) = send(&app, Method::POST, &format!("/recipes/save/{}", id), Some(&ghost), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "User not found");

        let (status, _) = send(&app, Method::GET, "/recipes/saved", Some(&ghost), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_saved_list_keeps_order_and_skips_dangling() {
        let (app, pool) = test_app().await;
        let token = register_and_login(&app, "alice", "pw1").await;

        let mut ids = Vec::new();
        for name in ["A", "B", "C"] {
            let mut body = soup();
            body["name"] = json!(name);
            ids.push(create(&app, &token, body).await["id"].as_str().unwrap().to_string());
        }
        for id in [&ids[2], &ids[0], &ids[1]] {
            send(&app, Method::POST, &format!("/recipes/save/{}", id), Some(&token), None).await;
        }

        let (status, _) = send(&app, Method::DELETE, &format!("/recipes/{}", ids[0]), Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        // The bookmark row outlives the recipe
        assert_eq!(count(&pool, "saved_recipes").await, 3);

        let (status, saved) = send(&app, Method::GET, "/recipes/saved", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        let names: Vec<&str> = saved
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["C", "B"]);
    }

    #[tokio::test]
    async fn test_saved_lists_are_per_user() {
        let (app, _pool) = test_app().await;
        let alice = register_and_login(&app, "alice", "pw1").await;
        let bob = register_and_login(&app, "bob", "pw2").await;
        let id = create(&app, &alice, soup()).await["id"].as_str().unwrap().to_string();

        send(&app, Method::POST, &format!("/recipes/save/{}", id), Some(&bob), None).await;

        let (_, alice_saved) = send(&app, Method::GET, "/recipes/saved", Some(&alice), None).await;
        let (_, bob_saved) = send(&app, Method::GET, "/recipes/saved", Some(&bob), None).await;
        assert_eq!(alice_saved, json!([]));
        assert_eq!(bob_saved.as_array().unwrap().len(), 1);
    }
}
