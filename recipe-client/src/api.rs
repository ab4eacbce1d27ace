//! Transport seam between the client cache and the server

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::models::{ErrorBody, LoginResponse, NewRecipe, Recipe, RegisterResponse};

#[async_trait]
pub trait RecipeApi: Send + Sync {
    async fn register(&self, username: &str, password: &str) -> Result<String, ClientError>;
    async fn login(&self, username: &str, password: &str) -> Result<LoginResponse, ClientError>;

    async fn fetch_all(&self) -> Result<Vec<Recipe>, ClientError>;
    async fn get_recipe(&self, id: &str) -> Result<Recipe, ClientError>;
    async fn user_recipes(&self, username: &str) -> Result<Vec<Recipe>, ClientError>;

    async fn create_recipe(&self, token: &str, recipe: &NewRecipe) -> Result<Recipe, ClientError>;
    async fn delete_recipe(&self, token: &str, id: &str) -> Result<(), ClientError>;

    async fn list_saved(&self, token: &str) -> Result<Vec<Recipe>, ClientError>;
    async fn save_recipe(&self, token: &str, id: &str) -> Result<(), ClientError>;
    async fn unsave_recipe(&self, token: &str, id: &str) -> Result<(), ClientError>;
}

/// [`RecipeApi`] over HTTP/JSON
#[derive(Clone, Debug)]
pub struct HttpRecipeApi {
    http: Client,
    config: ClientConfig,
}

impl HttpRecipeApi {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            http: Client::new(),
            config,
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, ClientError> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let body = serde_json::from_str::<ErrorBody>(&text).ok();
        let code = body.as_ref().and_then(|b| b.code.clone());
        let message = body
            .and_then(|b| b.error.or(b.message))
            .unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("Unknown error")
                    .to_string()
            });
        debug!(status = status.as_u16(), code = ?code, message = %message, "Request rejected");
        Err(ClientError::from_status(status.as_u16(), code.as_deref(), message))
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ClientError> {
        Ok(self.send(request).await?.json::<T>().await?)
    }
}

fn credentials(username: &str, password: &str) -> serde_json::Value {
    serde_json::json!({ "username": username, "password": password })
}

#[async_trait]
impl RecipeApi for HttpRecipeApi {
    async fn register(&self, username: &str, password: &str) -> Result<String, ClientError> {
        let request = self
            .http
            .post(self.config.url("/auth/register"))
            .json(&credentials(username, password));
        let response: RegisterResponse = self.send_json(request).await?;
        Ok(response.username)
    }

    async fn login(&self, username: &str, password: &str) -> Result<LoginResponse, ClientError> {
        let request = self
            .http
            .post(self.config.url("/auth/login"))
            .json(&credentials(username, password));
        self.send_json(request).await
    }

    async fn fetch_all(&self) -> Result<Vec<Recipe>, ClientError> {
        self.send_json(self.http.get(self.config.url("/recipes"))).await
    }

    async fn get_recipe(&self, id: &str) -> Result<Recipe, ClientError> {
        let url = self.config.url(&format!("/recipes/{}", id));
        self.send_json(self.http.get(url)).await
    }

    async fn user_recipes(&self, username: &str) -> Result<Vec<Recipe>, ClientError> {
        let url = self.config.url(&format!("/recipes/userRecipes/{}", username));
        self.send_json(self.http.get(url)).await
    }

    async fn create_recipe(&self, token: &str, recipe: &NewRecipe) -> Result<Recipe, ClientError> {
        let request = self
            .http
            .post(self.config.url("/recipes"))
            .bearer_auth(token)
            .json(recipe);
        self.send_json(request).await
    }

    async fn delete_recipe(&self, token: &str, id: &str) -> Result<(), ClientError> {
        let url = self.config.url(&format!("/recipes/{}", id));
        self.send(self.http.delete(url).bearer_auth(token)).await?;
        Ok(())
    }

    async fn list_saved(&self, token: &str) -> Result<Vec<Recipe>, ClientError> {
        let request = self
            .http
            .get(self.config.url("/recipes/saved"))
            .bearer_auth(token);
        self.send_json(request).await
    }

    async fn save_recipe(&self, token: &str, id: &str) -> Result<(), ClientError> {
        let url = self.config.url(&format!("/recipes/save/{}", id));
        self.send(self.http.post(url).bearer_auth(token)).await?;
        Ok(())
    }

    async fn unsave_recipe(&self, token: &str, id: &str) -> Result<(), ClientError> {
        let url = self.config.url(&format!("/recipes/save/{}", id));
        self.send(self.http.delete(url).bearer_auth(token)).await?;
        Ok(())
    }
}
