use std::env;

const DEFAULT_BASE_URL: &str = "http://localhost:3001";

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Reads `RECIPE_API_URL`, falling back to the local dev server
    pub fn from_env() -> Self {
        Self::new(env::var("RECIPE_API_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()))
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}
