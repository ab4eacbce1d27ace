//! # Recipe client
//!
//! Client-side session handling for the recipe API:
//! - [`SessionStore`] keeps the bearer token and the username decoded from it,
//!   persisted under two keys that are always written and cleared together
//! - [`ClientSessionCache`] holds the locally cached recipe collections and
//!   keeps them in step with server mutations
//! - [`RecipeApi`] is the transport seam; [`HttpRecipeApi`] talks to the server
//!
//! The identity decoded on the client is only used for display and to avoid
//! sending a token that is obviously unusable. The server re-checks everything.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod session;
pub mod storage;
pub mod token;

pub use api::{HttpRecipeApi, RecipeApi};
pub use cache::ClientSessionCache;
pub use config::ClientConfig;
pub use error::ClientError;
pub use models::{LoginResponse, NewRecipe, Recipe};
pub use session::SessionStore;
pub use storage::{FileStorage, MemoryStorage, SessionStorage};
pub use token::Identity;
