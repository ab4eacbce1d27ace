//! Client-side session cache
//!
//! Holds the session plus the cached recipe collections and keeps them
//! consistent with server mutations:
//! - list fetches are applied in issuance order; a response from an older
//!   fetch never replaces the result of a newer one, nor a confirmed add or
//!   delete made after it was issued
//! - overlapping [`ClientSessionCache::fetch_all`] calls share one request
//! - removals happen only after the server confirms them
//! - a rejected credential (any 401, or a 403 tagged as an invalid token)
//!   on a request carrying the token ends the session

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use tracing::{debug, info, warn};

use crate::api::RecipeApi;
use crate::error::ClientError;
use crate::models::{NewRecipe, Recipe};
use crate::session::SessionStore;
use crate::storage::SessionStorage;
use crate::token::Identity;


type RecipeFetch = Shared<BoxFuture<'static, Result<Vec<Recipe>, ClientError>>>;

#[derive(Default)]
struct CacheState {
    recipes: Vec<Recipe>,
    saved: Vec<Recipe>,
    last_error: Option<String>,
    pending: usize,
    issued_seq: u64,
    applied_seq: u64,
    in_flight: Option<(u64, RecipeFetch)>,
    closed: bool,
}

impl CacheState {
    /// Records a confirmed change to `recipes`. Fetches issued earlier can no
    /// longer apply, and the next `fetch_all` starts a new request.
    fn supersede_fetches(&mut self) {
        self.issued_seq += 1;
        self.applied_seq = self.issued_seq;
        self.in_flight = None;
    }
}

fn lock(state: &Mutex<CacheState>) -> MutexGuard<'_, CacheState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Marks the cache as loading until dropped
struct Loading(Arc<Mutex<CacheState>>);

impl Loading {
    fn enter(state: &Arc<Mutex<CacheState>>) -> Self {
        lock(state).pending += 1;
        Loading(state.clone())
    }
}

impl Drop for Loading {
    fn drop(&mut self) {
        let mut state = lock(&self.0);
        state.pending = state.pending.saturating_sub(1);
    }
}

#[derive(Clone)]
pub struct ClientSessionCache {
    api: Arc<dyn RecipeApi>,
    session: SessionStore,
    state: Arc<Mutex<CacheState>>,
}

impl ClientSessionCache {
    /// Restores any persisted session and starts with empty collections
    pub fn init(api: Arc<dyn RecipeApi>, storage: Arc<dyn SessionStorage>) -> Self {
        Self {
            api,
            session: SessionStore::init(storage),
            state: Arc::new(Mutex::new(CacheState::default())),
        }
    }

    /// Stops applying responses and drops cached collections. The persisted
    /// session is left alone.
    pub fn teardown(&self) {
        let mut state = lock(&self.state);
        state.closed = true;
        state.in_flight = None;
        state.recipes.clear();
        state.saved.clear();
        debug!("Session cache torn down");
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn identity(&self) -> Option<Identity> {
        self.session.identity()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    pub fn recipes(&self) -> Vec<Recipe> {
        lock(&self.state).recipes.clone()
    }

    pub fn saved(&self) -> Vec<Recipe> {
        lock(&self.state).saved.clone()
    }

    pub fn is_loading(&self) -> bool {
        lock(&self.state).pending > 0
    }

    pub fn last_error(&self) -> Option<String> {
        lock(&self.state).last_error.clone()
    }

    // ========================================================================
    // OUTCOME HANDLING
    // ========================================================================

    /// Applies a successful outcome unless the cache was torn down
    fn succeed(&self, apply: impl FnOnce(&mut CacheState)) {
        let mut state = lock(&self.state);
        if state.closed {
            return;
        }
        state.last_error = None;
        apply(&mut state);
    }

    /// Records a failure on a request that did not carry the token
    fn fail(&self, err: ClientError) -> ClientError {
        let mut state = lock(&self.state);
        if !state.closed {
            state.last_error = Some(err.to_string());
        }
        err
    }

    /// Records a failure on a request that carried the token
    fn fail_authed(&self, err: ClientError) -> ClientError {
        if err.is_auth_failure() {
            warn!(error = %err, "Authorization failed, ending session");
            if let Err(e) = self.session.clear() {
                warn!(error = %e, "Failed to clear stored session");
            }
            lock(&self.state).saved.clear();
        }
        self.fail(err)
    }

    fn bearer(&self) -> Result<String, ClientError> {
        self.session.bearer().map_err(|e| self.fail_authed(e))
    }

    // ========================================================================
    // SESSION
    // ========================================================================

    pub async fn register(&self, username: &str, password: &str) -> Result<String, ClientError> {
        let _loading = Loading::enter(&self.state);
        match self.api.register(username, password).await {
            Ok(username) => {
                self.succeed(|_| {});
                Ok(username)
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<Identity, ClientError> {
        let _loading = Loading::enter(&self.state);
        let response = self
            .api
            .login(username, password)
            .await
            .map_err(|e| self.fail(e))?;

        let identity = self.session.establish(&response).map_err(|e| self.fail(e))?;
        self.succeed(|state| state.saved.clear());
        Ok(identity)
    }

    pub fn logout(&self) -> Result<(), ClientError> {
        info!("Logging out");
        let cleared = self.session.clear();
        self.succeed(|state| state.saved.clear());
        cleared
    }

    // ========================================================================
    // RECIPE LIST
    // ========================================================================

    /// Fetches every recipe, joining a fetch that is already in flight
    pub async fn fetch_all(&self) -> Result<Vec<Recipe>, ClientError> {
        let fetch = {
            let mut state = lock(&self.state);
            let joined = state.in_flight.as_ref().map(|(seq, fetch)| {
                debug!(seq, "Joining in-flight recipe fetch");
                fetch.clone()
            });
            match joined {
                Some(fetch) => fetch,
                None => self.start_fetch(&mut state),
            }
        };
        fetch.await
    }

    /// Fetches every recipe with a new request
    pub async fn refresh(&self) -> Result<Vec<Recipe>, ClientError> {
        let fetch = {
            let mut state = lock(&self.state);
            self.start_fetch(&mut state)
        };
        fetch.await
    }

    fn start_fetch(&self, state: &mut CacheState) -> RecipeFetch {
        state.issued_seq += 1;
        let seq = state.issued_seq;
        state.pending += 1;

        let loading = Loading(self.state.clone());
        let api = self.api.clone();
        let shared = self.state.clone();

        let fetch = async move {
            let result = api.fetch_all().await;
            drop(loading);

            let mut state = lock(&shared);
            if matches!(&state.in_flight, Some((current, _)) if *current == seq) {
                state.in_flight = None;
            }
            if state.closed {
                return result;
            }

            match &result {
                Ok(recipes) if seq > state.applied_seq => {
                    state.applied_seq = seq;
                    state.recipes = recipes.clone();
                    state.last_error = None;
                }
                Ok(_) => debug!(seq, applied = state.applied_seq, "Discarding stale recipe list"),
                Err(e) => state.last_error = Some(e.to_string()),
            }
            result
        }
        .boxed()
        .shared();

        state.in_flight = Some((seq, fetch.clone()));
        fetch
    }

    pub async fn get_recipe(&self, id: &str) -> Result<Recipe, ClientError> {
        let _loading = Loading::enter(&self.state);
        match self.api.get_recipe(id).await {
            Ok(recipe) => {
                self.succeed(|_| {});
                Ok(recipe)
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    pub async fn user_recipes(&self, username: &str) -> Result<Vec<Recipe>, ClientError> {
        let _loading = Loading::enter(&self.state);
        match self.api.user_recipes(username).await {
            Ok(recipes) => {
                self.succeed(|_| {});
                Ok(recipes)
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Publishes a recipe and appends the server's record to the cached list
    pub async fn add_recipe(&self, recipe: &NewRecipe) -> Result<Recipe, ClientError> {
        let token = self.bearer()?;
        let _loading = Loading::enter(&self.state);

        let created = self
            .api
            .create_recipe(&token, recipe)
            .await
            .map_err(|e| self.fail_authed(e))?;

        self.succeed(|state| {
            state.recipes.push(created.clone());
            state.supersede_fetches();
        });
        Ok(created)
    }

    /// Deletes a recipe, dropping it from the cache once the server confirms
    pub async fn delete_recipe(&self, id: &str) -> Result<(), ClientError> {
        let token = self.bearer()?;
        let _loading = Loading::enter(&self.state);

        self.api
            .delete_recipe(&token, id)
            .await
            .map_err(|e| self.fail_authed(e))?;

        self.succeed(|state| {
            state.recipes.retain(|r| r.id != id);
            state.saved.retain(|r| r.id != id);
            state.supersede_fetches();
        });
        Ok(())
    }

    // ========================================================================
    // SAVED RECIPES
    // ========================================================================

    pub async fn load_saved(&self) -> Result<Vec<Recipe>, ClientError> {
        let token = self.bearer()?;
        let _loading = Loading::enter(&self.state);

        let saved = self
            .api
            .list_saved(&token)
            .await
            .map_err(|e| self.fail_authed(e))?;

        self.succeed(|state| state.saved = saved.clone());
        Ok(saved)
    }

    /// Saves a recipe and appends it to the saved list, matching the server
    /// which keeps repeated saves
    ///
    /// A recipe missing from the cached list is looked up first. If that
    /// fails the whole saved list is reloaded instead.
    pub async fn save(&self, id: &str) -> Result<(), ClientError> {
        let token = self.bearer()?;
        let _loading = Loading::enter(&self.state);

        self.api
            .save_recipe(&token, id)
            .await
            .map_err(|e| self.fail_authed(e))?;

        let cached = lock(&self.state).recipes.iter().find(|r| r.id == id).cloned();
        let recipe = match cached {
            Some(recipe) => Some(recipe),
            None => match self.api.get_recipe(id).await {
                Ok(recipe) => Some(recipe),
                Err(e) => {
                    debug!(recipe_id = %id, error = %e, "Saved recipe lookup failed");
                    None
                }
            },
        };

        match recipe {
            Some(recipe) => self.succeed(|state| state.saved.push(recipe)),
            None => match self.api.list_saved(&token).await {
                Ok(saved) => self.succeed(|state| state.saved = saved),
                Err(e) => {
                    warn!(recipe_id = %id, error = %e, "Saved list may be out of date");
                    self.fail_authed(e);
                }
            },
        }
        Ok(())
    }

    /// Unsaves a recipe, removing every cached occurrence once confirmed
    pub async fn unsave(&self, id: &str) -> Result<(), ClientError> {
        let token = self.bearer()?;
        let _loading = Loading::enter(&self.state);

        self.api
            .unsave_recipe(&token, id)
            .await
            .map_err(|e| self.fail_authed(e))?;

        self.succeed(|state| state.saved.retain(|r| r.id != id));
        Ok(())
    }
}
