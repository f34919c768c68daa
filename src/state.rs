use std::sync::Arc;

use sqlx::SqlitePool;

use crate::auth::{CredentialStore, SessionManager, TokenService};
use crate::config::AppConfig;
use crate::database::{Repository, SqliteRepository, StoreError};
use crate::render::{HtmlRenderer, Renderer};

/// Shared handles every handler and guard works through. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub repo: Arc<dyn Repository>,
    pub credentials: CredentialStore,
    pub sessions: SessionManager,
    pub tokens: TokenService,
    pub renderer: Arc<dyn Renderer>,
}

impl AppState {
    /// Wires the services over an already bootstrapped pool. Secrets come from `config`
    /// and are fixed for the life of the state.
    pub fn new(config: &AppConfig, pool: SqlitePool) -> Result<Self, StoreError> {
        let security = &config.security;
        let repo: Arc<dyn Repository> = Arc::new(SqliteRepository::new(pool.clone()));

        Ok(Self {
            credentials: CredentialStore::new(repo.clone(), security.password)?,
            sessions: SessionManager::new(
                security.session_secret.as_bytes(),
                security.session_cookie_name.clone(),
                security.require_https,
            ),
            tokens: TokenService::new(
                security.token_secret.as_bytes(),
                security.token_issuer.clone(),
                security.token_expiry_months,
            ),
            renderer: Arc::new(HtmlRenderer),
            repo,
            pool,
        })
    }

    pub fn with_renderer(mut self, renderer: Arc<dyn Renderer>) -> Self {
        self.renderer = renderer;
        self
    }
}
