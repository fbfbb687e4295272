//! Application state shared by handlers and the auth middleware

use crate::{WebConfig, WebResult};
use rentals_applications::{
    open_store, AccountService, Authenticator, Authorizer, ListingService, SessionAuthenticator,
};
use rentals_core::Store;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub struct AppState {
    /// Configuration
    pub config: WebConfig,
    /// Credential check and session tokens
    pub authenticator: Arc<dyn Authenticator>,
    /// Permission table, fixed before the server starts
    pub authorizer: Arc<Authorizer>,
    pub accounts: AccountService,
    pub listings: ListingService,
}

impl AppState {
    /// Open the configured store and build the state with the default policy
    pub async fn new(config: WebConfig) -> WebResult<Self> {
        let store = open_store(config.database_url.as_deref()).await?;
        Self::with_store(config, store).await
    }

    /// Build the state on top of an existing store
    pub async fn with_store(config: WebConfig, store: Arc<dyn Store>) -> WebResult<Self> {
        let state = Self::from_parts(config, store, Authorizer::with_default_policy());

        if let Some((username, password)) = state.config.admin_credentials() {
            let admin = state.accounts.ensure_admin(username, password).await?;
            info!(account_id = %admin.id, username = %admin.username, "Bootstrap admin ready");
        }

        Ok(state)
    }

    /// Assemble the state from explicit parts
    pub fn from_parts(config: WebConfig, store: Arc<dyn Store>, authorizer: Authorizer) -> Self {
        Self {
            config,
            authenticator: Arc::new(SessionAuthenticator::new(store.clone())),
            authorizer: Arc::new(authorizer),
            accounts: AccountService::new(store.clone()),
            listings: ListingService::new(store),
        }
    }
}
