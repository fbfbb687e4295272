//! Stateful bearer-token authentication
//!
//! A successful login binds a random token to the account in the session
//! store. Each account has at most one session; logging in again hands
//! back the token that is already stored.

use async_trait::async_trait;
use rentals_core::{Account, ErrorContext, RentalsError, RentalsResult, Session, Store};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::password::verify_password;
use super::token::{generate_token, token_prefix};

/// The only message a failed login ever produces
pub const INVALID_CREDENTIALS: &str = "incorrect username/password";

fn invalid_credentials() -> RentalsError {
    RentalsError::Authentication {
        message: INVALID_CREDENTIALS.to_string(),
        context: ErrorContext::new("authenticator").with_operation("login"),
    }
}

#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Exchange credentials for the account's session token
    async fn login(&self, username: &str, password: &str) -> RentalsResult<String>;

    /// Resolve a token to its account. Unknown tokens yield `None`.
    async fn verify(&self, token: &str) -> RentalsResult<Option<Account>>;
}

/// Authenticator backed by the account and session records of a [`Store`]
#[derive(Clone)]
pub struct SessionAuthenticator {
    store: Arc<dyn Store>,
}

impl SessionAuthenticator {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Authenticator for SessionAuthenticator {
    async fn login(&self, username: &str, password: &str) -> RentalsResult<String> {
        let Some(account) = self.store.find_account_by_username(username).await? else {
            debug!("Login attempt for unknown username");
            return Err(invalid_credentials());
        };

        if !verify_password(&account.password_hash, password) {
            warn!(account_id = %account.id, "Login attempt with wrong password");
            return Err(invalid_credentials());
        }

        if let Some(session) = self.store.find_session_by_account(&account.id).await? {
            debug!(
                account_id = %account.id,
                token = token_prefix(&session.token),
                "Reusing existing session"
            );
            return Ok(session.token);
        }

        // A concurrent login may have stored its session between the lookup
        // above and this insert; the store returns that one instead.
        let candidate = Session::new(&account.id, generate_token());
        let session = self.store.create_session_if_absent(candidate).await?;

        info!(
            account_id = %account.id,
            username = %account.username,
            token = token_prefix(&session.token),
            "User logged in"
        );

        Ok(session.token)
    }

    async fn verify(&self, token: &str) -> RentalsResult<Option<Account>> {
        if token.is_empty() {
            return Ok(None);
        }

        let Some(session) = self.store.find_session_by_token(token).await? else {
            debug!(token = token_prefix(token), "No session for token");
            return Ok(None);
        };

        let account = self.store.get_account(&session.account_id).await?;
        if account.is_none() {
            warn!(account_id = %session.account_id, "Session refers to a missing account");
        }

        Ok(account)
    }
}
