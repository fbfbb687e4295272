//! Account management

use rentals_core::{
    not_found_error, validation_error, Account, AccountPatch, RentalsResult, Role, Store,
};
use std::sync::Arc;
use tracing::{debug, info};

use crate::auth::password::hash_password;

#[derive(Clone)]
pub struct AccountService {
    store: Arc<dyn Store>,
}

impl AccountService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Create an account with the given role name.
    /// Roles outside admin/realtor/client are rejected.
    pub async fn create(&self, username: &str, password: &str, role: &str) -> RentalsResult<Account> {
        let role: Role = role.parse()?;
        self.create_with_role(username, password, role).await
    }

    /// Self-registration always yields a client
    pub async fn register_client(&self, username: &str, password: &str) -> RentalsResult<Account> {
        self.create_with_role(username, password, Role::Client).await
    }

    async fn create_with_role(
        &self,
        username: &str,
        password: &str,
        role: Role,
    ) -> RentalsResult<Account> {
        let username = username.trim();
        if username.is_empty() {
            return Err(validation_error!("username must not be empty", "username", "accounts"));
        }
        if password.is_empty() {
            return Err(validation_error!("password must not be empty", "password", "accounts"));
        }

        let account = Account::new(username, hash_password(password)?, role);
        self.store.create_account(&account).await?;

        info!(account_id = %account.id, username = %account.username, role = %role, "Account created");
        Ok(account)
    }

    pub async fn get(&self, id: &str) -> RentalsResult<Account> {
        self.store
            .get_account(id)
            .await?
            .ok_or_else(|| not_found_error!(format!("account {}", id), "accounts"))
    }

    pub async fn list(&self) -> RentalsResult<Vec<Account>> {
        self.store.list_accounts().await
    }

    pub async fn update(&self, id: &str, patch: AccountPatch) -> RentalsResult<Account> {
        let mut account = self.get(id).await?;

        if let Some(role) = patch.role {
            account.role = role.parse()?;
        }
        if let Some(password) = patch.password {
            if password.is_empty() {
                return Err(validation_error!("password must not be empty", "password", "accounts"));
            }
            account.password_hash = hash_password(&password)?;
        }

        self.store.save_account(&account).await?;
        debug!(account_id = %account.id, "Account updated");
        Ok(account)
    }

    /// Delete the account and, with it, its session
    pub async fn delete(&self, id: &str) -> RentalsResult<()> {
        if !self.store.delete_account(id).await? {
            return Err(not_found_error!(format!("account {}", id), "accounts"));
        }
        info!(account_id = %id, "Account deleted");
        Ok(())
    }

    /// Create the admin account unless the username already exists
    pub async fn ensure_admin(&self, username: &str, password: &str) -> RentalsResult<Account> {
        if let Some(existing) = self.store.find_account_by_username(username).await? {
            debug!(username, "Bootstrap admin already exists");
            return Ok(existing);
        }
        self.create_with_role(username, password, Role::Admin).await
    }
}
