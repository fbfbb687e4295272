//! In-memory record store

use async_trait::async_trait;
use rentals_core::{
    not_found_error, Account, AccountStore, ErrorContext, Listing, ListingFilter, ListingStore,
    RentalsError, RentalsResult, Session, SessionStore,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct Tables {
    accounts: HashMap<String, Account>,
    /// account id -> session
    sessions: HashMap<String, Session>,
    /// token -> account id
    token_index: HashMap<String, String>,
    listings: HashMap<String, Listing>,
}

/// Process-local store. All tables sit behind one lock so that multi-table
/// changes (account removal, session creation) are atomic.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn find_account_by_username(&self, username: &str) -> RentalsResult<Option<Account>> {
        let tables = self.tables.read().await;
        Ok(tables
            .accounts
            .values()
            .find(|account| account.username == username)
            .cloned())
    }

    async fn get_account(&self, id: &str) -> RentalsResult<Option<Account>> {
        Ok(self.tables.read().await.accounts.get(id).cloned())
    }

    async fn list_accounts(&self) -> RentalsResult<Vec<Account>> {
        let tables = self.tables.read().await;
        let mut accounts: Vec<Account> = tables.accounts.values().cloned().collect();
        accounts.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(accounts)
    }

    async fn create_account(&self, account: &Account) -> RentalsResult<()> {
        let mut tables = self.tables.write().await;
        if tables
            .accounts
            .values()
            .any(|existing| existing.username == account.username)
        {
            return Err(RentalsError::Conflict {
                message: format!("username '{}' is already taken", account.username),
                context: ErrorContext::new("memory_store").with_operation("create_account"),
            });
        }
        tables.accounts.insert(account.id.clone(), account.clone());
        Ok(())
    }

    async fn save_account(&self, account: &Account) -> RentalsResult<()> {
        let mut tables = self.tables.write().await;
        match tables.accounts.get_mut(&account.id) {
            Some(existing) => {
                *existing = account.clone();
                Ok(())
            }
            None => Err(not_found_error!(format!("account {}", account.id), "memory_store")),
        }
    }

    async fn delete_account(&self, id: &str) -> RentalsResult<bool> {
        let mut tables = self.tables.write().await;
        if tables.accounts.remove(id).is_none() {
            return Ok(false);
        }
        if let Some(session) = tables.sessions.remove(id) {
            tables.token_index.remove(&session.token);
        }
        Ok(true)
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn find_session_by_token(&self, token: &str) -> RentalsResult<Option<Session>> {
        let tables = self.tables.read().await;
        Ok(tables
            .token_index
            .get(token)
            .and_then(|account_id| tables.sessions.get(account_id))
            .cloned())
    }

    async fn find_session_by_account(&self, account_id: &str) -> RentalsResult<Option<Session>> {
        Ok(self.tables.read().await.sessions.get(account_id).cloned())
    }

    async fn create_session_if_absent(&self, session: Session) -> RentalsResult<Session> {
        let mut tables = self.tables.write().await;
        if let Some(existing) = tables.sessions.get(&session.account_id) {
            return Ok(existing.clone());
        }
        tables
            .token_index
            .insert(session.token.clone(), session.account_id.clone());
        tables
            .sessions
            .insert(session.account_id.clone(), session.clone());
        Ok(session)
    }

    async fn count_sessions(&self) -> RentalsResult<usize> {
        Ok(self.tables.read().await.sessions.len())
    }
}

#[async_trait]
impl ListingStore for MemoryStore {
    async fn create_listing(&self, listing: &Listing) -> RentalsResult<()> {
        self.tables
            .write()
            .await
            .listings
            .insert(listing.id.clone(), listing.clone());
        Ok(())
    }

    async fn get_listing(&self, id: &str) -> RentalsResult<Option<Listing>> {
        Ok(self.tables.read().await.listings.get(id).cloned())
    }

    async fn find_listings(&self, filter: &ListingFilter) -> RentalsResult<Vec<Listing>> {
        let tables = self.tables.read().await;
        let mut listings: Vec<Listing> = tables
            .listings
            .values()
            .filter(|listing| filter.matches(listing))
            .cloned()
            .collect();
        listings.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(listings)
    }

    async fn save_listing(&self, listing: &Listing) -> RentalsResult<()> {
        let mut tables = self.tables.write().await;
        match tables.listings.get_mut(&listing.id) {
            Some(existing) => {
                *existing = listing.clone();
                Ok(())
            }
            None => Err(not_found_error!(format!("listing {}", listing.id), "memory_store")),
        }
    }

    async fn delete_listing(&self, id: &str) -> RentalsResult<bool> {
        Ok(self.tables.write().await.listings.remove(id).is_some())
    }
}
