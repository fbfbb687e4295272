//! Storage collaborator traits
//!
//! The authentication core only needs lookups and one atomic insert; the
//! rest is used by the account and listing services.

use crate::error::RentalsResult;
use crate::types::*;
use async_trait::async_trait;

/// Account persistence
#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn find_account_by_username(&self, username: &str) -> RentalsResult<Option<Account>>;

    async fn get_account(&self, id: &str) -> RentalsResult<Option<Account>>;

    async fn list_accounts(&self) -> RentalsResult<Vec<Account>>;

    /// Fails with `Conflict` when the username is taken
    async fn create_account(&self, account: &Account) -> RentalsResult<()>;

    /// Fails with `NotFound` when the account does not exist
    async fn save_account(&self, account: &Account) -> RentalsResult<()>;

    /// Removes the account together with its session.
    /// Returns false when nothing was deleted.
    async fn delete_account(&self, id: &str) -> RentalsResult<bool>;
}

/// Session persistence
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn find_session_by_token(&self, token: &str) -> RentalsResult<Option<Session>>;

    async fn find_session_by_account(&self, account_id: &str) -> RentalsResult<Option<Session>>;

    /// Inserts `session` unless one already exists for its account, then
    /// returns whichever session is stored. Concurrent callers for the same
    /// account all observe the same winner.
    async fn create_session_if_absent(&self, session: Session) -> RentalsResult<Session>;

    async fn count_sessions(&self) -> RentalsResult<usize>;
}

/// Listing persistence
#[async_trait]
pub trait ListingStore: Send + Sync {
    async fn create_listing(&self, listing: &Listing) -> RentalsResult<()>;

    async fn get_listing(&self, id: &str) -> RentalsResult<Option<Listing>>;

    async fn find_listings(&self, filter: &ListingFilter) -> RentalsResult<Vec<Listing>>;

    /// Fails with `NotFound` when the listing does not exist
    async fn save_listing(&self, listing: &Listing) -> RentalsResult<()>;

    async fn delete_listing(&self, id: &str) -> RentalsResult<bool>;
}

/// Everything the service persists
pub trait Store: AccountStore + SessionStore + ListingStore {}

impl<T> Store for T where T: AccountStore + SessionStore + ListingStore {}
