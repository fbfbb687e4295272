//! Rentals Applications
//!
//! The authentication and authorization core plus the account and listing
//! services built on top of the record stores.

pub mod accounts;
pub mod auth;
pub mod listings;
pub mod storage;

pub use accounts::AccountService;
pub use auth::{
    generate_token, hash_password, resources, verify_password, Authenticator, Authorizer,
    Operation, SessionAuthenticator, INVALID_CREDENTIALS,
};
pub use listings::ListingService;
pub use storage::MemoryStore;
#[cfg(feature = "sqlite")]
pub use storage::SqliteStore;

use rentals_core::{RentalsResult, Store};
use std::sync::Arc;

/// Open the configured store: SQLite when a database URL is given,
/// otherwise an in-memory store.
pub async fn open_store(database_url: Option<&str>) -> RentalsResult<Arc<dyn Store>> {
    match database_url {
        #[cfg(feature = "sqlite")]
        Some(url) => Ok(Arc::new(SqliteStore::connect(url).await?)),
        #[cfg(not(feature = "sqlite"))]
        Some(_) => Err(rentals_core::config_error!(
            "a database URL was given but SQLite support is not compiled in",
            "storage"
        )),
        None => {
            tracing::warn!("No database configured, records will be kept in memory only");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}
