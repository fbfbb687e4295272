//! Record stores
//!
//! `MemoryStore` keeps everything in process; `SqliteStore` persists to a
//! SQLite database and is available with the `sqlite` feature.

pub mod memory;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use memory::MemoryStore;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteStore;
