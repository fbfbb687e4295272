//! SQLite-backed record store

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use rentals_core::{
    not_found_error, storage_error, Account, AccountStore, ErrorContext, Listing, ListingFilter,
    ListingStore, RentalsError, RentalsResult, Role, Session, SessionStore,
};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use tracing::{debug, error, info};

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS accounts (
        id TEXT PRIMARY KEY,
        username TEXT UNIQUE NOT NULL,
        password_hash TEXT NOT NULL,
        role TEXT NOT NULL CHECK (role IN ('admin', 'realtor', 'client')),
        created_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS sessions (
        account_id TEXT PRIMARY KEY REFERENCES accounts(id),
        token TEXT UNIQUE NOT NULL,
        created_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS listings (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        realtor_id TEXT NOT NULL,
        floor_area_meters REAL NOT NULL,
        price_per_month_usd REAL NOT NULL,
        room_count INTEGER NOT NULL,
        latitude REAL NOT NULL,
        longitude REAL NOT NULL,
        available BOOLEAN NOT NULL,
        created_at TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_listings_realtor ON listings(realtor_id)",
];

fn db_error(operation: &str, e: sqlx::Error) -> RentalsError {
    error!(operation, "Database error: {}", e);
    RentalsError::Storage {
        message: format!("{} failed: {}", operation, e),
        source: Some(Box::new(e)),
        context: ErrorContext::new("sqlite_store").with_operation(operation),
    }
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_unique_violation())
}

fn format_time(time: &DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_time(value: &str) -> RentalsResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|time| time.with_timezone(&Utc))
        .map_err(|e| storage_error!(format!("corrupt timestamp '{}'", value), "sqlite_store", e))
}

#[derive(Debug, sqlx::FromRow)]
struct AccountRecord {
    id: String,
    username: String,
    password_hash: String,
    role: String,
    created_at: String,
}

impl AccountRecord {
    fn into_account(self) -> RentalsResult<Account> {
        let role = Role::from_str(&self.role)
            .map_err(|_| storage_error!(format!("corrupt role '{}'", self.role), "sqlite_store"))?;
        Ok(Account {
            id: self.id,
            username: self.username,
            password_hash: self.password_hash,
            role,
            created_at: parse_time(&self.created_at)?,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SessionRecord {
    account_id: String,
    token: String,
    created_at: String,
}

impl SessionRecord {
    fn into_session(self) -> RentalsResult<Session> {
        Ok(Session {
            account_id: self.account_id,
            token: self.token,
            created_at: parse_time(&self.created_at)?,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ListingRecord {
    id: String,
    name: String,
    description: String,
    realtor_id: String,
    floor_area_meters: f64,
    price_per_month_usd: f64,
    room_count: i64,
    latitude: f64,
    longitude: f64,
    available: bool,
    created_at: String,
}

impl ListingRecord {
    fn into_listing(self) -> RentalsResult<Listing> {
        let room_count = u32::try_from(self.room_count).map_err(|e| {
            storage_error!(format!("corrupt room count {}", self.room_count), "sqlite_store", e)
        })?;
        Ok(Listing {
            id: self.id,
            name: self.name,
            description: self.description,
            realtor_id: self.realtor_id,
            floor_area_meters: self.floor_area_meters,
            price_per_month_usd: self.price_per_month_usd,
            room_count,
            latitude: self.latitude,
            longitude: self.longitude,
            available: self.available,
            created_at: parse_time(&self.created_at)?,
        })
    }
}

/// Store backed by a SQLite connection pool
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (creating if needed) the database at `url` and apply the schema
    pub async fn connect(url: &str) -> RentalsResult<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| db_error("parse_database_url", e))?
            .create_if_missing(true);

        // Every connection to an in-memory database sees its own empty
        // database, so those get a single connection that is never recycled.
        let pool_options = if url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(8)
        };

        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(|e| db_error("connect", e))?;

        info!(url, "Connected to SQLite database");
        Self::new(pool).await
    }

    pub async fn new(pool: SqlitePool) -> RentalsResult<Self> {
        let store = Self { pool };
        store.create_tables().await?;
        Ok(store)
    }

    async fn create_tables(&self) -> RentalsResult<()> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| db_error("create_tables", e))?;
        }
        debug!("Database schema is up to date");
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl AccountStore for SqliteStore {
    async fn find_account_by_username(&self, username: &str) -> RentalsResult<Option<Account>> {
        sqlx::query_as::<_, AccountRecord>("SELECT * FROM accounts WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("find_account_by_username", e))?
            .map(AccountRecord::into_account)
            .transpose()
    }

    async fn get_account(&self, id: &str) -> RentalsResult<Option<Account>> {
        sqlx::query_as::<_, AccountRecord>("SELECT * FROM accounts WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("get_account", e))?
            .map(AccountRecord::into_account)
            .transpose()
    }

    async fn list_accounts(&self) -> RentalsResult<Vec<Account>> {
        sqlx::query_as::<_, AccountRecord>("SELECT * FROM accounts ORDER BY created_at, id")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| db_error("list_accounts", e))?
            .into_iter()
            .map(AccountRecord::into_account)
            .collect()
    }

    async fn create_account(&self, account: &Account) -> RentalsResult<()> {
        let result = sqlx::query(
            "INSERT INTO accounts (id, username, password_hash, role, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&account.id)
        .bind(&account.username)
        .bind(&account.password_hash)
        .bind(account.role.as_str())
        .bind(format_time(&account.created_at))
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) if is_unique_violation(&e) => Err(RentalsError::Conflict {
                message: format!("username '{}' is already taken", account.username),
                context: ErrorContext::new("sqlite_store").with_operation("create_account"),
            }),
            Err(e) => Err(db_error("create_account", e)),
        }
    }

    async fn save_account(&self, account: &Account) -> RentalsResult<()> {
        let result = sqlx::query("UPDATE accounts SET username = ?, password_hash = ?, role = ? WHERE id = ?")
            .bind(&account.username)
            .bind(&account.password_hash)
            .bind(account.role.as_str())
            .bind(&account.id)
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("save_account", e))?;

        if result.rows_affected() == 0 {
            return Err(not_found_error!(format!("account {}", account.id), "sqlite_store"));
        }
        Ok(())
    }

    async fn delete_account(&self, id: &str) -> RentalsResult<bool> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| db_error("delete_account", e))?;

        sqlx::query("DELETE FROM sessions WHERE account_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| db_error("delete_account", e))?;

        let result = sqlx::query("DELETE FROM accounts WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| db_error("delete_account", e))?;

        tx.commit().await.map_err(|e| db_error("delete_account", e))?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl SessionStore for SqliteStore {
    async fn find_session_by_token(&self, token: &str) -> RentalsResult<Option<Session>> {
        sqlx::query_as::<_, SessionRecord>("SELECT * FROM sessions WHERE token = ?")
            .bind(token)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("find_session_by_token", e))?
            .map(SessionRecord::into_session)
            .transpose()
    }

    async fn find_session_by_account(&self, account_id: &str) -> RentalsResult<Option<Session>> {
        sqlx::query_as::<_, SessionRecord>("SELECT * FROM sessions WHERE account_id = ?")
            .bind(account_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("find_session_by_account", e))?
            .map(SessionRecord::into_session)
            .transpose()
    }

    async fn create_session_if_absent(&self, session: Session) -> RentalsResult<Session> {
        // The primary key on account_id decides the winner; the loser's
        // insert is dropped and it reads back the stored row.
        sqlx::query(
            "INSERT INTO sessions (account_id, token, created_at) VALUES (?, ?, ?) \
             ON CONFLICT(account_id) DO NOTHING",
        )
        .bind(&session.account_id)
        .bind(&session.token)
        .bind(format_time(&session.created_at))
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("create_session", e))?;

        sqlx::query_as::<_, SessionRecord>("SELECT * FROM sessions WHERE account_id = ?")
            .bind(&session.account_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| db_error("create_session", e))?
            .into_session()
    }

    async fn count_sessions(&self) -> RentalsResult<usize> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sessions")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| db_error("count_sessions", e))?;
        Ok(count as usize)
    }
}

#[async_trait]
impl ListingStore for SqliteStore {
    async fn create_listing(&self, listing: &Listing) -> RentalsResult<()> {
        sqlx::query(
            r#"
            INSERT INTO listings (
                id, name, description, realtor_id, floor_area_meters, price_per_month_usd,
                room_count, latitude, longitude, available, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&listing.id)
        .bind(&listing.name)
        .bind(&listing.description)
        .bind(&listing.realtor_id)
        .bind(listing.floor_area_meters)
        .bind(listing.price_per_month_usd)
        .bind(i64::from(listing.room_count))
        .bind(listing.latitude)
        .bind(listing.longitude)
        .bind(listing.available)
        .bind(format_time(&listing.created_at))
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("create_listing", e))?;
        Ok(())
    }

    async fn get_listing(&self, id: &str) -> RentalsResult<Option<Listing>> {
        sqlx::query_as::<_, ListingRecord>("SELECT * FROM listings WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("get_listing", e))?
            .map(ListingRecord::into_listing)
            .transpose()
    }

    async fn find_listings(&self, filter: &ListingFilter) -> RentalsResult<Vec<Listing>> {
        sqlx::query_as::<_, ListingRecord>(
            r#"
            SELECT * FROM listings
            WHERE (?1 IS NULL OR floor_area_meters = ?1)
              AND (?2 IS NULL OR price_per_month_usd = ?2)
              AND (?3 IS NULL OR room_count = ?3)
            ORDER BY created_at, id
            "#,
        )
        .bind(filter.floor_area_meters)
        .bind(filter.price_per_month_usd)
        .bind(filter.room_count.map(i64::from))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("find_listings", e))?
        .into_iter()
        .map(ListingRecord::into_listing)
        .collect()
    }

    async fn save_listing(&self, listing: &Listing) -> RentalsResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE listings SET
                name = ?, description = ?, realtor_id = ?, floor_area_meters = ?,
                price_per_month_usd = ?, room_count = ?, latitude = ?, longitude = ?,
                available = ?
            WHERE id = ?
            "#,
        )
        .bind(&listing.name)
        .bind(&listing.description)
        .bind(&listing.realtor_id)
        .bind(listing.floor_area_meters)
        .bind(listing.price_per_month_usd)
        .bind(i64::from(listing.room_count))
        .bind(listing.latitude)
        .bind(listing.longitude)
        .bind(listing.available)
        .bind(&listing.id)
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("save_listing", e))?;

        if result.rows_affected() == 0 {
            return Err(not_found_error!(format!("listing {}", listing.id), "sqlite_store"));
        }
        Ok(())
    }

    async fn delete_listing(&self, id: &str) -> RentalsResult<bool> {
        let result = sqlx::query("DELETE FROM listings WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("delete_listing", e))?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn memory_store() -> SqliteStore {
        SqliteStore::connect("sqlite::memory:").await.unwrap()
    }

    #[tokio::test]
    async fn test_account_round_trip() {
        let store = memory_store().await;
        let account = Account::new("alice", "hash", Role::Realtor);
        store.create_account(&account).await.unwrap();

        let loaded = store.find_account_by_username("alice").await.unwrap().unwrap();
        assert_eq!(loaded.id, account.id);
        assert_eq!(loaded.role, Role::Realtor);
        assert_eq!(loaded.password_hash, "hash");
        assert!(store.find_account_by_username("bob").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_username_is_conflict() {
        let store = memory_store().await;
        store
            .create_account(&Account::new("alice", "h", Role::Client))
            .await
            .unwrap();
        let err = store
            .create_account(&Account::new("alice", "h", Role::Client))
            .await
            .unwrap_err();
        assert!(matches!(err, RentalsError::Conflict { .. }));
    }

    #[tokio::test]
    async fn test_session_insert_keeps_first_token() {
        let store = memory_store().await;
        let account = Account::new("carol", "h", Role::Client);
        store.create_account(&account).await.unwrap();

        let first = store
            .create_session_if_absent(Session::new(&account.id, "FIRST"))
            .await
            .unwrap();
        let second = store
            .create_session_if_absent(Session::new(&account.id, "SECOND"))
            .await
            .unwrap();

        assert_eq!(first.token, "FIRST");
        assert_eq!(second.token, "FIRST");
        assert_eq!(store.count_sessions().await.unwrap(), 1);
        assert!(store.find_session_by_token("SECOND").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_missing_rows_are_not_found() {
        let store = memory_store().await;
        let err = store
            .save_account(&Account::new("ghost", "h", Role::Client))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert!(!store.delete_account("nope").await.unwrap());
        assert!(!store.delete_listing("nope").await.unwrap());
    }
}
