//! Login against a file-backed SQLite database

#![cfg(feature = "sqlite")]

use rentals_applications::{AccountService, Authenticator, SessionAuthenticator, SqliteStore};
use rentals_core::{SessionStore, Store};
use std::sync::Arc;
use tempfile::TempDir;

async fn open(dir: &TempDir) -> Arc<SqliteStore> {
    let url = format!("sqlite://{}", dir.path().join("rentals.db").display());
    Arc::new(SqliteStore::connect(&url).await.unwrap())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_first_logins_create_one_session() {
    let dir = TempDir::new().unwrap();
    let store = open(&dir).await;
    let shared: Arc<dyn Store> = store.clone();

    AccountService::new(shared.clone())
        .create("grace", "hopper", "client")
        .await
        .unwrap();

    let auth = Arc::new(SessionAuthenticator::new(shared));
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let auth = auth.clone();
            tokio::spawn(async move { auth.login("grace", "hopper").await.unwrap() })
        })
        .collect();

    let mut tokens = Vec::new();
    for handle in handles {
        tokens.push(handle.await.unwrap());
    }

    assert!(tokens.iter().all(|token| *token == tokens[0]));
    assert_eq!(store.count_sessions().await.unwrap(), 1);
}

#[tokio::test]
async fn sessions_survive_reopening_the_database() {
    let dir = TempDir::new().unwrap();

    let token = {
        let store: Arc<dyn Store> = open(&dir).await;
        AccountService::new(store.clone())
            .create("linus", "pw", "realtor")
            .await
            .unwrap();
        SessionAuthenticator::new(store)
            .login("linus", "pw")
            .await
            .unwrap()
    };

    let store: Arc<dyn Store> = open(&dir).await;
    let auth = SessionAuthenticator::new(store);

    let account = auth.verify(&token).await.unwrap().unwrap();
    assert_eq!(account.username, "linus");
    assert_eq!(auth.login("linus", "pw").await.unwrap(), token);
}

#[tokio::test]
async fn deleting_an_account_revokes_its_token() {
    let dir = TempDir::new().unwrap();
    let store: Arc<dyn Store> = open(&dir).await;
    let accounts = AccountService::new(store.clone());
    let auth = SessionAuthenticator::new(store);

    let account = accounts.create("ada", "pw", "client").await.unwrap();
    let token = auth.login("ada", "pw").await.unwrap();

    accounts.delete(&account.id).await.unwrap();
    assert!(auth.verify(&token).await.unwrap().is_none());
}
