//! Integration test helpers
//!
//! Spawns the full application on a random local port and drives it over
//! real HTTP with reqwest.

#![allow(dead_code)]

use rentals_applications::MemoryStore;
use rentals_core::{Account, Role, Store};
use rentals_web::{create_app, AppState, WebConfig};
use serde_json::{json, Value};
use std::sync::{Arc, LazyLock};
use tokio::net::TcpListener;
use uuid::Uuid;

pub const ADMIN_USERNAME: &str = "root";
pub const ADMIN_PASSWORD: &str = "changeme";

// Ensure tracing is initialized only once
static TRACING: LazyLock<()> = LazyLock::new(|| {
    if std::env::var("TEST_LOG").is_ok() {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .finish();
        tracing::subscriber::set_global_default(subscriber).ok();
    } else {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .with_writer(std::io::sink)
            .finish();
        tracing::subscriber::set_global_default(subscriber).ok();
    }
});

/// A running application instance
pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub api_client: reqwest::Client,
    pub state: AppState,
}

impl TestApp {
    pub async fn post_login(&self, username: &str, password: &str) -> reqwest::Response {
        self.api_client
            .post(format!("{}/login", &self.address))
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    /// Log in and return the token, panicking on failure
    pub async fn login(&self, username: &str, password: &str) -> String {
        let response = self.post_login(username, password).await;
        assert_eq!(response.status().as_u16(), 200, "login as {} failed", username);
        let body: Value = response.json().await.expect("login body is not JSON");
        body["token"].as_str().expect("no token in body").to_string()
    }

    pub async fn login_admin(&self) -> String {
        self.login(ADMIN_USERNAME, ADMIN_PASSWORD).await
    }

    pub async fn post_new_client<Body>(&self, body: &Body) -> reqwest::Response
    where
        Body: serde::Serialize,
    {
        self.api_client
            .post(format!("{}/newClient", &self.address))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    /// Request builder with the raw token as the Authorization header
    pub fn request(
        &self,
        method: reqwest::Method,
        path: &str,
        token: Option<&str>,
    ) -> reqwest::RequestBuilder {
        let builder = self
            .api_client
            .request(method, format!("{}{}", &self.address, path));
        match token {
            Some(token) => builder.header("Authorization", token),
            None => builder,
        }
    }

    /// Create an account directly through the service layer
    pub async fn seed_account(&self, role: Role) -> TestUser {
        let user = TestUser::generate(role);
        let account = self
            .state
            .accounts
            .create(&user.username, &user.password, role.as_str())
            .await
            .expect("Failed to seed account");
        TestUser {
            account: Some(account),
            ..user
        }
    }
}

/// Start the application with an in-memory store and a bootstrap admin
pub async fn spawn_app() -> TestApp {
    LazyLock::force(&TRACING);

    let config = WebConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        dev_mode: true,
        database_url: None,
        admin_username: Some(ADMIN_USERNAME.to_string()),
        admin_password: Some(ADMIN_PASSWORD.to_string()),
    };

    let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
    let state = AppState::with_store(config, store)
        .await
        .expect("Failed to build application state");
    let app = create_app(state.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let client = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap();

    TestApp {
        address: format!("http://127.0.0.1:{}", port),
        port,
        api_client: client,
        state,
    }
}

/// Test user data
pub struct TestUser {
    pub username: String,
    pub password: String,
    pub role: Role,
    pub account: Option<Account>,
}

impl TestUser {
    pub fn generate(role: Role) -> Self {
        let id = Uuid::new_v4().to_string();
        Self {
            username: format!("{}_{}", role, &id[..8]),
            password: format!("password_{}", &id[..8]),
            role,
            account: None,
        }
    }

    pub fn id(&self) -> &str {
        self.account
            .as_ref()
            .map(|account| account.id.as_str())
            .expect("user was not seeded")
    }

    pub fn to_login_json(&self) -> Value {
        json!({
            "username": self.username,
            "password": self.password
        })
    }
}

/// A valid listing body for the given realtor
pub fn listing_json(realtor_id: &str, rooms: u32, price: f64) -> Value {
    json!({
        "name": format!("{} room apartment", rooms),
        "description": "close to the river",
        "realtorId": realtor_id,
        "floorAreaMeters": 25.0 * rooms as f64,
        "pricePerMonthUSD": price,
        "roomCount": rooms,
        "latitude": 44.81,
        "longitude": 20.46
    })
}
