//! Rentals Web Server
//!
//! HTTP API for accounts and listings, gated by bearer-token authentication
//! and role-based permissions.

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;

// Re-export main types
pub use error::{ApiError, ApiResult, NOT_ALLOWED};
pub use middleware::AuthGate;
pub use routes::{RouteAccess, RouteTable};
pub use server::RentalsServer;
pub use state::AppState;

use axum::{
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        Method,
    },
    Router,
};
use rentals_core::RentalsError;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Create the main application router
pub fn create_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([AUTHORIZATION, ACCEPT, CONTENT_TYPE]);

    let (routes, table) = routes::api_routes().into_parts();
    let gate = AuthGate::new(state.authenticator.clone(), state.authorizer.clone(), table);

    routes
        // route_layer only wraps matched routes, so MatchedPath is available
        .route_layer(axum::middleware::from_fn_with_state(
            gate,
            middleware::auth_middleware,
        ))
        .fallback(handlers::not_found)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Configuration for the web server
#[derive(Debug, Clone)]
pub struct WebConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// Enable development mode
    pub dev_mode: bool,
    /// Database URL; in-memory store when unset
    pub database_url: Option<String>,
    /// Admin account ensured at start-up
    pub admin_username: Option<String>,
    pub admin_password: Option<String>,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8083,
            dev_mode: false,
            database_url: None,
            admin_username: None,
            admin_password: None,
        }
    }
}

impl WebConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("RENTALS_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: std::env::var("RENTALS_PORT")
                .ok()
                .and_then(|port| port.parse().ok())
                .unwrap_or(8083),
            dev_mode: std::env::var("RENTALS_DEV_MODE")
                .ok()
                .and_then(|dev| dev.parse().ok())
                .unwrap_or(false),
            database_url: std::env::var("DATABASE_URL").ok(),
            admin_username: std::env::var("RENTALS_ADMIN_USERNAME").ok(),
            admin_password: std::env::var("RENTALS_ADMIN_PASSWORD").ok(),
        }
    }

    /// Get the server address
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn admin_credentials(&self) -> Option<(&str, &str)> {
        match (&self.admin_username, &self.admin_password) {
            (Some(username), Some(password)) => Some((username.as_str(), password.as_str())),
            _ => None,
        }
    }
}

/// Error types for the web server
#[derive(thiserror::Error, Debug)]
pub enum WebError {
    #[error("Server error: {0}")]
    Server(#[from] std::io::Error),

    #[error("Service error: {0}")]
    Service(#[from] RentalsError),
}

/// Result type for web operations
pub type WebResult<T> = Result<T, WebError>;
