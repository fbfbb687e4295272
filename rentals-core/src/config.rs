//! Service configuration

use crate::error::{ErrorContext, RentalsError, RentalsResult};
use crate::logging::LoggingConfig;

use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RentalsConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub bootstrap: BootstrapConfig,
}

/// Where records live. No database URL means an in-memory store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    pub database_url: Option<String>,
}

/// Admin account created at start-up if it does not exist yet
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BootstrapConfig {
    pub admin_username: Option<String>,
    pub admin_password: Option<String>,
}

impl BootstrapConfig {
    pub fn admin_credentials(&self) -> Option<(&str, &str)> {
        match (&self.admin_username, &self.admin_password) {
            (Some(username), Some(password)) => Some((username.as_str(), password.as_str())),
            _ => None,
        }
    }
}

impl RentalsConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> RentalsResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| RentalsError::Config {
            message: format!("Failed to read config file: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("read_file")
                .with_suggestion("Check if the config file exists and is readable"),
        })?;

        let config: RentalsConfig = toml::from_str(&content).map_err(|e| RentalsError::Config {
            message: format!("Failed to parse config: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("parse_toml")
                .with_suggestion("Check TOML syntax in config file"),
        })?;

        Ok(config)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> RentalsResult<()> {
        let content = toml::to_string_pretty(self).map_err(|e| RentalsError::Config {
            message: format!("Failed to serialize config: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config").with_operation("serialize_toml"),
        })?;

        std::fs::write(path, content).map_err(|e| RentalsError::Config {
            message: format!("Failed to write config file: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("write_file")
                .with_suggestion("Check if the directory exists and is writable"),
        })?;

        Ok(())
    }

    pub fn validate(&self) -> RentalsResult<()> {
        if let Some(url) = &self.storage.database_url {
            if url.trim().is_empty() {
                return Err(RentalsError::Config {
                    message: "storage.database_url must not be empty".to_string(),
                    source: None,
                    context: ErrorContext::new("config")
                        .with_operation("validate")
                        .with_suggestion("Remove database_url to use the in-memory store"),
                });
            }
        }

        let bootstrap = &self.bootstrap;
        if bootstrap.admin_username.is_some() != bootstrap.admin_password.is_some() {
            return Err(RentalsError::Config {
                message: "bootstrap admin needs both a username and a password".to_string(),
                source: None,
                context: ErrorContext::new("config")
                    .with_operation("validate")
                    .with_suggestion("Set both bootstrap.admin_username and bootstrap.admin_password"),
            });
        }

        if matches!(bootstrap.admin_password.as_deref(), Some("")) {
            return Err(RentalsError::Config {
                message: "bootstrap admin password must not be empty".to_string(),
                source: None,
                context: ErrorContext::new("config").with_operation("validate"),
            });
        }

        Ok(())
    }
}
