//! Unified error handling system
//!
//! Every fallible operation in the service reports one of these categories.
//! The HTTP layer maps them to status codes, so the variants stay coarse.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, error, warn};

pub type RentalsResult<T> = Result<T, RentalsError>;

/// Error context providing additional information for debugging and recovery
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorContext {
    /// Unique error ID for tracking
    pub error_id: String,
    /// Timestamp when error occurred
    pub timestamp: DateTime<Utc>,
    /// Component where error originated
    pub component: String,
    /// Operation being performed when error occurred
    pub operation: Option<String>,
    /// Additional metadata
    pub metadata: HashMap<String, String>,
    /// Recovery suggestions
    pub recovery_suggestions: Vec<String>,
}

impl ErrorContext {
    pub fn new(component: &str) -> Self {
        Self {
            error_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            component: component.to_string(),
            operation: None,
            metadata: HashMap::new(),
            recovery_suggestions: Vec::new(),
        }
    }

    pub fn with_operation(mut self, operation: &str) -> Self {
        self.operation = Some(operation.to_string());
        self
    }

    pub fn with_metadata(mut self, key: &str, value: &str) -> Self {
        self.metadata.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_suggestion(mut self, suggestion: &str) -> Self {
        self.recovery_suggestions.push(suggestion.to_string());
        self
    }
}

/// Main error type for the rentals service
#[derive(Error, Debug)]
pub enum RentalsError {
    /// Credentials or bearer token were rejected
    #[error("Authentication error: {message}")]
    Authentication {
        message: String,
        context: ErrorContext,
    },

    /// Authenticated, but the role lacks the permission
    #[error("Authorization error: {message}")]
    Authorization {
        message: String,
        context: ErrorContext,
    },

    #[error("Validation error: {message}")]
    Validation {
        message: String,
        field: Option<String>,
        context: ErrorContext,
    },

    #[error("Resource not found: {resource}")]
    NotFound {
        resource: String,
        context: ErrorContext,
    },

    #[error("Conflict: {message}")]
    Conflict {
        message: String,
        context: ErrorContext,
    },

    #[error("Storage error: {message}")]
    Storage {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },

    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {message}")]
    Internal {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },
}

impl RentalsError {
    /// Get the error context
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            RentalsError::Authentication { context, .. } => Some(context),
            RentalsError::Authorization { context, .. } => Some(context),
            RentalsError::Validation { context, .. } => Some(context),
            RentalsError::NotFound { context, .. } => Some(context),
            RentalsError::Conflict { context, .. } => Some(context),
            RentalsError::Storage { context, .. } => Some(context),
            RentalsError::Config { context, .. } => Some(context),
            RentalsError::Internal { context, .. } => Some(context),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, RentalsError::NotFound { .. })
    }

    /// Errors caused by the caller rather than by the service
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            RentalsError::Authentication { .. }
                | RentalsError::Authorization { .. }
                | RentalsError::Validation { .. }
                | RentalsError::NotFound { .. }
                | RentalsError::Conflict { .. }
        )
    }

    /// Log the error with appropriate level
    pub fn log(&self) {
        let error_id = self.context().map(|c| c.error_id.as_str());
        match self {
            RentalsError::Storage { .. }
            | RentalsError::Internal { .. }
            | RentalsError::Io(_)
            | RentalsError::Serialization(_) => {
                error!(error_id = ?error_id, error = %self, "Internal error occurred");
            }
            RentalsError::Config { .. } => {
                error!(error_id = ?error_id, error = %self, "Configuration error");
            }
            RentalsError::Authentication { .. } | RentalsError::Authorization { .. } => {
                warn!(error_id = ?error_id, error = %self, "Access rejected");
            }
            _ => {
                debug!(error_id = ?error_id, error = %self, "Request error");
            }
        }
    }
}

/// Convenience macros for creating errors with context
#[macro_export]
macro_rules! storage_error {
    ($msg:expr, $component:expr) => {
        $crate::RentalsError::Storage {
            message: $msg.to_string(),
            source: None,
            context: $crate::ErrorContext::new($component),
        }
    };
    ($msg:expr, $component:expr, $source:expr) => {
        $crate::RentalsError::Storage {
            message: $msg.to_string(),
            source: Some(Box::new($source)),
            context: $crate::ErrorContext::new($component),
        }
    };
}

#[macro_export]
macro_rules! config_error {
    ($msg:expr, $component:expr) => {
        $crate::RentalsError::Config {
            message: $msg.to_string(),
            source: None,
            context: $crate::ErrorContext::new($component)
                .with_suggestion("Check your configuration file")
                .with_suggestion("Run 'rentals config --init' to create default config"),
        }
    };
}

#[macro_export]
macro_rules! validation_error {
    ($msg:expr, $field:expr, $component:expr) => {
        $crate::RentalsError::Validation {
            message: $msg.to_string(),
            field: Some($field.to_string()),
            context: $crate::ErrorContext::new($component)
                .with_suggestion("Check the field value and format"),
        }
    };
}

#[macro_export]
macro_rules! not_found_error {
    ($resource:expr, $component:expr) => {
        $crate::RentalsError::NotFound {
            resource: $resource.to_string(),
            context: $crate::ErrorContext::new($component)
                .with_suggestion("Check if the resource exists"),
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_is_distinguishable() {
        let err = not_found_error!("account 42", "accounts");
        assert!(err.is_not_found());
        assert!(err.is_client_error());
        assert_eq!(err.to_string(), "Resource not found: account 42");

        let err = storage_error!("disk full", "sqlite");
        assert!(!err.is_not_found());
        assert!(!err.is_client_error());
    }

    #[test]
    fn test_context_builder() {
        let context = ErrorContext::new("auth")
            .with_operation("login")
            .with_metadata("username", "alice")
            .with_suggestion("retry");

        assert_eq!(context.component, "auth");
        assert_eq!(context.operation.as_deref(), Some("login"));
        assert_eq!(context.metadata.get("username").map(String::as_str), Some("alice"));
        assert_eq!(context.recovery_suggestions, vec!["retry".to_string()]);
    }

    #[test]
    fn test_validation_macro_records_field() {
        let err = validation_error!("unknown role", "role", "accounts");
        match err {
            RentalsError::Validation { field, .. } => assert_eq!(field.as_deref(), Some("role")),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
