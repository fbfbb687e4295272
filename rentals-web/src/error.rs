//! Mapping of service errors onto HTTP responses

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rentals_core::{ErrorContext, RentalsError};
use serde_json::json;

/// Body of every 401 and 403. Never says which check failed.
pub const NOT_ALLOWED: &str = "Not allowed";

/// Handler error: wraps [`RentalsError`] and renders it as a response
#[derive(Debug)]
pub struct ApiError(pub RentalsError);

pub type ApiResult<T> = Result<T, ApiError>;

impl From<RentalsError> for ApiError {
    fn from(error: RentalsError) -> Self {
        Self(error)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(RentalsError::Validation {
            message: rejection.body_text(),
            field: None,
            context: ErrorContext::new("http").with_operation("decode_json"),
        })
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self(RentalsError::Validation {
            message: rejection.body_text(),
            field: None,
            context: ErrorContext::new("http").with_operation("decode_query"),
        })
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        self.0.log();

        let (status, code, message) = match &self.0 {
            RentalsError::Authentication { .. } => {
                return (StatusCode::UNAUTHORIZED, NOT_ALLOWED).into_response();
            }
            RentalsError::Authorization { .. } => {
                return (StatusCode::FORBIDDEN, NOT_ALLOWED).into_response();
            }
            RentalsError::NotFound { resource, .. } => (
                StatusCode::NOT_FOUND,
                "not_found",
                format!("{} not found", resource),
            ),
            RentalsError::Validation { message, .. } => {
                (StatusCode::BAD_REQUEST, "invalid_request", message.clone())
            }
            RentalsError::Conflict { message, .. } => {
                (StatusCode::CONFLICT, "conflict", message.clone())
            }
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "Internal server error".to_string(),
            ),
        };

        let mut body = json!({
            "error": code,
            "message": message,
        });
        if let RentalsError::Validation {
            field: Some(field), ..
        } = &self.0
        {
            body["field"] = json!(field);
        }

        (status, Json(body)).into_response()
    }
}
