//!
//! # Custom Error Handling
//!
//! This module defines the closed error type `AppError` used throughout the application.
//! Every core operation converts its internal failures into one of these kinds before
//! returning, and `AppError` is translated into a wire-format response in exactly one place:
//! its `actix_web::error::ResponseError` implementation.
//!
//! `From` implementations for `sqlx::Error`, `validator::ValidationErrors`,
//! `bcrypt::BcryptError` and the token codec's `TokenError` allow conversion with `?`.

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use serde_json::json;
use thiserror::Error;
use validator::ValidationErrors;

use crate::auth::token::TokenError;

/// Represents all possible errors that can occur within the application.
#[derive(Debug, Error)]
pub enum AppError {
    /// Input failed field-level validation (HTTP 400, with per-field detail).
    #[error("Validation Error: {0}")]
    Validation(ValidationErrors),
    /// The request could not be decoded at all, e.g. malformed JSON or a bad path segment (HTTP 400).
    #[error("Bad Request: {0}")]
    BadRequest(String),
    /// The request conflicts with existing state, e.g. a duplicate email (HTTP 400).
    #[error("Conflict: {0}")]
    Conflict(String),
    /// Credentials or tokens were presented but rejected (HTTP 401).
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    /// A protected route was called without a usable bearer token (HTTP 401).
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),
    /// Represents a situation where a requested resource was not found (HTTP 404).
    #[error("Not Found: {0}")]
    NotFound(String),
    /// Represents an error originating from database operations (HTTP 500).
    #[error("Database Error: {0}")]
    Database(String),
    /// Represents an unexpected server-side error (HTTP 500).
    #[error("Internal Server Error: {0}")]
    Internal(String),
}

/// Converts `AppError` variants into `HttpResponse` objects.
///
/// Client errors carry their message verbatim in `{"error": ...}`. Server errors answer with a
/// generic message; the underlying detail is logged and only echoed back in debug builds.
impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::BadRequest(_) | AppError::Conflict(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Unauthorized(_) | AppError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            AppError::Validation(errors) => json!({
                "error": "Validation failed",
                "details": errors,
            }),
            AppError::BadRequest(msg)
            | AppError::Conflict(msg)
            | AppError::Unauthorized(msg)
            | AppError::Unauthenticated(msg)
            | AppError::NotFound(msg) => json!({ "error": msg }),
            AppError::Database(detail) | AppError::Internal(detail) => {
                log::error!("{}", self);
                if cfg!(debug_assertions) {
                    json!({ "error": "Internal Server Error", "detail": detail })
                } else {
                    json!({ "error": "Internal Server Error" })
                }
            }
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}

/// Converts `sqlx::Error` into `AppError`.
///
/// Unique-constraint violations become `Conflict` (the only unique column is the user email),
/// `RowNotFound` becomes `NotFound`, everything else is a `Database` error.
impl From<sqlx::Error> for AppError {
    fn from(error: sqlx::Error) -> AppError {
        match error {
            sqlx::Error::RowNotFound => AppError::NotFound("Record not found".into()),
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                AppError::Conflict("Email already registered".into())
            }
            _ => AppError::Database(error.to_string()),
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(error: ValidationErrors) -> AppError {
        AppError::Validation(error)
    }
}

/// Signing failures are server faults; verification failures are reported as a generic 401.
impl From<TokenError> for AppError {
    fn from(error: TokenError) -> AppError {
        match error {
            TokenError::Invalid(_) => AppError::Unauthorized("Invalid token".into()),
            TokenError::Signing(e) => AppError::Internal(format!("Failed to sign token: {}", e)),
            TokenError::LifetimeOverflow => {
                AppError::Internal("Token lifetime does not fit the clock".into())
            }
        }
    }
}

/// Converts `bcrypt::BcryptError` into `AppError::Internal`.
impl From<bcrypt::BcryptError> for AppError {
    fn from(error: bcrypt::BcryptError) -> AppError {
        AppError::Internal(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;
    use validator::Validate;

    #[derive(Validate)]
    struct Probe {
        #[validate(email)]
        email: String,
    }

    #[test]
    fn test_error_statuses() {
        let cases = vec![
            (AppError::BadRequest("bad".into()), 400),
            (AppError::Conflict("dup".into()), 400),
            (AppError::Unauthorized("nope".into()), 401),
            (AppError::Unauthenticated("nope".into()), 401),
            (AppError::NotFound("gone".into()), 404),
            (AppError::Database("boom".into()), 500),
            (AppError::Internal("boom".into()), 500),
        ];

        for (error, expected) in cases {
            assert_eq!(error.error_response().status(), expected, "{}", error);
        }
    }

    #[actix_rt::test]
    async fn test_validation_error_carries_field_detail() {
        let errors = Probe {
            email: "not-an-email".into(),
        }
        .validate()
        .unwrap_err();

        let response = AppError::from(errors).error_response();
        assert_eq!(response.status(), 400);

        let body = to_bytes(response.into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "Validation failed");
        assert!(json["details"]["email"].is_array());
    }

    #[actix_rt::test]
    async fn test_client_error_body_shape() {
        let response = AppError::Unauthorized("Invalid email or password".into()).error_response();
        let body = to_bytes(response.into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json, json!({ "error": "Invalid email or password" }));
    }

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        assert!(matches!(
            AppError::from(sqlx::Error::RowNotFound),
            AppError::NotFound(_)
        ));
    }
}
