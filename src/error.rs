//!
//! # Custom Error Handling
//!
//! This module defines `AppError`, the single error type returned by every service
//! operation and route handler. Each variant maps to one HTTP status, and every
//! variant renders the same JSON failure shape:
//!
//! ```json
//! { "success": false, "message": "..." }
//! ```
//!
//! Store failures are logged where they are converted and surfaced to the client
//! as a generic message only. `From` implementations for
//! `validator::ValidationErrors`, `bcrypt::BcryptError` and the store's own
//! `StoreError` allow the `?` operator throughout.

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use serde_json::json;
use std::fmt;
use validator::ValidationErrors;

use crate::store::StoreError;

/// Generic message used for every server-side failure that has no more specific wording.
pub const GENERIC_FAILURE: &str = "Something went wrong, please try again later";

/// Represents all possible errors that can occur within the application.
#[derive(Debug)]
pub enum AppError {
    /// Authentication failed or is required but missing (HTTP 401).
    /// The message is always generic; it never says which credential was wrong.
    Unauthorized(String),
    /// Missing or malformed input (HTTP 400).
    BadRequest(String),
    /// The resource does not exist, or is not owned by the caller (HTTP 404).
    NotFound(String),
    /// A uniqueness rule was violated, e.g. a taken username (HTTP 409).
    Conflict(String),
    /// Unexpected server-side failure with a client-safe message (HTTP 500).
    InternalServerError(String),
    /// Persistence failure (HTTP 500). The payload is internal detail and is
    /// only ever logged, never sent to the client.
    DatabaseError(String),
    /// Input failed length or format validation (HTTP 422).
    ValidationError(String),
}

impl AppError {
    /// Message that is safe to show to the caller.
    pub fn public_message(&self) -> &str {
        match self {
            AppError::Unauthorized(msg)
            | AppError::BadRequest(msg)
            | AppError::NotFound(msg)
            | AppError::Conflict(msg)
            | AppError::InternalServerError(msg)
            | AppError::ValidationError(msg) => msg,
            AppError::DatabaseError(_) => GENERIC_FAILURE,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AppError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            AppError::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            AppError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            AppError::InternalServerError(msg) => write!(f, "Internal Server Error: {}", msg),
            AppError::DatabaseError(msg) => write!(f, "Database Error: {}", msg),
            AppError::ValidationError(msg) => write!(f, "Validation Error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

/// Converts `AppError` variants into `HttpResponse` objects.
impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::InternalServerError(_) | AppError::DatabaseError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::ValidationError(_) => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({
            "success": false,
            "message": self.public_message()
        }))
    }
}

/// Store failures that were not mapped to an operation-specific message.
impl From<StoreError> for AppError {
    fn from(error: StoreError) -> AppError {
        log::error!("store error: {}", error);
        AppError::DatabaseError(error.to_string())
    }
}

/// Converts `validator::ValidationErrors` into `AppError::ValidationError`.
///
/// The detailed validation messages are preserved.
impl From<ValidationErrors> for AppError {
    fn from(error: ValidationErrors) -> AppError {
        AppError::ValidationError(error.to_string())
    }
}

/// Hashing failures are internal; the bcrypt detail is logged only.
impl From<bcrypt::BcryptError> for AppError {
    fn from(error: bcrypt::BcryptError) -> AppError {
        log::error!("password hashing error: {}", error);
        AppError::InternalServerError(GENERIC_FAILURE.into())
    }
}
