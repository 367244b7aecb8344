//! Error handling module
//!
//! Provides unified error types and handling for the entire application.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Application-wide error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] tokio_postgres::Error),

    #[error("Pool error: {0}")]
    Pool(#[from] deadpool_postgres::PoolError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Name mismatch: {message}")]
    NameMismatch { message: String, correct_name: String },

    #[error("Bonus proposal already submitted for this month (existing id {existing_id})")]
    AlreadySubmitted {
        existing_id: i32,
        employee_name: String,
    },

    #[error("Duplicate entry detected")]
    DuplicateEntry,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    #[allow(dead_code)]
    Internal(String),
}

/// The proposal a month conflict collided with
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExistingProposal {
    pub id: i32,
    pub employee_name: String,
}

/// Error response structure
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub existing_proposal: Option<ExistingProposal>,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Database(_) | AppError::Pool(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_)
            | AppError::BadRequest(_)
            | AppError::NameMismatch { .. }
            | AppError::AlreadySubmitted { .. }
            | AppError::DuplicateEntry => StatusCode::BAD_REQUEST,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            AppError::Database(_) => "DATABASE_ERROR",
            AppError::Pool(_) => "DATABASE_UNAVAILABLE",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::NameMismatch { .. } => "NAME_MISMATCH",
            AppError::AlreadySubmitted { .. } => "ALREADY_SUBMITTED",
            AppError::DuplicateEntry => "DUPLICATE_ENTRY",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code().to_string();

        // Server-side failures are logged in full and reported generically
        let (message, correct_name, existing_proposal) = match self {
            AppError::Database(e) => {
                error!("Database error: {:?}", e);
                ("A database error occurred".to_string(), None, None)
            }
            AppError::Pool(e) => {
                error!("Pool error: {:?}", e);
                ("The database is currently unavailable".to_string(), None, None)
            }
            AppError::Internal(msg) => {
                error!("Internal error: {}", msg);
                ("An internal error occurred".to_string(), None, None)
            }
            AppError::Validation(msg) | AppError::BadRequest(msg) | AppError::NotFound(msg) => {
                (msg, None, None)
            }
            AppError::NameMismatch {
                message,
                correct_name,
            } => (message, Some(correct_name), None),
            AppError::AlreadySubmitted {
                existing_id,
                employee_name,
            } => (
                "Bonus proposal already submitted for this month".to_string(),
                None,
                Some(ExistingProposal {
                    id: existing_id,
                    employee_name,
                }),
            ),
            AppError::DuplicateEntry => (
                "Duplicate entry detected: a proposal for this employee and month already exists"
                    .to_string(),
                None,
                None,
            ),
        };

        let body = Json(ErrorResponse {
            success: false,
            message,
            code,
            correct_name,
            existing_proposal,
        });

        (status, body).into_response()
    }
}

/// Result type alias for API handlers
pub type ApiResult<T> = Result<T, AppError>;

/// Helper function to create a validation error
pub fn validation_error(msg: impl Into<String>) -> AppError {
    AppError::Validation(msg.into())
}

/// Helper function to create a not found error
pub fn not_found_error(msg: impl Into<String>) -> AppError {
    AppError::NotFound(msg.into())
}

/// Helper function to create a name mismatch error
pub fn name_mismatch_error(employee_id: &str, correct_name: impl Into<String>) -> AppError {
    let correct_name = correct_name.into();
    AppError::NameMismatch {
        message: format!(
            "Employee ID {} is registered to {}",
            employee_id, correct_name
        ),
        correct_name,
    }
}
