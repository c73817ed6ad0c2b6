// src/application/error_handling.rs
//
// Error Handling for Commands
//
// ARCHITECTURE:
// - Maps internal errors → caller-facing responses
// - Provides a consistent error format
// - Never exposes storage details
// - Logs infrastructure errors for debugging

use serde::{Deserialize, Serialize};

use crate::domain::DomainError;
use crate::error::AppError;

/// Standard error response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error_type: ErrorType,
    pub message: String,
    pub details: Option<String>,
}

/// Error categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorType {
    /// Unknown id
    NotFound,

    /// Input breaks a business rule
    Validation,

    /// The entity is no longer in the state the operation expects
    StateConflict,

    /// Bad credentials, inactive account or wrong actor
    AuthFailure,

    /// Database/persistence error
    Database,

    /// Other/unknown error
    Internal,
}

impl ErrorResponse {
    fn new(error_type: ErrorType, message: impl Into<String>, details: Option<String>) -> Self {
        Self {
            success: false,
            error_type,
            message: message.into(),
            details,
        }
    }

    /// Create error response from AppError
    pub fn from_app_error(error: AppError) -> Self {
        match error {
            AppError::NotFound(what) => Self::new(ErrorType::NotFound, format!("{} not found", what), None),

            AppError::Domain(DomainError::NotFound(what)) => {
                Self::new(ErrorType::NotFound, format!("{} not found", what), None)
            }

            AppError::Domain(DomainError::InvalidStateTransition(details)) => Self::new(
                ErrorType::StateConflict,
                "The request was already resolved differently",
                Some(details),
            ),

            AppError::Domain(domain_error) => {
                Self::new(ErrorType::Validation, domain_error.to_string(), None)
            }

            AppError::Auth(auth_error) => {
                Self::new(ErrorType::AuthFailure, auth_error.to_string(), None)
            }

            AppError::Database(db_error) => {
                log::error!("Database error: {:?}", db_error);
                Self::new(
                    ErrorType::Database,
                    "Database operation failed",
                    Some("Check logs for details".to_string()),
                )
            }

            AppError::Pool(pool_error) => {
                log::error!("Connection pool error: {}", pool_error);
                Self::new(ErrorType::Database, "Database connection failed", None)
            }

            AppError::Serialization(serde_error) => {
                log::error!("Serialization error: {:?}", serde_error);
                Self::new(ErrorType::Internal, "Data serialization failed", None)
            }

            AppError::Io(io_error) => {
                log::error!("IO error: {:?}", io_error);
                Self::new(
                    ErrorType::Internal,
                    "File system operation failed",
                    Some(io_error.to_string()),
                )
            }

            AppError::Config(message) | AppError::Other(message) => {
                log::error!("Internal error: {}", message);
                Self::new(ErrorType::Internal, message, None)
            }
        }
    }

    /// Create validation error
    pub fn validation(message: String) -> Self {
        Self::new(ErrorType::Validation, message, None)
    }
}

/// Helper trait to convert Results to ErrorResponse
pub trait ToErrorResponse<T> {
    fn to_error_response(self) -> Result<T, String>;
}

impl<T> ToErrorResponse<T> for Result<T, AppError> {
    fn to_error_response(self) -> Result<T, String> {
        self.map_err(|e| {
            let error_response = ErrorResponse::from_app_error(e);
            serde_json::to_string(&error_response).unwrap_or_else(|_| "Internal error".to_string())
        })
    }
}
