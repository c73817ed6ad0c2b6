// src/error/types.rs
use crate::domain::DomainError;
use serde::Serialize;
use thiserror::Error;

/// Credential and actor-role failures.
/// Surfaced to callers as structured results, never as panics.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Account is awaiting moderator approval")]
    AccountPending,

    #[error("Account has been rejected")]
    AccountRejected,

    #[error("No active session")]
    NotLoggedIn,

    #[error("Operation not permitted for this actor: {0}")]
    WrongActor(String),
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Pool error: {0}")]
    Pool(String),

    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    #[error("Authentication failed: {0}")]
    Auth(#[from] AuthError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Other error: {0}")]
    Other(String),
}

impl AppError {
    pub fn not_found(kind: &str, id: &str) -> Self {
        AppError::NotFound(format!("{} '{}'", kind, id))
    }
}

impl Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl From<chrono::ParseError> for AppError {
    fn from(err: chrono::ParseError) -> Self {
        AppError::Other(format!("Date parse error: {}", err))
    }
}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<r2d2::Error> for AppError {
    fn from(err: r2d2::Error) -> Self {
        AppError::Pool(err.to_string())
    }
}

pub type AppResult<T> = Result<T, AppError>;
