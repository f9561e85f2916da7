//! Error types for token-core

use thiserror::Error;

/// Result type for token operations
pub type TokenResult<T> = Result<T, TokenError>;

/// Errors raised while minting or verifying room access tokens
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Invalid API credentials: {message}")]
    InvalidCredentials { message: String },

    #[error("Identity is required for tokens that join a room")]
    MissingIdentity,

    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl TokenError {
    pub fn invalid_credentials(message: impl Into<String>) -> Self {
        Self::InvalidCredentials {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}
