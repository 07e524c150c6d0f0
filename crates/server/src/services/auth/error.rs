//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Wrong password or unknown username.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// No token was presented.
    #[error("not authenticated")]
    MissingToken,

    /// The token's `exp` is in the past.
    #[error("token expired")]
    TokenExpired,

    /// Bad signature, wrong issuer, malformed claims.
    #[error("invalid token: {0}")]
    InvalidToken(String),

    /// Signing a token failed.
    #[error("token generation failed: {0}")]
    TokenGeneration(String),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}
