use thiserror::Error;

use crate::{crypto::CryptoError, token::TokenError};

/// Crate-wide error taxonomy for authentication and store operations.
///
/// HTTP status mapping happens at the service boundary; variants here carry
/// only the domain meaning so callers can react without string matching.
#[derive(Error, Debug)]
pub enum AuthError {
    /// Login failed; deliberately carries no detail about which half was wrong.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Missing, malformed, tampered-with, or expired bearer credential.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The token was valid but its `jti` has been revoked. Kept distinct from
    /// [`AuthError::Unauthorized`] so clients can tell a deliberate logout
    /// from tampering.
    #[error("logged out")]
    LoggedOut,

    /// The caller is authenticated but lacks a required role.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// A referenced domain or user does not exist.
    #[error("{0} not found")]
    NotFound(String),

    /// A uniqueness constraint would be violated.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The request was structurally understood but semantically unusable.
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Shorthand for a [`AuthError::NotFound`] with the conventional noun.
    pub fn not_found(what: impl Into<String>) -> Self {
        AuthError::NotFound(what.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        AuthError::Conflict(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        AuthError::Unauthorized(message.into())
    }
}

/// Convenient Result alias for operations that may fail with [`AuthError`].
pub type Result<T> = std::result::Result<T, AuthError>;
