use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

use gatehouse_core::error::AuthError;
use gatehouse_core::token::TokenError;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": {
                "message": self.message,
                "status": self.status.as_u16(),
            }
        }));

        let mut response = (self.status, body).into_response();
        if self.status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials | AuthError::LoggedOut => {
                Self::unauthorized(err.to_string())
            }
            AuthError::Unauthorized(msg) => Self::unauthorized(msg),
            AuthError::Forbidden(msg) => Self::forbidden(msg),
            AuthError::NotFound(_) => Self::not_found(err.to_string()),
            AuthError::Conflict(msg) => Self::conflict(msg),
            AuthError::BadRequest(msg) => Self::bad_request(msg),
            AuthError::Token(TokenError::Signing(msg)) => {
                tracing::error!(error = %msg, "token signing failed");
                Self::internal("token signing failed")
            }
            AuthError::Token(token_err) => Self::unauthorized(token_err.to_string()),
            AuthError::Crypto(crypto_err) => {
                tracing::error!(error = %crypto_err, "password hashing failed");
                Self::internal("credential processing failed")
            }
            AuthError::Database(db_err) => {
                tracing::error!(error = ?db_err, "database operation failed");
                Self::internal("database operation failed")
            }
            AuthError::Internal(msg) => Self::internal(msg),
        }
    }
}
