use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Access tokens live for a fixed one-hour horizon.
pub const ACCESS_TOKEN_TTL_SECS: i64 = 60 * 60;

/// Refresh tokens are valid for fourteen days unless rotated or revoked.
pub const REFRESH_TOKEN_TTL_SECS: i64 = 14 * 24 * 60 * 60;

/// Signed claim set carried by every access token.
///
/// `roles` is a snapshot taken at issuance; role changes propagate on the
/// next refresh, not mid-lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub username: String,
    pub roles: Vec<String>,
    pub exp: i64,
    pub jti: Uuid,
}

/// Decode failures are distinct so callers can react differently: an expired
/// token should prompt a refresh, the other two are hard rejects.
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("malformed token")]
    Malformed,
    #[error("invalid token signature")]
    BadSignature,
    #[error("token expired")]
    Expired,
    #[error("token signing failed: {0}")]
    Signing(String),
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            ErrorKind::InvalidSignature => TokenError::BadSignature,
            _ => TokenError::Malformed,
        }
    }
}

/// A freshly signed token together with the claims that went into it.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub claims: Claims,
}

/// Encodes and decodes HS256-signed access tokens with a shared secret.
///
/// Pure apart from clock and jti entropy; all I/O (revocation lookups)
/// belongs to the caller.
#[derive(Clone)]
pub struct TokenCodec {
    secret: String,
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec").finish_non_exhaustive()
    }
}

impl TokenCodec {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Sign a claim set for `username`. A fresh random `jti` and a one-hour
    /// `exp` are injected on every call.
    pub fn encode(&self, username: &str, roles: &[String]) -> Result<IssuedToken, TokenError> {
        let claims = Claims {
            username: username.to_owned(),
            roles: roles.to_vec(),
            exp: (Utc::now() + Duration::seconds(ACCESS_TOKEN_TTL_SECS)).timestamp(),
            jti: Uuid::new_v4(),
        };

        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.secret.as_ref()),
        )
        .map_err(|err| TokenError::Signing(err.to_string()))?;

        Ok(IssuedToken { token, claims })
    }

    /// Verify signature and expiry, returning the embedded claims.
    pub fn decode(&self, token: &str) -> Result<Claims, TokenError> {
        self.decode_with(token, &Validation::new(Algorithm::HS256))
    }

    /// Verify the signature but ignore expiry. Used by revocation, which
    /// needs the `jti` and original `exp` of tokens that may already have
    /// lapsed.
    pub fn decode_allow_expired(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        self.decode_with(token, &validation)
    }

    fn decode_with(&self, token: &str, validation: &Validation) -> Result<Claims, TokenError> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_ref()),
            validation,
        )
        .map(|data| data.claims)
        .map_err(TokenError::from)
    }
}

/// Refresh tokens are opaque; a random UUID string is unguessable and
/// carries no claims.
pub fn generate_refresh_token() -> String {
    Uuid::new_v4().to_string()
}
