use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::{ActiveSession, DomainRecord, UserDetails, VerifiedIdentity};

/// Cookie carrying the signed access token, shared by the gateway and every
/// consuming application.
pub const ACCESS_TOKEN_COOKIE: &str = "access_token";

/// Cookie carrying the opaque refresh token.
pub const REFRESH_TOKEN_COOKIE: &str = "refresh_token";

/// The only token type the service issues.
pub const BEARER_TOKEN_TYPE: &str = "bearer";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub domain: String,
    #[serde(default)]
    pub roles: Vec<String>,
}

/// Login accepts either a bare username or an email-shaped identifier under
/// the same key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    #[serde(alias = "email")]
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyResponse {
    pub username: String,
    pub roles: Vec<String>,
}

impl From<VerifiedIdentity> for VerifyResponse {
    fn from(identity: VerifiedIdentity) -> Self {
        Self {
            username: identity.username,
            roles: identity.roles,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshResponse {
    pub access_token: String,
    pub refresh_token: String,
}

/// Revocation input: an explicit `jti`, or any token (access or refresh) to
/// derive the revocation from. The bearer header is a third source handled
/// at the HTTP layer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RevokeRequest {
    #[serde(default)]
    pub jti: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevokeResponse {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jti: Option<Uuid>,
}

impl RevokeResponse {
    /// The `jti` is echoed back when revocation resolved to an access
    /// token; refresh-token revocation has no id to report.
    pub fn revoked(jti: Option<Uuid>) -> Self {
        Self {
            status: "revoked".to_string(),
            jti,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
}

impl StatusResponse {
    pub fn new(status: impl Into<String>) -> Self {
        Self {
            status: status.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainCreateRequest {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainRenameRequest {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainResponse {
    pub id: Uuid,
    pub name: String,
}

impl From<DomainRecord> for DomainResponse {
    fn from(record: DomainRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub domain: Option<String>,
    pub roles: Vec<String>,
}

impl From<UserDetails> for UserResponse {
    fn from(details: UserDetails) -> Self {
        Self {
            id: details.id,
            username: details.username,
            domain: details.domain,
            roles: details.roles,
        }
    }
}

/// Admin update payload. Absent fields are preserved; `roles`, when present,
/// replaces the assignment wholesale (unknown names are created on demand).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserUpdateRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub roles: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionResponse {
    pub username: String,
    pub logged_in_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl From<ActiveSession> for SessionResponse {
    fn from(session: ActiveSession) -> Self {
        Self {
            username: session.username,
            logged_in_at: session.logged_in_at,
            expires_at: session.expires_at,
        }
    }
}
