use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Role granted to every account at registration.
pub const USER_ROLE: &str = "user";
/// Role gating the administrative endpoints.
pub const ADMIN_ROLE: &str = "admin";

/// A mail/tenant namespace. Deleting a domain nulls out referencing users'
/// `domain_id` rather than deleting the users.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainRecord {
    pub id: Uuid,
    pub name: String,
}

/// Named role such as `user` or `admin`. Authorization checks test for
/// membership, never for role attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleRecord {
    pub id: Uuid,
    pub name: String,
}

/// Stored account row. `username` is the sole login key; the domain link is
/// informational grouping and not part of any uniqueness constraint.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub domain_id: Option<Uuid>,
}

/// Insert payload for a new account; the id is minted by the store.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub domain_id: Option<Uuid>,
}

/// Partial update applied by the admin user endpoints. `None` fields are
/// left untouched, which is how an update preserves the password when the
/// caller did not supply one.
#[derive(Debug, Clone, Default)]
pub struct UserChange {
    pub username: Option<String>,
    pub password_hash: Option<String>,
}

/// Account row joined with its domain name and role names, for the admin
/// listing endpoints.
#[derive(Debug, Clone)]
pub struct UserDetails {
    pub id: Uuid,
    pub username: String,
    pub domain: Option<String>,
    pub roles: Vec<String>,
}

/// What an atomic refresh-token consume returns. The expiry still has to be
/// checked by the caller; the row is already gone either way.
#[derive(Debug, Clone)]
pub struct ConsumedRefreshToken {
    pub username: String,
    pub expires_at: DateTime<Utc>,
}

/// One live login, derived from a non-expired refresh token. Telemetry for
/// the admin sessions view, never an input to authorization decisions.
#[derive(Debug, Clone)]
pub struct ActiveSession {
    pub username: String,
    pub logged_in_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// The identity a verified access token resolves to. Inserted into request
/// extensions by the authorization middleware.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedIdentity {
    pub username: String,
    pub roles: Vec<String>,
}

impl VerifiedIdentity {
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}
