use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::Result;
use crate::model::{
    ActiveSession, ConsumedRefreshToken, DomainRecord, NewUser, RoleRecord, UserChange,
    UserDetails, UserRecord,
};
use crate::store::postgres::{
    PostgresDomainRepository, PostgresRefreshTokenRepository, PostgresRevokedTokenRepository,
    PostgresUserRepository,
};

/// Persistence port for tenant domains.
#[async_trait]
pub trait DomainRepository: Send + Sync {
    /// Insert a new domain. Fails with `Conflict` when the name is taken.
    async fn insert(&self, name: &str) -> Result<DomainRecord>;

    /// Insert-or-fetch by name. Used by idempotent seeding.
    async fn ensure(&self, name: &str) -> Result<DomainRecord>;

    async fn find_by_name(&self, name: &str) -> Result<Option<DomainRecord>>;

    /// All domains, ordered by name.
    async fn list(&self) -> Result<Vec<DomainRecord>>;

    /// Rename `old` to `new` in a single statement. Fails with `NotFound`
    /// when `old` is absent and `Conflict` when `new` is taken.
    async fn rename(&self, old: &str, new: &str) -> Result<DomainRecord>;

    /// Delete by name. Referencing users keep existing with a null domain.
    /// Returns whether a row was removed.
    async fn delete(&self, name: &str) -> Result<bool>;
}

/// Persistence port for accounts and their role assignments.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new account. Fails with `Conflict` when the username is
    /// taken.
    async fn insert(&self, user: NewUser) -> Result<UserRecord>;

    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>>;

    /// Username lookup constrained to accounts linked to the named domain.
    /// This is the email-login disambiguation path.
    async fn find_by_username_in_domain(
        &self,
        username: &str,
        domain: &str,
    ) -> Result<Option<UserRecord>>;

    /// All accounts with their domain name and role names, ordered by
    /// username.
    async fn list_details(&self) -> Result<Vec<UserDetails>>;

    async fn find_details(&self, username: &str) -> Result<Option<UserDetails>>;

    /// Current role names for an account.
    async fn roles_of(&self, user_id: Uuid) -> Result<Vec<String>>;

    /// Insert-or-fetch a role by name. Unknown role names are created on
    /// demand.
    async fn ensure_role(&self, name: &str) -> Result<RoleRecord>;

    /// Attach a role to an account; attaching twice is a no-op.
    async fn assign_role(&self, user_id: Uuid, role_id: Uuid) -> Result<()>;

    /// Replace an account's role assignment wholesale.
    async fn replace_roles(&self, user_id: Uuid, roles: &[String]) -> Result<()>;

    /// Apply a partial update. Fails with `Conflict` when a username change
    /// collides. Returns whether a row was touched.
    async fn update(&self, username: &str, change: UserChange) -> Result<bool>;

    /// Delete by username, cascading role links. Returns whether a row was
    /// removed.
    async fn delete(&self, username: &str) -> Result<bool>;
}

/// Persistence port for opaque, single-use refresh tokens.
#[async_trait]
pub trait RefreshTokenRepository: Send + Sync {
    async fn insert(
        &self,
        token: &str,
        username: &str,
        issued_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<()>;

    /// Atomically delete and return the row for `token`. At most one
    /// concurrent caller observes `Some`; everyone else gets `None`. An
    /// expired row is still consumed (lazy purge) and returned for the
    /// caller to reject.
    async fn consume(&self, token: &str) -> Result<Option<ConsumedRefreshToken>>;

    /// Delete without returning the row (revocation path). Returns whether
    /// a row was removed.
    async fn delete(&self, token: &str) -> Result<bool>;

    /// Non-expired tokens as login telemetry, newest first.
    async fn active(&self, now: DateTime<Utc>) -> Result<Vec<ActiveSession>>;

    /// Drop rows past their expiry. Returns the number removed.
    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64>;
}

/// Persistence port for revoked access-token ids.
#[async_trait]
pub trait RevokedTokenRepository: Send + Sync {
    /// Record a revoked `jti` until `expires_at`, after which the token
    /// would be rejected by expiry anyway. Recording the same `jti` twice
    /// is a no-op.
    async fn insert(&self, jti: Uuid, expires_at: DateTime<Utc>) -> Result<()>;

    /// Single indexed read on the hot verification path.
    async fn is_revoked(&self, jti: Uuid) -> Result<bool>;

    /// Drop rows past their expiry. Returns the number removed.
    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64>;
}

/// The credential store: one bundle of repository handles injected into the
/// authentication service and background tasks.
#[derive(Clone)]
pub struct CredentialStore {
    pub domains: Arc<dyn DomainRepository>,
    pub users: Arc<dyn UserRepository>,
    pub refresh_tokens: Arc<dyn RefreshTokenRepository>,
    pub revoked_tokens: Arc<dyn RevokedTokenRepository>,
}

impl std::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialStore").finish_non_exhaustive()
    }
}

impl CredentialStore {
    /// Wire every port to its PostgreSQL implementation over a shared pool.
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            domains: Arc::new(PostgresDomainRepository::new(pool.clone())),
            users: Arc::new(PostgresUserRepository::new(pool.clone())),
            refresh_tokens: Arc::new(PostgresRefreshTokenRepository::new(pool.clone())),
            revoked_tokens: Arc::new(PostgresRevokedTokenRepository::new(pool)),
        }
    }
}
