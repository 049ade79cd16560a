//! Test harness: an in-memory credential store behind the repository ports,
//! wired into the real router so the HTTP surface is exercised end to end
//! without PostgreSQL.

// Shared by multiple test binaries; not every helper is used in each.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::Result;
use argon2::ParamsBuilder;
use async_trait::async_trait;
use axum_test::TestServer;
use chrono::{DateTime, Utc};
use serde_json::{Value, json};
use uuid::Uuid;

use gatehouse_core::crypto::PasswordCrypto;
use gatehouse_core::model::{
    ActiveSession, ConsumedRefreshToken, DomainRecord, NewUser, RoleRecord, UserChange,
    UserDetails, UserRecord,
};
use gatehouse_core::service::AuthenticationService;
use gatehouse_core::store::{
    CredentialStore, DomainRepository, RefreshTokenRepository, RevokedTokenRepository,
    UserRepository, seed,
};
use gatehouse_core::token::TokenCodec;
use gatehouse_core::{AuthError, Result as AuthResult};
use gatehouse_server::{infra::app_state::AppState, routes::build_router};

pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const ADMIN_PASSWORD: &str = "admin";
pub const SEED_DOMAIN: &str = "example.com";

#[derive(Debug, Clone)]
struct RefreshRow {
    username: String,
    issued_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct Inner {
    domains: Vec<DomainRecord>,
    roles: Vec<RoleRecord>,
    users: Vec<UserRecord>,
    user_roles: Vec<(Uuid, Uuid)>,
    refresh_tokens: HashMap<String, RefreshRow>,
    revoked: HashMap<Uuid, DateTime<Utc>>,
}

/// Implements every repository port over one mutex, mirroring the database
/// semantics the service relies on: unique names, nulling users on domain
/// delete, cascading user deletes into token rows, and single-use refresh
/// consumption.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().expect("store mutex")
    }
}

#[async_trait]
impl DomainRepository for MemoryStore {
    async fn insert(&self, name: &str) -> AuthResult<DomainRecord> {
        let mut inner = self.lock();
        if inner.domains.iter().any(|d| d.name == name) {
            return Err(AuthError::conflict(format!(
                "domain '{name}' already exists"
            )));
        }
        let record = DomainRecord {
            id: Uuid::now_v7(),
            name: name.to_string(),
        };
        inner.domains.push(record.clone());
        Ok(record)
    }

    async fn ensure(&self, name: &str) -> AuthResult<DomainRecord> {
        {
            let inner = self.lock();
            if let Some(existing) = inner.domains.iter().find(|d| d.name == name) {
                return Ok(existing.clone());
            }
        }
        DomainRepository::insert(self, name).await
    }

    async fn find_by_name(&self, name: &str) -> AuthResult<Option<DomainRecord>> {
        let inner = self.lock();
        Ok(inner.domains.iter().find(|d| d.name == name).cloned())
    }

    async fn list(&self) -> AuthResult<Vec<DomainRecord>> {
        let mut domains = self.lock().domains.clone();
        domains.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(domains)
    }

    async fn rename(&self, old: &str, new: &str) -> AuthResult<DomainRecord> {
        let mut inner = self.lock();
        if !inner.domains.iter().any(|d| d.name == old) {
            return Err(AuthError::not_found(format!("domain '{old}'")));
        }
        if old != new && inner.domains.iter().any(|d| d.name == new) {
            return Err(AuthError::conflict(format!("domain '{new}' already exists")));
        }
        let Some(domain) = inner.domains.iter_mut().find(|d| d.name == old) else {
            return Err(AuthError::not_found(format!("domain '{old}'")));
        };
        domain.name = new.to_string();
        Ok(domain.clone())
    }

    async fn delete(&self, name: &str) -> AuthResult<bool> {
        let mut inner = self.lock();
        let Some(position) = inner.domains.iter().position(|d| d.name == name) else {
            return Ok(false);
        };
        let removed = inner.domains.remove(position);
        for user in &mut inner.users {
            if user.domain_id == Some(removed.id) {
                user.domain_id = None;
            }
        }
        Ok(true)
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn insert(&self, user: NewUser) -> AuthResult<UserRecord> {
        let mut inner = self.lock();
        if inner.users.iter().any(|u| u.username == user.username) {
            return Err(AuthError::conflict(format!(
                "user '{}' already exists",
                user.username
            )));
        }
        let record = UserRecord {
            id: Uuid::now_v7(),
            username: user.username,
            password_hash: user.password_hash,
            domain_id: user.domain_id,
        };
        inner.users.push(record.clone());
        Ok(record)
    }

    async fn find_by_username(&self, username: &str) -> AuthResult<Option<UserRecord>> {
        let inner = self.lock();
        Ok(inner.users.iter().find(|u| u.username == username).cloned())
    }

    async fn find_by_username_in_domain(
        &self,
        username: &str,
        domain: &str,
    ) -> AuthResult<Option<UserRecord>> {
        let inner = self.lock();
        let Some(domain_id) = inner.domains.iter().find(|d| d.name == domain).map(|d| d.id) else {
            return Ok(None);
        };
        Ok(inner
            .users
            .iter()
            .find(|u| u.username == username && u.domain_id == Some(domain_id))
            .cloned())
    }

    async fn list_details(&self) -> AuthResult<Vec<UserDetails>> {
        let inner = self.lock();
        let mut details: Vec<UserDetails> = inner
            .users
            .iter()
            .map(|user| details_of(&inner, user))
            .collect();
        details.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(details)
    }

    async fn find_details(&self, username: &str) -> AuthResult<Option<UserDetails>> {
        let inner = self.lock();
        Ok(inner
            .users
            .iter()
            .find(|u| u.username == username)
            .map(|user| details_of(&inner, user)))
    }

    async fn roles_of(&self, user_id: Uuid) -> AuthResult<Vec<String>> {
        let inner = self.lock();
        Ok(role_names_of(&inner, user_id))
    }

    async fn ensure_role(&self, name: &str) -> AuthResult<RoleRecord> {
        let mut inner = self.lock();
        if let Some(existing) = inner.roles.iter().find(|r| r.name == name) {
            return Ok(existing.clone());
        }
        let record = RoleRecord {
            id: Uuid::now_v7(),
            name: name.to_string(),
        };
        inner.roles.push(record.clone());
        Ok(record)
    }

    async fn assign_role(&self, user_id: Uuid, role_id: Uuid) -> AuthResult<()> {
        let mut inner = self.lock();
        if !inner.user_roles.contains(&(user_id, role_id)) {
            inner.user_roles.push((user_id, role_id));
        }
        Ok(())
    }

    async fn replace_roles(&self, user_id: Uuid, roles: &[String]) -> AuthResult<()> {
        let mut inner = self.lock();
        inner.user_roles.retain(|(uid, _)| *uid != user_id);
        for name in roles {
            let role_id = match inner.roles.iter().find(|r| &r.name == name) {
                Some(role) => role.id,
                None => {
                    let record = RoleRecord {
                        id: Uuid::now_v7(),
                        name: name.clone(),
                    };
                    let id = record.id;
                    inner.roles.push(record);
                    id
                }
            };
            if !inner.user_roles.contains(&(user_id, role_id)) {
                inner.user_roles.push((user_id, role_id));
            }
        }
        Ok(())
    }

    async fn update(&self, username: &str, change: UserChange) -> AuthResult<bool> {
        let mut inner = self.lock();
        let Some(position) = inner.users.iter().position(|u| u.username == username) else {
            return Ok(false);
        };
        if let Some(new_name) = change.username.as_deref() {
            if new_name != username
                && inner.users.iter().any(|u| u.username == new_name)
            {
                return Err(AuthError::conflict("username already taken".to_string()));
            }
        }
        {
            let user = &mut inner.users[position];
            if let Some(new_name) = change.username.clone() {
                user.username = new_name;
            }
            if let Some(hash) = change.password_hash {
                user.password_hash = hash;
            }
        }
        // Refresh rows follow a rename, as the FK cascade does in Postgres.
        if let Some(new_name) = change.username {
            if new_name != username {
                for row in inner.refresh_tokens.values_mut() {
                    if row.username == username {
                        row.username = new_name.clone();
                    }
                }
            }
        }
        Ok(true)
    }

    async fn delete(&self, username: &str) -> AuthResult<bool> {
        let mut inner = self.lock();
        let Some(position) = inner.users.iter().position(|u| u.username == username) else {
            return Ok(false);
        };
        let removed = inner.users.remove(position);
        inner.user_roles.retain(|(uid, _)| *uid != removed.id);
        inner.refresh_tokens.retain(|_, row| row.username != username);
        Ok(true)
    }
}

#[async_trait]
impl RefreshTokenRepository for MemoryStore {
    async fn insert(
        &self,
        token: &str,
        username: &str,
        issued_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> AuthResult<()> {
        let mut inner = self.lock();
        inner.refresh_tokens.insert(
            token.to_string(),
            RefreshRow {
                username: username.to_string(),
                issued_at,
                expires_at,
            },
        );
        Ok(())
    }

    async fn consume(&self, token: &str) -> AuthResult<Option<ConsumedRefreshToken>> {
        let mut inner = self.lock();
        Ok(inner
            .refresh_tokens
            .remove(token)
            .map(|row| ConsumedRefreshToken {
                username: row.username,
                expires_at: row.expires_at,
            }))
    }

    async fn delete(&self, token: &str) -> AuthResult<bool> {
        let mut inner = self.lock();
        Ok(inner.refresh_tokens.remove(token).is_some())
    }

    async fn active(&self, now: DateTime<Utc>) -> AuthResult<Vec<ActiveSession>> {
        let inner = self.lock();
        let mut sessions: Vec<ActiveSession> = inner
            .refresh_tokens
            .values()
            .filter(|row| row.expires_at > now)
            .map(|row| ActiveSession {
                username: row.username.clone(),
                logged_in_at: row.issued_at,
                expires_at: row.expires_at,
            })
            .collect();
        sessions.sort_by(|a, b| b.logged_in_at.cmp(&a.logged_in_at));
        Ok(sessions)
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> AuthResult<u64> {
        let mut inner = self.lock();
        let before = inner.refresh_tokens.len();
        inner.refresh_tokens.retain(|_, row| row.expires_at > now);
        Ok((before - inner.refresh_tokens.len()) as u64)
    }
}

#[async_trait]
impl RevokedTokenRepository for MemoryStore {
    async fn insert(&self, jti: Uuid, expires_at: DateTime<Utc>) -> AuthResult<()> {
        let mut inner = self.lock();
        inner.revoked.entry(jti).or_insert(expires_at);
        Ok(())
    }

    async fn is_revoked(&self, jti: Uuid) -> AuthResult<bool> {
        let inner = self.lock();
        Ok(inner.revoked.contains_key(&jti))
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> AuthResult<u64> {
        let mut inner = self.lock();
        let before = inner.revoked.len();
        inner.revoked.retain(|_, expires_at| *expires_at > now);
        Ok((before - inner.revoked.len()) as u64)
    }
}

fn details_of(inner: &Inner, user: &UserRecord) -> UserDetails {
    let domain = user
        .domain_id
        .and_then(|id| inner.domains.iter().find(|d| d.id == id))
        .map(|d| d.name.clone());
    UserDetails {
        id: user.id,
        username: user.username.clone(),
        domain,
        roles: role_names_of(inner, user.id),
    }
}

fn role_names_of(inner: &Inner, user_id: Uuid) -> Vec<String> {
    let mut names: Vec<String> = inner
        .user_roles
        .iter()
        .filter(|(uid, _)| *uid == user_id)
        .filter_map(|(_, rid)| inner.roles.iter().find(|r| r.id == *rid))
        .map(|r| r.name.clone())
        .collect();
    names.sort();
    names
}

/// Every port backed by the same in-memory store.
pub fn memory_store() -> CredentialStore {
    let shared = Arc::new(MemoryStore::default());
    CredentialStore {
        domains: shared.clone(),
        users: shared.clone(),
        refresh_tokens: shared.clone(),
        revoked_tokens: shared,
    }
}

/// Cheap Argon2 parameters keep the suite fast; production uses the
/// defaults in `PasswordCrypto::new`.
pub fn test_crypto() -> PasswordCrypto {
    let params = ParamsBuilder::new()
        .m_cost(1024)
        .t_cost(1)
        .p_cost(1)
        .output_len(32)
        .build()
        .expect("test params");
    PasswordCrypto::with_params("integration-pepper", params).expect("crypto")
}

/// Seeded server over the in-memory store: one `example.com` domain and an
/// `admin` account holding the `user` and `admin` roles.
pub async fn build_test_server() -> Result<TestServer> {
    let store = memory_store();
    seed(&store, &test_crypto(), ADMIN_EMAIL, ADMIN_PASSWORD).await?;

    let codec = TokenCodec::new("integration-test-secret");
    let auth = AuthenticationService::new(store.clone(), codec, test_crypto());
    let state = AppState::new(Arc::new(auth));

    TestServer::new(build_router(state))
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}

fn token_field(body: &Value, key: &str) -> String {
    body[key]
        .as_str()
        .unwrap_or_else(|| panic!("missing token field: {key}"))
        .to_string()
}

/// Register an account in the seeded domain.
pub async fn register(server: &TestServer, username: &str, password: &str) {
    let response = server
        .post("/register")
        .json(&json!({
            "username": username,
            "password": password,
            "domain": SEED_DOMAIN,
        }))
        .await;
    response.assert_status_ok();
}

/// Log in and return the `(access_token, refresh_token)` pair.
pub async fn login(server: &TestServer, username: &str, password: &str) -> (String, String) {
    let response = server
        .post("/login")
        .json(&json!({"username": username, "password": password}))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    (
        token_field(&body, "access_token"),
        token_field(&body, "refresh_token"),
    )
}

/// Access token for the seeded admin account.
pub async fn admin_token(server: &TestServer) -> String {
    login(server, "admin", ADMIN_PASSWORD).await.0
}
