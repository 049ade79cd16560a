//! The authentication service: registration, login, token verification,
//! refresh rotation, revocation, and the admin operations over domains,
//! users, and sessions.

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use crate::api_types::{
    BEARER_TOKEN_TYPE, LoginResponse, RegisterRequest, RevokeRequest, RevokeResponse,
    UserUpdateRequest,
};
use crate::crypto::PasswordCrypto;
use crate::error::{AuthError, Result};
use crate::model::{
    ActiveSession, DomainRecord, NewUser, USER_ROLE, UserChange, UserDetails, VerifiedIdentity,
};
use crate::store::ports::CredentialStore;
use crate::token::{ACCESS_TOKEN_TTL_SECS, REFRESH_TOKEN_TTL_SECS, TokenCodec};
use crate::token::{TokenError, generate_refresh_token};

/// Application service in front of the credential store. Handlers own one
/// behind an `Arc` and call it per request; every method is `&self`.
#[derive(Debug)]
pub struct AuthenticationService {
    store: CredentialStore,
    codec: TokenCodec,
    crypto: PasswordCrypto,
}

impl AuthenticationService {
    pub fn new(store: CredentialStore, codec: TokenCodec, crypto: PasswordCrypto) -> Self {
        Self {
            store,
            codec,
            crypto,
        }
    }

    /// Create an account in an existing domain. The `user` role is always
    /// granted; any extra roles in the request are created on demand.
    pub async fn register(&self, request: RegisterRequest) -> Result<()> {
        if request.username.is_empty() || request.username.contains('@') {
            return Err(AuthError::BadRequest(
                "username must be non-empty and must not contain '@'".to_string(),
            ));
        }
        if request.password.is_empty() {
            return Err(AuthError::BadRequest("password must not be empty".to_string()));
        }

        let domain = self
            .store
            .domains
            .find_by_name(&request.domain)
            .await?
            .ok_or_else(|| AuthError::not_found(format!("domain '{}'", request.domain)))?;

        let password_hash = self.crypto.hash_password(&request.password)?;
        let user = self
            .store
            .users
            .insert(NewUser {
                username: request.username,
                password_hash,
                domain_id: Some(domain.id),
            })
            .await?;

        let base_role = self.store.users.ensure_role(USER_ROLE).await?;
        self.store.users.assign_role(user.id, base_role.id).await?;
        for role in &request.roles {
            if role == USER_ROLE {
                continue;
            }
            let extra = self.store.users.ensure_role(role).await?;
            self.store.users.assign_role(user.id, extra.id).await?;
        }

        info!(username = %user.username, domain = %domain.name, "registered new account");
        Ok(())
    }

    /// Authenticate by username or `local@domain` email form and mint a
    /// fresh access/refresh pair. Misses and bad passwords are deliberately
    /// indistinguishable to the caller.
    pub async fn login(&self, identifier: &str, password: &str) -> Result<LoginResponse> {
        let user = self
            .resolve_user(identifier)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !self.crypto.verify_password(password, &user.password_hash)? {
            return Err(AuthError::InvalidCredentials);
        }

        let roles = self.store.users.roles_of(user.id).await?;
        self.issue_pair(&user.username, &roles).await
    }

    /// Check an access token: signature, expiry, then the revocation list.
    /// A revoked token fails with a distinct message so clients can tell a
    /// logout from an expiry.
    pub async fn verify(&self, token: &str) -> Result<VerifiedIdentity> {
        let claims = self.codec.decode(token)?;

        if self.store.revoked_tokens.is_revoked(claims.jti).await? {
            debug!(jti = %claims.jti, "rejected revoked access token");
            return Err(AuthError::LoggedOut);
        }

        Ok(VerifiedIdentity {
            username: claims.username,
            roles: claims.roles,
        })
    }

    /// Exchange a refresh token for a new pair. Consumption is atomic, so a
    /// replayed token finds no row and fails; an expired row is consumed and
    /// rejected in the same breath.
    pub async fn refresh(&self, refresh_token: &str) -> Result<LoginResponse> {
        let consumed = self
            .store
            .refresh_tokens
            .consume(refresh_token)
            .await?
            .ok_or_else(|| AuthError::unauthorized("refresh token is not recognized"))?;

        if consumed.expires_at <= Utc::now() {
            return Err(AuthError::unauthorized("refresh token has expired"));
        }

        let user = self
            .store
            .users
            .find_by_username(&consumed.username)
            .await?
            .ok_or_else(|| AuthError::unauthorized("account no longer exists"))?;

        let roles = self.store.users.roles_of(user.id).await?;
        self.issue_pair(&user.username, &roles).await
    }

    /// Revoke a token. Resolution order: an explicit `jti`, then a `token`
    /// field (access token first, refresh token as fallback), then the
    /// bearer token the caller authenticated with. Revoking an
    /// already-revoked token succeeds again.
    pub async fn revoke(
        &self,
        request: RevokeRequest,
        bearer_token: Option<&str>,
    ) -> Result<RevokeResponse> {
        if let Some(raw) = request.jti.as_deref() {
            let jti = Uuid::parse_str(raw)
                .map_err(|_| AuthError::BadRequest("jti is not a valid UUID".to_string()))?;
            // The real expiry is unknown for a bare id; hold it for one
            // access-token lifetime, after which expiry rejects it anyway.
            let horizon = Utc::now() + Duration::seconds(ACCESS_TOKEN_TTL_SECS);
            self.store.revoked_tokens.insert(jti, horizon).await?;
            info!(%jti, "revoked access token by id");
            return Ok(RevokeResponse::revoked(Some(jti)));
        }

        if let Some(token) = request.token.as_deref() {
            return self.revoke_presented_token(token).await;
        }

        let bearer = bearer_token.ok_or_else(|| {
            AuthError::BadRequest("no token to revoke: supply jti or token".to_string())
        })?;
        self.revoke_access_token(bearer).await
    }

    async fn revoke_presented_token(&self, token: &str) -> Result<RevokeResponse> {
        match self.codec.decode_allow_expired(token) {
            Ok(_) => self.revoke_access_token(token).await,
            // Not one of ours as an access token; it may be a refresh token.
            Err(TokenError::Malformed | TokenError::BadSignature) => {
                if self.store.refresh_tokens.delete(token).await? {
                    info!("revoked refresh token");
                    Ok(RevokeResponse::revoked(None))
                } else {
                    Err(AuthError::BadRequest(
                        "token is neither a live refresh token nor a valid access token"
                            .to_string(),
                    ))
                }
            }
            Err(err) => Err(err.into()),
        }
    }

    /// List live sessions, one per non-expired refresh token.
    pub async fn active_sessions(&self) -> Result<Vec<ActiveSession>> {
        self.store.refresh_tokens.active(Utc::now()).await
    }

    pub async fn create_domain(&self, name: &str) -> Result<DomainRecord> {
        if name.is_empty() {
            return Err(AuthError::BadRequest("domain name must not be empty".to_string()));
        }
        self.store.domains.insert(name).await
    }

    pub async fn list_domains(&self) -> Result<Vec<DomainRecord>> {
        self.store.domains.list().await
    }

    pub async fn rename_domain(&self, old: &str, new: &str) -> Result<DomainRecord> {
        if new.is_empty() {
            return Err(AuthError::BadRequest("domain name must not be empty".to_string()));
        }
        self.store.domains.rename(old, new).await
    }

    pub async fn delete_domain(&self, name: &str) -> Result<()> {
        if !self.store.domains.delete(name).await? {
            return Err(AuthError::not_found(format!("domain '{name}'")));
        }
        Ok(())
    }

    pub async fn list_users(&self) -> Result<Vec<UserDetails>> {
        self.store.users.list_details().await
    }

    pub async fn get_user(&self, username: &str) -> Result<UserDetails> {
        self.store
            .users
            .find_details(username)
            .await?
            .ok_or_else(|| AuthError::not_found(format!("user '{username}'")))
    }

    /// Apply a partial admin edit: username, password, roles, in any
    /// combination. Roles are replaced wholesale when present.
    pub async fn update_user(
        &self,
        username: &str,
        request: UserUpdateRequest,
    ) -> Result<UserDetails> {
        if request.username.is_none() && request.password.is_none() && request.roles.is_none() {
            return Err(AuthError::BadRequest("nothing to update".to_string()));
        }
        if let Some(new_name) = request.username.as_deref() {
            if new_name.is_empty() || new_name.contains('@') {
                return Err(AuthError::BadRequest(
                    "username must be non-empty and must not contain '@'".to_string(),
                ));
            }
        }

        let user = self
            .store
            .users
            .find_by_username(username)
            .await?
            .ok_or_else(|| AuthError::not_found(format!("user '{username}'")))?;

        let password_hash = match request.password.as_deref() {
            Some(password) if password.is_empty() => {
                return Err(AuthError::BadRequest("password must not be empty".to_string()));
            }
            Some(password) => Some(self.crypto.hash_password(password)?),
            None => None,
        };

        if request.username.is_some() || password_hash.is_some() {
            let touched = self
                .store
                .users
                .update(
                    username,
                    UserChange {
                        username: request.username.clone(),
                        password_hash,
                    },
                )
                .await?;
            if !touched {
                return Err(AuthError::not_found(format!("user '{username}'")));
            }
        }

        if let Some(roles) = request.roles.as_deref() {
            self.store.users.replace_roles(user.id, roles).await?;
        }

        let current_name = request.username.as_deref().unwrap_or(username);
        self.get_user(current_name).await
    }

    pub async fn delete_user(&self, username: &str) -> Result<()> {
        if !self.store.users.delete(username).await? {
            return Err(AuthError::not_found(format!("user '{username}'")));
        }
        info!(username, "deleted account");
        Ok(())
    }

    /// Resolve a login identifier. A plain username is looked up directly.
    /// An email form is first tried as a bare local part, because usernames
    /// are globally unique; only on a miss does the domain narrow the
    /// search.
    async fn resolve_user(
        &self,
        identifier: &str,
    ) -> Result<Option<crate::model::UserRecord>> {
        let Some((local, domain)) = split_identifier(identifier) else {
            return self.store.users.find_by_username(identifier).await;
        };

        if let Some(user) = self.store.users.find_by_username(local).await? {
            return Ok(Some(user));
        }
        self.store.users.find_by_username_in_domain(local, domain).await
    }

    async fn issue_pair(&self, username: &str, roles: &[String]) -> Result<LoginResponse> {
        let issued = self.codec.encode(username, roles)?;

        let refresh_token = generate_refresh_token();
        let now = Utc::now();
        self.store
            .refresh_tokens
            .insert(
                &refresh_token,
                username,
                now,
                now + Duration::seconds(REFRESH_TOKEN_TTL_SECS),
            )
            .await?;

        Ok(LoginResponse {
            access_token: issued.token,
            refresh_token,
            token_type: BEARER_TOKEN_TYPE.to_string(),
        })
    }

    async fn revoke_access_token(&self, token: &str) -> Result<RevokeResponse> {
        // Expired is fine here: revoking an expired token is a harmless
        // no-op and the deny-list entry ages out with it.
        let claims = self.codec.decode_allow_expired(token)?;
        let expires_at = DateTime::<Utc>::from_timestamp(claims.exp, 0)
            .unwrap_or_else(|| Utc::now() + Duration::seconds(ACCESS_TOKEN_TTL_SECS));

        self.store.revoked_tokens.insert(claims.jti, expires_at).await?;
        info!(jti = %claims.jti, username = %claims.username, "revoked access token");
        Ok(RevokeResponse::revoked(Some(claims.jti)))
    }
}

/// Split `local@domain` into its parts. Returns `None` for identifiers
/// without an `@` or with an empty side, which are treated as plain
/// usernames.
fn split_identifier(identifier: &str) -> Option<(&str, &str)> {
    match identifier.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Some((local, domain)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_identifiers_split_at_the_first_at_sign() {
        assert_eq!(
            split_identifier("alice@corp.example"),
            Some(("alice", "corp.example"))
        );
        assert_eq!(
            split_identifier("alice@b@c"),
            Some(("alice", "b@c")),
            "everything after the first @ is the domain"
        );
    }

    #[test]
    fn plain_and_degenerate_identifiers_are_usernames() {
        assert_eq!(split_identifier("alice"), None);
        assert_eq!(split_identifier("@corp.example"), None);
        assert_eq!(split_identifier("alice@"), None);
        assert_eq!(split_identifier(""), None);
    }
}
