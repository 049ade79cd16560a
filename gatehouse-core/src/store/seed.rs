//! First-run provisioning of the administrator account.

use tracing::{debug, info};

use crate::crypto::PasswordCrypto;
use crate::error::{AuthError, Result};
use crate::model::{ADMIN_ROLE, NewUser, USER_ROLE};
use crate::store::ports::CredentialStore;

/// Whether seeding created the administrator or found it already present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedOutcome {
    Created,
    Existing,
}

/// Provision the bootstrap administrator from the configured email and
/// password. Safe to run on every startup: the domain and roles are
/// upserted and an existing admin user is left untouched.
pub async fn seed(
    store: &CredentialStore,
    crypto: &PasswordCrypto,
    admin_email: &str,
    admin_password: &str,
) -> Result<SeedOutcome> {
    let (username, domain) = match admin_email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => (local, Some(domain)),
        _ => (admin_email, None),
    };

    let domain_id = match domain {
        Some(name) => Some(store.domains.ensure(name).await?.id),
        None => None,
    };

    let user_role = store.users.ensure_role(USER_ROLE).await?;
    let admin_role = store.users.ensure_role(ADMIN_ROLE).await?;

    if let Some(existing) = store.users.find_by_username(username).await? {
        debug!(username, user_id = %existing.id, "administrator already provisioned");
        return Ok(SeedOutcome::Existing);
    }

    let password_hash = crypto.hash_password(admin_password)?;
    let created = match store
        .users
        .insert(NewUser {
            username: username.to_string(),
            password_hash,
            domain_id,
        })
        .await
    {
        Ok(user) => user,
        // Another replica won the race; nothing left to do.
        Err(AuthError::Conflict(_)) => return Ok(SeedOutcome::Existing),
        Err(err) => return Err(err),
    };

    store.users.assign_role(created.id, user_role.id).await?;
    store.users.assign_role(created.id, admin_role.id).await?;

    info!(username, user_id = %created.id, "provisioned administrator account");
    Ok(SeedOutcome::Created)
}
