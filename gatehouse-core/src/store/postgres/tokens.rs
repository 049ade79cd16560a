use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::error::{AuthError, Result};
use crate::model::{ActiveSession, ConsumedRefreshToken};
use crate::store::ports::{RefreshTokenRepository, RevokedTokenRepository};

#[derive(Debug, Clone)]
pub struct PostgresRefreshTokenRepository {
    pool: PgPool,
}

impl PostgresRefreshTokenRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn map_consumed(row: &PgRow) -> Result<ConsumedRefreshToken> {
        let username: String = row
            .try_get("username")
            .map_err(|e| AuthError::Internal(format!("failed to read username: {e}")))?;
        let expires_at: DateTime<Utc> = row
            .try_get("expires_at")
            .map_err(|e| AuthError::Internal(format!("failed to read expiry: {e}")))?;

        Ok(ConsumedRefreshToken {
            username,
            expires_at,
        })
    }

    fn map_session(row: &PgRow) -> Result<ActiveSession> {
        let username: String = row
            .try_get("username")
            .map_err(|e| AuthError::Internal(format!("failed to read username: {e}")))?;
        let logged_in_at: DateTime<Utc> = row
            .try_get("issued_at")
            .map_err(|e| AuthError::Internal(format!("failed to read issue time: {e}")))?;
        let expires_at: DateTime<Utc> = row
            .try_get("expires_at")
            .map_err(|e| AuthError::Internal(format!("failed to read expiry: {e}")))?;

        Ok(ActiveSession {
            username,
            logged_in_at,
            expires_at,
        })
    }
}

#[async_trait]
impl RefreshTokenRepository for PostgresRefreshTokenRepository {
    async fn insert(
        &self,
        token: &str,
        username: &str,
        issued_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO refresh_tokens (token, username, issued_at, expires_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(token)
        .bind(username)
        .bind(issued_at)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn consume(&self, token: &str) -> Result<Option<ConsumedRefreshToken>> {
        // Delete-with-returning makes consumption atomic: concurrent callers
        // race on the row and exactly one sees it.
        let row = sqlx::query(
            r#"
            DELETE FROM refresh_tokens
            WHERE token = $1
            RETURNING username, expires_at
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::map_consumed).transpose()
    }

    async fn delete(&self, token: &str) -> Result<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM refresh_tokens
            WHERE token = $1
            "#,
        )
        .bind(token)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn active(&self, now: DateTime<Utc>) -> Result<Vec<ActiveSession>> {
        let rows = sqlx::query(
            r#"
            SELECT username, issued_at, expires_at
            FROM refresh_tokens
            WHERE expires_at > $1
            ORDER BY issued_at DESC
            "#,
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::map_session).collect()
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM refresh_tokens
            WHERE expires_at <= $1
            "#,
        )
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}

#[derive(Debug, Clone)]
pub struct PostgresRevokedTokenRepository {
    pool: PgPool,
}

impl PostgresRevokedTokenRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RevokedTokenRepository for PostgresRevokedTokenRepository {
    async fn insert(&self, jti: Uuid, expires_at: DateTime<Utc>) -> Result<()> {
        // Revoking twice is a no-op, not an error.
        sqlx::query(
            r#"
            INSERT INTO revoked_tokens (jti, expires_at)
            VALUES ($1, $2)
            ON CONFLICT (jti) DO NOTHING
            "#,
        )
        .bind(jti)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn is_revoked(&self, jti: Uuid) -> Result<bool> {
        let row = sqlx::query(
            r#"
            SELECT EXISTS(SELECT 1 FROM revoked_tokens WHERE jti = $1) AS revoked
            "#,
        )
        .bind(jti)
        .fetch_one(&self.pool)
        .await?;

        row.try_get("revoked")
            .map_err(|e| AuthError::Internal(format!("failed to read revocation flag: {e}")))
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM revoked_tokens
            WHERE expires_at <= $1
            "#,
        )
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
