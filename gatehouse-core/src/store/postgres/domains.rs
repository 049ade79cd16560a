use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::error::{AuthError, Result};
use crate::model::DomainRecord;
use crate::store::ports::DomainRepository;

#[derive(Debug, Clone)]
pub struct PostgresDomainRepository {
    pool: PgPool,
}

impl PostgresDomainRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn map_row(row: &PgRow) -> Result<DomainRecord> {
        let id: Uuid = row
            .try_get("id")
            .map_err(|e| AuthError::Internal(format!("failed to read domain id: {e}")))?;
        let name: String = row
            .try_get("name")
            .map_err(|e| AuthError::Internal(format!("failed to read domain name: {e}")))?;

        Ok(DomainRecord { id, name })
    }
}

#[async_trait]
impl DomainRepository for PostgresDomainRepository {
    async fn insert(&self, name: &str) -> Result<DomainRecord> {
        let result = sqlx::query(
            r#"
            INSERT INTO domains (id, name)
            VALUES ($1, $2)
            RETURNING id, name
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(name)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(row) => Self::map_row(&row),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => Err(
                AuthError::conflict(format!("domain '{name}' already exists")),
            ),
            Err(err) => Err(err.into()),
        }
    }

    async fn ensure(&self, name: &str) -> Result<DomainRecord> {
        // The no-op update turns ON CONFLICT into an upsert so RETURNING
        // always yields the row, fresh or pre-existing.
        let row = sqlx::query(
            r#"
            INSERT INTO domains (id, name)
            VALUES ($1, $2)
            ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
            RETURNING id, name
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(name)
        .fetch_one(&self.pool)
        .await?;

        Self::map_row(&row)
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<DomainRecord>> {
        let row = sqlx::query(
            r#"
            SELECT id, name
            FROM domains
            WHERE name = $1
            "#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::map_row).transpose()
    }

    async fn list(&self) -> Result<Vec<DomainRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT id, name
            FROM domains
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::map_row).collect()
    }

    async fn rename(&self, old: &str, new: &str) -> Result<DomainRecord> {
        let result = sqlx::query(
            r#"
            UPDATE domains
            SET name = $2
            WHERE name = $1
            RETURNING id, name
            "#,
        )
        .bind(old)
        .bind(new)
        .fetch_optional(&self.pool)
        .await;

        match result {
            Ok(Some(row)) => Self::map_row(&row),
            Ok(None) => Err(AuthError::not_found(format!("domain '{old}'"))),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(AuthError::conflict(format!("domain '{new}' already exists")))
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn delete(&self, name: &str) -> Result<bool> {
        // Users referencing the domain are nulled by the FK, not deleted.
        let result = sqlx::query(
            r#"
            DELETE FROM domains
            WHERE name = $1
            "#,
        )
        .bind(name)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}
