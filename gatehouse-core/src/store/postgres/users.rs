use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::error::{AuthError, Result};
use crate::model::{NewUser, RoleRecord, UserChange, UserDetails, UserRecord};
use crate::store::ports::UserRepository;

#[derive(Debug, Clone)]
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn map_row(row: &PgRow) -> Result<UserRecord> {
        let id: Uuid = row
            .try_get("id")
            .map_err(|e| AuthError::Internal(format!("failed to read user id: {e}")))?;
        let username: String = row
            .try_get("username")
            .map_err(|e| AuthError::Internal(format!("failed to read username: {e}")))?;
        let password_hash: String = row
            .try_get("password_hash")
            .map_err(|e| AuthError::Internal(format!("failed to read password hash: {e}")))?;
        let domain_id: Option<Uuid> = row
            .try_get("domain_id")
            .map_err(|e| AuthError::Internal(format!("failed to read domain id: {e}")))?;

        Ok(UserRecord {
            id,
            username,
            password_hash,
            domain_id,
        })
    }

    fn map_details(row: &PgRow) -> Result<UserDetails> {
        let id: Uuid = row
            .try_get("id")
            .map_err(|e| AuthError::Internal(format!("failed to read user id: {e}")))?;
        let username: String = row
            .try_get("username")
            .map_err(|e| AuthError::Internal(format!("failed to read username: {e}")))?;
        let domain: Option<String> = row
            .try_get("domain")
            .map_err(|e| AuthError::Internal(format!("failed to read domain name: {e}")))?;
        let roles: Vec<String> = row
            .try_get("roles")
            .map_err(|e| AuthError::Internal(format!("failed to read roles: {e}")))?;

        Ok(UserDetails {
            id,
            username,
            domain,
            roles,
        })
    }

    fn map_role(row: &PgRow) -> Result<RoleRecord> {
        let id: Uuid = row
            .try_get("id")
            .map_err(|e| AuthError::Internal(format!("failed to read role id: {e}")))?;
        let name: String = row
            .try_get("name")
            .map_err(|e| AuthError::Internal(format!("failed to read role name: {e}")))?;

        Ok(RoleRecord { id, name })
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn insert(&self, user: NewUser) -> Result<UserRecord> {
        let result = sqlx::query(
            r#"
            INSERT INTO users (id, username, password_hash, domain_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id, username, password_hash, domain_id
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(user.domain_id)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(row) => Self::map_row(&row),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => Err(
                AuthError::conflict(format!("user '{}' already exists", user.username)),
            ),
            Err(err) => Err(err.into()),
        }
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>> {
        let row = sqlx::query(
            r#"
            SELECT id, username, password_hash, domain_id
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::map_row).transpose()
    }

    async fn find_by_username_in_domain(
        &self,
        username: &str,
        domain: &str,
    ) -> Result<Option<UserRecord>> {
        let row = sqlx::query(
            r#"
            SELECT u.id, u.username, u.password_hash, u.domain_id
            FROM users u
            JOIN domains d ON d.id = u.domain_id
            WHERE u.username = $1 AND d.name = $2
            "#,
        )
        .bind(username)
        .bind(domain)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::map_row).transpose()
    }

    async fn list_details(&self) -> Result<Vec<UserDetails>> {
        let rows = sqlx::query(
            r#"
            SELECT u.id, u.username, d.name AS domain,
                   array_remove(array_agg(r.name ORDER BY r.name), NULL) AS roles
            FROM users u
            LEFT JOIN domains d ON d.id = u.domain_id
            LEFT JOIN user_roles ur ON ur.user_id = u.id
            LEFT JOIN roles r ON r.id = ur.role_id
            GROUP BY u.id, u.username, d.name
            ORDER BY u.username
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::map_details).collect()
    }

    async fn find_details(&self, username: &str) -> Result<Option<UserDetails>> {
        let row = sqlx::query(
            r#"
            SELECT u.id, u.username, d.name AS domain,
                   array_remove(array_agg(r.name ORDER BY r.name), NULL) AS roles
            FROM users u
            LEFT JOIN domains d ON d.id = u.domain_id
            LEFT JOIN user_roles ur ON ur.user_id = u.id
            LEFT JOIN roles r ON r.id = ur.role_id
            WHERE u.username = $1
            GROUP BY u.id, u.username, d.name
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::map_details).transpose()
    }

    async fn roles_of(&self, user_id: Uuid) -> Result<Vec<String>> {
        let rows = sqlx::query(
            r#"
            SELECT r.name
            FROM roles r
            JOIN user_roles ur ON ur.role_id = r.id
            WHERE ur.user_id = $1
            ORDER BY r.name
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                row.try_get("name")
                    .map_err(|e| AuthError::Internal(format!("failed to read role name: {e}")))
            })
            .collect()
    }

    async fn ensure_role(&self, name: &str) -> Result<RoleRecord> {
        let row = sqlx::query(
            r#"
            INSERT INTO roles (id, name)
            VALUES ($1, $2)
            ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
            RETURNING id, name
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(name)
        .fetch_one(&self.pool)
        .await?;

        Self::map_role(&row)
    }

    async fn assign_role(&self, user_id: Uuid, role_id: Uuid) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO user_roles (user_id, role_id)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(role_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn replace_roles(&self, user_id: Uuid, roles: &[String]) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM user_roles WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        for role in roles {
            let row = sqlx::query(
                r#"
                INSERT INTO roles (id, name)
                VALUES ($1, $2)
                ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
                RETURNING id
                "#,
            )
            .bind(Uuid::now_v7())
            .bind(role)
            .fetch_one(&mut *tx)
            .await?;

            let role_id: Uuid = row
                .try_get("id")
                .map_err(|e| AuthError::Internal(format!("failed to read role id: {e}")))?;

            sqlx::query(
                r#"
                INSERT INTO user_roles (user_id, role_id)
                VALUES ($1, $2)
                ON CONFLICT DO NOTHING
                "#,
            )
            .bind(user_id)
            .bind(role_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn update(&self, username: &str, change: UserChange) -> Result<bool> {
        // Refresh tokens follow a rename through the FK's ON UPDATE CASCADE.
        let result = sqlx::query(
            r#"
            UPDATE users
            SET username = COALESCE($2, username),
                password_hash = COALESCE($3, password_hash)
            WHERE username = $1
            "#,
        )
        .bind(username)
        .bind(change.username.as_deref())
        .bind(change.password_hash.as_deref())
        .execute(&self.pool)
        .await;

        match result {
            Ok(done) => Ok(done.rows_affected() == 1),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(AuthError::conflict("username already taken".to_string()))
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn delete(&self, username: &str) -> Result<bool> {
        // Role assignments and refresh tokens go with the row via cascade.
        let result = sqlx::query(
            r#"
            DELETE FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}
