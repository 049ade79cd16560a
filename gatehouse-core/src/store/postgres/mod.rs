//! PostgreSQL implementations of the credential store ports.

use std::time::Duration;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};

mod domains;
mod tokens;
mod users;

pub use domains::PostgresDomainRepository;
pub use tokens::{PostgresRefreshTokenRepository, PostgresRevokedTokenRepository};
pub use users::PostgresUserRepository;

/// Open a bounded connection pool, retrying with a fixed backoff.
///
/// The backing database regularly comes up after this service when both are
/// started together, so transient failures are expected. Exhausting the
/// attempt budget returns the final error; callers treat that as fatal and
/// must not serve traffic without a store.
pub async fn connect_with_retry(
    url: &str,
    max_connections: u32,
    attempts: u32,
    backoff: Duration,
) -> Result<PgPool, sqlx::Error> {
    let attempts = attempts.max(1);
    let mut attempt = 1u32;

    loop {
        match PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
        {
            Ok(pool) => {
                if attempt > 1 {
                    info!(attempt, "database connection established after retries");
                }
                return Ok(pool);
            }
            Err(err) if attempt < attempts => {
                warn!(
                    attempt,
                    max_attempts = attempts,
                    backoff_secs = backoff.as_secs(),
                    error = %err,
                    "database unreachable; retrying"
                );
                tokio::time::sleep(backoff).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}
