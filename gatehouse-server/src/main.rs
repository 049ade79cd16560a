//! # Gatehouse Server
//!
//! Identity and session service.
//!
//! ## Overview
//!
//! Gatehouse issues and verifies credentials for the applications behind it:
//!
//! - **Accounts**: registration, per-domain grouping, role assignment
//! - **Tokens**: signed access tokens plus single-use refresh tokens
//! - **Revocation**: deny-list for access tokens, deletion for refresh tokens
//! - **Administration**: domain and user management gated on the admin role
//!
//! ## Architecture
//!
//! The server is built on Axum and uses:
//! - PostgreSQL for persistent storage
//! - Argon2id for password hashing
//! - Signed JWTs for access tokens

use std::{path::PathBuf, sync::Arc};

use anyhow::Context;
use clap::Parser;
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gatehouse_config::{ConfigLoad, ConfigLoader};
use gatehouse_core::{
    crypto::PasswordCrypto,
    service::AuthenticationService,
    store::{CredentialStore, connect_with_retry, seed, SeedOutcome},
    token::TokenCodec,
};
use gatehouse_server::{infra::app_state::AppState, infra::sweeper::spawn_sweeper, routes};

/// CLI entry point
#[derive(Parser, Debug)]
#[command(name = "gatehouse-server")]
#[command(about = "Identity and session service")]
struct Cli {
    /// Path to a gatehouse.toml (overrides discovery)
    #[arg(long, env = "GATEHOUSE_CONFIG")]
    config: Option<PathBuf>,

    /// Server port (overrides config)
    #[arg(short, long, env = "SERVER_PORT")]
    port: Option<u16>,

    /// Server host (overrides config)
    #[arg(long, env = "SERVER_HOST")]
    host: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut loader = ConfigLoader::new();
    if let Some(path) = cli.config.clone() {
        loader = loader.with_config_path(path);
    }
    let ConfigLoad {
        mut config,
        warnings,
    } = loader.load().context("failed to load configuration")?;

    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(host) = cli.host {
        config.server.host = host;
    }

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if config.metadata.env_file_loaded {
        info!("loaded .env file");
    }
    if let Some(path) = config.metadata.config_path.as_ref() {
        info!(path = %path.display(), "configuration file loaded");
    }

    if !warnings.is_empty() {
        for warning in &warnings.items {
            match &warning.hint {
                Some(hint) => {
                    warn!(message = %warning.message, hint = %hint, "configuration warning")
                }
                None => {
                    warn!(message = %warning.message, "configuration warning")
                }
            }
        }
    }

    let database_url = config.database.url.clone().context(
        "DATABASE_URL is not configured; set it in the environment or gatehouse.toml",
    )?;

    let pool = connect_with_retry(
        &database_url,
        config.database.max_connections,
        config.database.connect_attempts,
        config.database.connect_backoff,
    )
    .await
    .context("failed to connect to PostgreSQL")?;

    gatehouse_core::MIGRATOR
        .run(&pool)
        .await
        .context("failed to apply database migrations")?;

    let store = CredentialStore::postgres(pool);
    let crypto = PasswordCrypto::new(config.auth.password_pepper.as_bytes())
        .context("failed to initialize password hashing")?;

    match seed(
        &store,
        &crypto,
        &config.auth.admin_email,
        &config.auth.admin_password,
    )
    .await
    .context("failed to seed the credential store")?
    {
        SeedOutcome::Created => info!("seeded default domain and admin account"),
        SeedOutcome::Existing => debug!("seed data already present"),
    }

    let codec = TokenCodec::new(&config.auth.token_secret);
    let auth = Arc::new(AuthenticationService::new(store.clone(), codec, crypto));

    spawn_sweeper(store, config.sweeper.interval);

    let state = AppState::new(auth);
    let app = routes::build_router(state);

    let addr = config.server.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("graceful shutdown initiated");
}
