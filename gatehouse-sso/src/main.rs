//! # Gatehouse SSO Gateway
//!
//! The shared login surface for the applications behind gatehouse.
//!
//! ## Overview
//!
//! - **Login page**: one HTML form serving every consuming application
//! - **Trust boundary**: redirect targets checked against a host allow-list
//! - **Cookies**: HttpOnly `access_token`/`refresh_token` scoped to `/`
//! - **Proxy**: `sso_guard` middleware for the applications themselves
//!
//! The gateway holds no state of its own; credentials are exchanged over
//! HTTP with the Authentication Service named in the configuration.

use std::{path::PathBuf, sync::Arc};

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gatehouse_config::{ConfigLoad, ConfigLoader};
use gatehouse_sso::{
    client::HttpAuthClient, redirect::RedirectPolicy, routes, state::GatewayState,
};

/// CLI entry point
#[derive(Parser, Debug)]
#[command(name = "gatehouse-sso")]
#[command(about = "Single-sign-on gateway for applications behind gatehouse")]
struct Cli {
    /// Path to a gatehouse.toml (overrides discovery)
    #[arg(long, env = "GATEHOUSE_CONFIG")]
    config: Option<PathBuf>,

    /// Gateway port (overrides config)
    #[arg(short, long, env = "SSO_PORT")]
    port: Option<u16>,

    /// Gateway host (overrides config)
    #[arg(long, env = "SSO_HOST")]
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
        config.sso.port = port;
    }
    if let Some(host) = cli.host {
        config.sso.host = host;
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

    let client = HttpAuthClient::new(&config.sso.auth_service_url, config.sso.verify_timeout)
        .context("failed to build the authentication service client")?;
    info!(
        auth_service = %config.sso.auth_service_url,
        trusted_hosts = config.sso.trusted_hosts.len(),
        apps = config.sso.app_urls.len(),
        "gateway configured"
    );

    let addr = config.sso.bind_addr();
    let redirects = RedirectPolicy::new(
        config.sso.trusted_hosts,
        config.sso.app_urls,
        config.sso.default_redirect,
    );
    let state = GatewayState::new(Arc::new(client), redirects, config.sso.cookie_secure);
    let app = routes::build_router(state);
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
