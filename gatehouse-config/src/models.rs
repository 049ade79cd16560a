use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use crate::constants::{DEFAULT_ADMIN_PASSWORD, DEFAULT_PASSWORD_PEPPER, DEFAULT_TOKEN_SECRET};

/// Fully resolved configuration, after the environment, the config file,
/// and the defaults have been merged.
#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub sweeper: SweeperConfig,
    pub sso: SsoConfig,
    pub metadata: ConfigMetadata,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Absent when neither DATABASE_URL nor the config file provides one;
    /// the server refuses to start in that case, with a pointed message.
    pub url: Option<String>,
    pub max_connections: u32,
    pub connect_attempts: u32,
    pub connect_backoff: Duration,
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub token_secret: String,
    pub password_pepper: String,
    pub admin_email: String,
    pub admin_password: String,
}

impl AuthConfig {
    pub fn is_default_token_secret(&self) -> bool {
        self.token_secret == DEFAULT_TOKEN_SECRET
    }

    pub fn is_default_pepper(&self) -> bool {
        self.password_pepper == DEFAULT_PASSWORD_PEPPER
    }

    pub fn is_default_admin_password(&self) -> bool {
        self.admin_password == DEFAULT_ADMIN_PASSWORD
    }
}

/// How often the expired-token sweeper wakes up.
#[derive(Debug, Clone)]
pub struct SweeperConfig {
    pub interval: Duration,
}

#[derive(Debug, Clone)]
pub struct SsoConfig {
    pub host: String,
    pub port: u16,
    /// Base URL of the authentication service the gateway fronts.
    pub auth_service_url: String,
    /// Hosts (optionally `host:port`) that absolute redirect targets may
    /// point at. Anything else is silently replaced by a safe default.
    pub trusted_hosts: Vec<String>,
    /// Per-application landing URLs, keyed by the `app` query parameter.
    pub app_urls: HashMap<String, String>,
    /// Where to send a login when no valid target can be resolved.
    pub default_redirect: String,
    pub cookie_secure: bool,
    pub verify_timeout: Duration,
}

impl SsoConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Where the configuration actually came from, for startup logging.
#[derive(Debug, Clone, Default)]
pub struct ConfigMetadata {
    pub config_path: Option<PathBuf>,
    pub env_file_loaded: bool,
}
