use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Raw configuration as defined in a TOML file.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct FileConfig {
    #[serde(default)]
    pub server: FileServerConfig,
    #[serde(default)]
    pub database: FileDatabaseConfig,
    #[serde(default)]
    pub auth: FileAuthConfig,
    #[serde(default)]
    pub sweeper: FileSweeperConfig,
    #[serde(default)]
    pub sso: FileSsoConfig,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileServerConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileDatabaseConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_connections: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connect_attempts: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connect_backoff_secs: Option<u64>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileAuthConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_secret: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_pepper: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_password: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileSweeperConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval_secs: Option<u64>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileSsoConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_service_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trusted_hosts: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_urls: Option<HashMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_redirect: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cookie_secure: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verify_timeout_secs: Option<u64>,
}

/// Environment-derived configuration values.
#[derive(Debug, Default, Clone)]
pub struct EnvConfig {
    pub config_path: Option<PathBuf>,
    pub server_host: Option<String>,
    pub server_port: Option<u16>,
    pub database_url: Option<String>,
    pub database_max_connections: Option<u32>,
    pub database_connect_attempts: Option<u32>,
    pub database_connect_backoff_secs: Option<u64>,
    pub auth_token_secret: Option<String>,
    pub auth_password_pepper: Option<String>,
    pub auth_admin_email: Option<String>,
    pub auth_admin_password: Option<String>,
    pub sweep_interval_secs: Option<u64>,
    pub sso_host: Option<String>,
    pub sso_port: Option<u16>,
    pub sso_auth_service_url: Option<String>,
    pub sso_trusted_hosts: Option<Vec<String>>,
    pub sso_app_urls: Option<HashMap<String, String>>,
    pub sso_default_redirect: Option<String>,
    pub sso_cookie_secure: Option<bool>,
    pub sso_verify_timeout_secs: Option<u64>,
}

impl EnvConfig {
    pub fn gather() -> Self {
        let mut env_config = Self::default();

        env_config.config_path = std::env::var("GATEHOUSE_CONFIG").ok().map(PathBuf::from);

        env_config.server_host = std::env::var("SERVER_HOST").ok();
        env_config.server_port = std::env::var("SERVER_PORT")
            .ok()
            .and_then(|s| s.parse().ok());

        env_config.database_url = std::env::var("DATABASE_URL").ok();
        env_config.database_max_connections = std::env::var("DATABASE_MAX_CONNECTIONS")
            .ok()
            .and_then(|s| s.parse().ok());
        env_config.database_connect_attempts = std::env::var("DATABASE_CONNECT_ATTEMPTS")
            .ok()
            .and_then(|s| s.parse().ok());
        env_config.database_connect_backoff_secs = std::env::var("DATABASE_CONNECT_BACKOFF_SECS")
            .ok()
            .and_then(|s| s.parse().ok());

        env_config.auth_token_secret = std::env::var("AUTH_TOKEN_SECRET").ok();
        env_config.auth_password_pepper = std::env::var("AUTH_PASSWORD_PEPPER").ok();
        env_config.auth_admin_email = std::env::var("AUTH_ADMIN_EMAIL").ok();
        env_config.auth_admin_password = std::env::var("AUTH_ADMIN_PASSWORD").ok();

        env_config.sweep_interval_secs = std::env::var("SWEEP_INTERVAL_SECS")
            .ok()
            .and_then(|s| s.parse().ok());

        env_config.sso_host = std::env::var("SSO_HOST").ok();
        env_config.sso_port = std::env::var("SSO_PORT").ok().and_then(|s| s.parse().ok());
        env_config.sso_auth_service_url = std::env::var("SSO_AUTH_SERVICE_URL").ok();
        env_config.sso_trusted_hosts = parse_csv_var("SSO_TRUSTED_HOSTS");
        env_config.sso_app_urls = parse_kv_var("SSO_APP_URLS");
        env_config.sso_default_redirect = std::env::var("SSO_DEFAULT_REDIRECT").ok();
        env_config.sso_cookie_secure = parse_bool_var("SSO_COOKIE_SECURE");
        env_config.sso_verify_timeout_secs = std::env::var("SSO_VERIFY_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok());

        env_config
    }
}

fn parse_csv_var(name: &str) -> Option<Vec<String>> {
    std::env::var(name).ok().map(|raw| {
        raw.split(',')
            .filter_map(|part| {
                let trimmed = part.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            })
            .collect()
    })
}

fn parse_bool_var(name: &str) -> Option<bool> {
    std::env::var(name)
        .ok()
        .and_then(|raw| match raw.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Some(true),
            "0" | "false" | "no" | "off" => Some(false),
            _ => None,
        })
}

/// Parse `name=url,name=url` pairs, e.g. `SSO_APP_URLS=wiki=https://wiki.corp.example,board=/board`.
fn parse_kv_var(name: &str) -> Option<HashMap<String, String>> {
    std::env::var(name).ok().map(|raw| {
        raw.split(',')
            .filter_map(|pair| {
                let (key, value) = pair.split_once('=')?;
                let key = key.trim();
                let value = value.trim();
                if key.is_empty() || value.is_empty() {
                    None
                } else {
                    Some((key.to_string(), value.to_string()))
                }
            })
            .collect()
    })
}
