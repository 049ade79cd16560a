use once_cell::sync::Lazy;
use std::{
    fs,
    path::PathBuf,
    time::Duration,
};
use thiserror::Error;
use tracing::debug;

use crate::constants::{
    DEFAULT_ADMIN_EMAIL, DEFAULT_ADMIN_PASSWORD, DEFAULT_DATABASE_CONNECT_ATTEMPTS,
    DEFAULT_DATABASE_CONNECT_BACKOFF_SECS, DEFAULT_DATABASE_MAX_CONNECTIONS,
    DEFAULT_PASSWORD_PEPPER, DEFAULT_SERVER_HOST, DEFAULT_SERVER_PORT, DEFAULT_SSO_AUTH_SERVICE_URL,
    DEFAULT_SSO_HOST, DEFAULT_SSO_PORT, DEFAULT_SSO_REDIRECT, DEFAULT_SSO_VERIFY_TIMEOUT_SECS,
    DEFAULT_SWEEP_INTERVAL_SECS, DEFAULT_TOKEN_SECRET,
};
use crate::models::{
    AuthConfig, Config, ConfigMetadata, DatabaseConfig, ServerConfig, SsoConfig, SweeperConfig,
};
use crate::sources::{EnvConfig, FileConfig};
use crate::validation::{self, ConfigGuardRailError, ConfigWarnings};

static DEFAULT_CONFIG_LOCATIONS: Lazy<Vec<PathBuf>> = Lazy::new(|| {
    vec![
        PathBuf::from("gatehouse.toml"),
        PathBuf::from("config/gatehouse.toml"),
    ]
});

#[derive(Debug, Default, Clone)]
pub struct ConfigLoaderOptions {
    pub config_path: Option<PathBuf>,
    pub env_file: Option<PathBuf>,
}

#[derive(Debug, Default)]
pub struct ConfigLoader {
    options: ConfigLoaderOptions,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ConfigLoaderOptions) -> Self {
        Self { options }
    }

    pub fn with_config_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.config_path = Some(path.into());
        self
    }

    pub fn with_env_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.env_file = Some(path.into());
        self
    }

    pub fn load(&self) -> Result<ConfigLoad, ConfigLoadError> {
        let env_file_loaded = match &self.options.env_file {
            Some(path) => dotenvy::from_path(path).map(|_| true).or_else(|err| match err {
                dotenvy::Error::Io(_) => Ok(false),
                _ => Err(err),
            })?,
            None => dotenvy::dotenv().map(|_| true).or_else(|err| match err {
                dotenvy::Error::Io(_) => Ok(false),
                _ => Err(err),
            })?,
        };

        let env_config = EnvConfig::gather();

        let (file_config, config_path, config_present) = self.load_file_config(&env_config)?;

        let (config, warnings) = self.compose_config(
            file_config,
            env_config,
            config_path,
            env_file_loaded,
            config_present,
        )?;

        Ok(ConfigLoad { config, warnings })
    }

    fn load_file_config(
        &self,
        env_config: &EnvConfig,
    ) -> Result<(Option<FileConfig>, Option<PathBuf>, bool), ConfigLoadError> {
        let mut source = ConfigPathSource::default();

        if let Some(explicit) = &self.options.config_path {
            source.explicit = Some(explicit.clone());
        } else if let Some(from_env) = &env_config.config_path {
            source.env = Some(from_env.clone());
        }

        if source.is_empty() {
            source.default = DEFAULT_CONFIG_LOCATIONS
                .iter()
                .find(|candidate| candidate.exists())
                .cloned();
        }

        let resolved = source.resolved_path();

        if let Some((path, provenance)) = resolved {
            if !path.exists() {
                if provenance.is_explicit() {
                    return Err(ConfigLoadError::MissingConfig { path });
                }
                return Ok((None, None, false));
            }

            let contents = fs::read_to_string(&path).map_err(|err| ConfigLoadError::Io {
                path: path.clone(),
                source: err,
            })?;
            let file_config: FileConfig =
                toml::from_str(&contents).map_err(|err| ConfigLoadError::Parse {
                    path: path.clone(),
                    source: err,
                })?;

            debug!(path = %path.display(), "loaded configuration file");
            Ok((Some(file_config), Some(path), true))
        } else {
            Ok((None, None, false))
        }
    }

    fn compose_config(
        &self,
        file_config: Option<FileConfig>,
        env: EnvConfig,
        config_path: Option<PathBuf>,
        env_file_loaded: bool,
        config_present: bool,
    ) -> Result<(Config, ConfigWarnings), ConfigLoadError> {
        let mut warnings = ConfigWarnings::default();

        if !config_present {
            warnings.push_with_hint(
                "No gatehouse.toml detected; falling back to environment variables",
                "Place a gatehouse.toml next to the binary or point GATEHOUSE_CONFIG at one",
            );
        }

        let file = file_config.unwrap_or_default();
        let FileConfig {
            server: file_server,
            database: file_database,
            auth: file_auth,
            sweeper: file_sweeper,
            sso: file_sso,
        } = file;

        let server = ServerConfig {
            host: env
                .server_host
                .clone()
                .or(file_server.host)
                .unwrap_or_else(|| DEFAULT_SERVER_HOST.to_string()),
            port: env
                .server_port
                .or(file_server.port)
                .unwrap_or(DEFAULT_SERVER_PORT),
        };

        let database = DatabaseConfig {
            url: env
                .database_url
                .clone()
                .filter(|value| !value.trim().is_empty())
                .or(file_database.url),
            max_connections: env
                .database_max_connections
                .or(file_database.max_connections)
                .unwrap_or(DEFAULT_DATABASE_MAX_CONNECTIONS),
            connect_attempts: env
                .database_connect_attempts
                .or(file_database.connect_attempts)
                .unwrap_or(DEFAULT_DATABASE_CONNECT_ATTEMPTS),
            connect_backoff: Duration::from_secs(
                env.database_connect_backoff_secs
                    .or(file_database.connect_backoff_secs)
                    .unwrap_or(DEFAULT_DATABASE_CONNECT_BACKOFF_SECS),
            ),
        };

        let auth = AuthConfig {
            token_secret: env
                .auth_token_secret
                .clone()
                .or(file_auth.token_secret)
                .unwrap_or_else(|| DEFAULT_TOKEN_SECRET.to_string()),
            password_pepper: env
                .auth_password_pepper
                .clone()
                .or(file_auth.password_pepper)
                .unwrap_or_else(|| DEFAULT_PASSWORD_PEPPER.to_string()),
            admin_email: env
                .auth_admin_email
                .clone()
                .or(file_auth.admin_email)
                .unwrap_or_else(|| DEFAULT_ADMIN_EMAIL.to_string()),
            admin_password: env
                .auth_admin_password
                .clone()
                .or(file_auth.admin_password)
                .unwrap_or_else(|| DEFAULT_ADMIN_PASSWORD.to_string()),
        };

        let sweeper = SweeperConfig {
            interval: Duration::from_secs(
                env.sweep_interval_secs
                    .or(file_sweeper.interval_secs)
                    .unwrap_or(DEFAULT_SWEEP_INTERVAL_SECS),
            ),
        };

        let sso = SsoConfig {
            host: env
                .sso_host
                .clone()
                .or(file_sso.host)
                .unwrap_or_else(|| DEFAULT_SSO_HOST.to_string()),
            port: env.sso_port.or(file_sso.port).unwrap_or(DEFAULT_SSO_PORT),
            auth_service_url: env
                .sso_auth_service_url
                .clone()
                .or(file_sso.auth_service_url)
                .unwrap_or_else(|| DEFAULT_SSO_AUTH_SERVICE_URL.to_string()),
            trusted_hosts: env
                .sso_trusted_hosts
                .clone()
                .or(file_sso.trusted_hosts)
                .unwrap_or_default(),
            app_urls: env
                .sso_app_urls
                .clone()
                .or(file_sso.app_urls)
                .unwrap_or_default(),
            default_redirect: env
                .sso_default_redirect
                .clone()
                .or(file_sso.default_redirect)
                .unwrap_or_else(|| DEFAULT_SSO_REDIRECT.to_string()),
            cookie_secure: env
                .sso_cookie_secure
                .or(file_sso.cookie_secure)
                .unwrap_or(false),
            verify_timeout: Duration::from_secs(
                env.sso_verify_timeout_secs
                    .or(file_sso.verify_timeout_secs)
                    .unwrap_or(DEFAULT_SSO_VERIFY_TIMEOUT_SECS),
            ),
        };

        let metadata = ConfigMetadata {
            config_path,
            env_file_loaded,
        };

        let config = Config {
            server,
            database,
            auth,
            sweeper,
            sso,
            metadata,
        };

        let guard_warnings = validation::apply_guard_rails(&config)?;
        warnings.extend(guard_warnings);

        Ok((config, warnings))
    }
}

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("configuration file missing: {path}")]
    MissingConfig { path: PathBuf },
    #[error("failed to read configuration {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse configuration {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error(transparent)]
    GuardRail(#[from] ConfigGuardRailError),
    #[error(transparent)]
    EnvFile(#[from] dotenvy::Error),
}

#[derive(Debug, Default)]
struct ConfigPathSource {
    explicit: Option<PathBuf>,
    env: Option<PathBuf>,
    default: Option<PathBuf>,
}

impl ConfigPathSource {
    fn is_empty(&self) -> bool {
        self.explicit.is_none() && self.env.is_none() && self.default.is_none()
    }

    fn resolved_path(&self) -> Option<(PathBuf, ConfigPathProvenance)> {
        if let Some(path) = &self.explicit {
            return Some((path.clone(), ConfigPathProvenance::Explicit));
        }
        if let Some(path) = &self.env {
            return Some((path.clone(), ConfigPathProvenance::Env));
        }
        if let Some(path) = &self.default {
            return Some((path.clone(), ConfigPathProvenance::Default));
        }
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConfigPathProvenance {
    Explicit,
    Env,
    Default,
}

impl ConfigPathProvenance {
    fn is_explicit(self) -> bool {
        matches!(
            self,
            ConfigPathProvenance::Explicit | ConfigPathProvenance::Env
        )
    }
}

#[derive(Debug)]
pub struct ConfigLoad {
    pub config: Config,
    pub warnings: ConfigWarnings,
}
