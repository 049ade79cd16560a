use thiserror::Error;
use url::Url;

use crate::models::{Config, SsoConfig};

const MIN_SECRET_LENGTH: usize = 32;

#[derive(Debug, Error)]
pub enum ConfigGuardRailError {
    #[error("invalid SSO_AUTH_SERVICE_URL `{url}`: {reason}")]
    InvalidAuthServiceUrl { url: String, reason: String },
    #[error("invalid redirect URL for app `{app}`: {reason}")]
    InvalidAppUrl { app: String, reason: String },
    #[error("SSO_VERIFY_TIMEOUT_SECS must be greater than zero")]
    ZeroVerifyTimeout,
}

#[derive(Debug, Clone)]
pub struct ConfigWarning {
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, Default, Clone)]
pub struct ConfigWarnings {
    pub items: Vec<ConfigWarning>,
}

impl ConfigWarnings {
    pub fn push<S: Into<String>>(&mut self, message: S) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: None,
        });
    }

    pub fn push_with_hint<S: Into<String>, H: Into<String>>(&mut self, message: S, hint: H) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: Some(hint.into()),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn extend(&mut self, other: ConfigWarnings) {
        self.items.extend(other.items);
    }
}

/// Reject configurations that cannot work and warn about the ones that
/// should not leave a development machine.
pub fn apply_guard_rails(config: &Config) -> Result<ConfigWarnings, ConfigGuardRailError> {
    let mut warnings = ConfigWarnings::default();

    check_secrets(config, &mut warnings);
    validate_sso(&config.sso, &mut warnings)?;

    Ok(warnings)
}

fn check_secrets(config: &Config, warnings: &mut ConfigWarnings) {
    if config.auth.is_default_token_secret() {
        warnings.push_with_hint(
            "AUTH_TOKEN_SECRET uses the built-in development value; every deployment with this value accepts each other's tokens",
            "Set AUTH_TOKEN_SECRET to a random string of at least 32 characters",
        );
    } else if config.auth.token_secret.len() < MIN_SECRET_LENGTH {
        warnings.push(format!(
            "AUTH_TOKEN_SECRET is shorter than {MIN_SECRET_LENGTH} characters"
        ));
    }

    if config.auth.is_default_pepper() {
        warnings.push_with_hint(
            "AUTH_PASSWORD_PEPPER uses the built-in development value",
            "Set AUTH_PASSWORD_PEPPER to a random string of at least 32 characters",
        );
    } else if config.auth.password_pepper.len() < MIN_SECRET_LENGTH {
        warnings.push(format!(
            "AUTH_PASSWORD_PEPPER is shorter than {MIN_SECRET_LENGTH} characters"
        ));
    }

    if config.auth.is_default_admin_password() {
        warnings.push_with_hint(
            "AUTH_ADMIN_PASSWORD is the built-in default",
            "Set AUTH_ADMIN_PASSWORD before exposing the service",
        );
    }
}

fn validate_sso(
    sso: &SsoConfig,
    warnings: &mut ConfigWarnings,
) -> Result<(), ConfigGuardRailError> {
    if sso.verify_timeout.is_zero() {
        return Err(ConfigGuardRailError::ZeroVerifyTimeout);
    }

    let parsed =
        Url::parse(&sso.auth_service_url).map_err(|err| ConfigGuardRailError::InvalidAuthServiceUrl {
            url: sso.auth_service_url.clone(),
            reason: err.to_string(),
        })?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ConfigGuardRailError::InvalidAuthServiceUrl {
            url: sso.auth_service_url.clone(),
            reason: format!("unsupported scheme `{}`", parsed.scheme()),
        });
    }

    if sso.trusted_hosts.is_empty() {
        warnings.push_with_hint(
            "no trusted redirect hosts configured; absolute redirect targets will be replaced by the default",
            "Set SSO_TRUSTED_HOSTS to the hosts your applications live on",
        );
    }

    for (app, target) in &sso.app_urls {
        if target.starts_with('/') {
            continue;
        }
        let url = Url::parse(target).map_err(|err| ConfigGuardRailError::InvalidAppUrl {
            app: app.clone(),
            reason: err.to_string(),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigGuardRailError::InvalidAppUrl {
                app: app.clone(),
                reason: format!("unsupported scheme `{}`", url.scheme()),
            });
        }
        let Some(host) = url.host_str() else {
            return Err(ConfigGuardRailError::InvalidAppUrl {
                app: app.clone(),
                reason: "missing host".to_string(),
            });
        };
        let with_port = match url.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        };
        let trusted = sso
            .trusted_hosts
            .iter()
            .any(|t| t.eq_ignore_ascii_case(host) || t.eq_ignore_ascii_case(&with_port));
        if !trusted {
            warnings.push_with_hint(
                format!("app `{app}` points at untrusted host `{with_port}`; its logins will fall back to the default redirect"),
                "Add the host to SSO_TRUSTED_HOSTS",
            );
        }
    }

    Ok(())
}
