//! Decide where the gateway may send a browser after login or logout.
//!
//! This is the trust boundary of the whole login flow: an attacker who can
//! steer the post-login redirect can harvest the session. Targets are only
//! honored when they are same-site relative paths or absolute http(s) URLs
//! whose host appears on the configured allow-list. Anything else is
//! silently replaced by a safe default; the rejected value is never echoed
//! back to the browser.

use std::collections::HashMap;

use tracing::debug;
use url::Url;

#[derive(Debug, Clone)]
pub struct RedirectPolicy {
    trusted_hosts: Vec<String>,
    app_urls: HashMap<String, String>,
    default_redirect: String,
}

impl RedirectPolicy {
    pub fn new(
        trusted_hosts: Vec<String>,
        app_urls: HashMap<String, String>,
        default_redirect: String,
    ) -> Self {
        Self {
            trusted_hosts,
            app_urls,
            default_redirect,
        }
    }

    /// Target after a successful login: the explicit `redirect_to` when it
    /// passes [`Self::is_safe_target`], else the named app's configured URL,
    /// else the global default.
    pub fn resolve_login(&self, app: Option<&str>, redirect_to: Option<&str>) -> String {
        if let Some(target) = redirect_to {
            if self.is_safe_target(target) {
                return target.to_string();
            }
            debug!(target, "discarded untrusted redirect target");
        }

        if let Some(app) = app {
            if let Some(url) = self.app_urls.get(app) {
                return url.clone();
            }
            debug!(app, "no redirect configured for app");
        }

        self.default_redirect.clone()
    }

    /// Target after logout: the explicit `redirect_to` when safe, else `/`.
    pub fn resolve_logout(&self, redirect_to: Option<&str>) -> String {
        match redirect_to {
            Some(target) if self.is_safe_target(target) => target.to_string(),
            _ => "/".to_string(),
        }
    }

    /// A target is safe when it is a same-site relative path (leading `/`,
    /// but not the scheme-relative `//` or the backslash variant `/\` some
    /// browsers normalize) or an absolute http(s) URL on a trusted host.
    fn is_safe_target(&self, target: &str) -> bool {
        if target.starts_with('/') {
            return !target.starts_with("//") && !target.starts_with("/\\");
        }

        let Ok(url) = Url::parse(target) else {
            return false;
        };
        if !matches!(url.scheme(), "http" | "https") {
            return false;
        }
        let Some(host) = url.host_str() else {
            return false;
        };
        let with_port = match url.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        };

        self.trusted_hosts
            .iter()
            .any(|t| t.eq_ignore_ascii_case(host) || t.eq_ignore_ascii_case(&with_port))
    }
}
