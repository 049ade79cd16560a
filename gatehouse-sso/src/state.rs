use std::sync::Arc;

use crate::client::AuthApi;
use crate::redirect::RedirectPolicy;

/// Shared gateway state, cloned into every handler.
#[derive(Clone)]
pub struct GatewayState {
    pub auth: Arc<dyn AuthApi>,
    pub redirects: RedirectPolicy,
    /// Mark session cookies `Secure`; off for plain-http development.
    pub cookie_secure: bool,
}

impl std::fmt::Debug for GatewayState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayState")
            .field("redirects", &self.redirects)
            .field("cookie_secure", &self.cookie_secure)
            .finish_non_exhaustive()
    }
}

impl GatewayState {
    pub fn new(auth: Arc<dyn AuthApi>, redirects: RedirectPolicy, cookie_secure: bool) -> Self {
        Self {
            auth,
            redirects,
            cookie_secure,
        }
    }
}
