//! Proxy middleware for consuming applications: require a gateway session
//! or bounce the browser back to the login page.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::Uri,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;
use tracing::debug;
use url::form_urlencoded;

use gatehouse_core::api_types::ACCESS_TOKEN_COOKIE;
use gatehouse_core::model::VerifiedIdentity;

use crate::client::AuthApi;

/// State for [`sso_guard`]: how to reach the Authentication Service and
/// where the gateway's login page lives.
#[derive(Clone)]
pub struct SsoGuard {
    auth: Arc<dyn AuthApi>,
    login_url: String,
}

impl std::fmt::Debug for SsoGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SsoGuard")
            .field("login_url", &self.login_url)
            .finish_non_exhaustive()
    }
}

impl SsoGuard {
    pub fn new(auth: Arc<dyn AuthApi>, login_url: impl Into<String>) -> Self {
        Self {
            auth,
            login_url: login_url.into(),
        }
    }

    /// 303 to the gateway with `redirect_to` set to the original URI, so the
    /// user lands back where they started after signing in.
    fn redirect_to_login(&self, original: &Uri) -> Response {
        let query: String = form_urlencoded::Serializer::new(String::new())
            .append_pair("redirect_to", &original.to_string())
            .finish();
        Redirect::to(&format!("{}?{query}", self.login_url)).into_response()
    }
}

/// Mount with `middleware::from_fn_with_state(guard, sso_guard)`. Requests
/// carrying a verifiable `access_token` cookie proceed with a
/// [`VerifiedIdentity`] in their extensions; everything else, including a
/// slow or unreachable Authentication Service, is redirected to the login
/// page rather than served or hung.
pub async fn sso_guard(State(guard): State<SsoGuard>, mut request: Request, next: Next) -> Response {
    let jar = CookieJar::from_headers(request.headers());
    let Some(cookie) = jar.get(ACCESS_TOKEN_COOKIE) else {
        return guard.redirect_to_login(request.uri());
    };

    match guard.auth.verify(cookie.value()).await {
        Ok(verified) => {
            request.extensions_mut().insert(VerifiedIdentity {
                username: verified.username,
                roles: verified.roles,
            });
            next.run(request).await
        }
        Err(err) => {
            debug!(error = %err, "session verification failed");
            guard.redirect_to_login(request.uri())
        }
    }
}
