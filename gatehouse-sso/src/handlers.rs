use axum::{
    Form,
    extract::{Query, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;
use serde::Deserialize;
use tracing::{debug, info, warn};

use gatehouse_core::api_types::ACCESS_TOKEN_COOKIE;

use crate::client::GatewayError;
use crate::state::GatewayState;
use crate::{cookies, pages};

/// The flow parameters every gateway endpoint understands.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginFlowQuery {
    pub app: Option<String>,
    pub redirect_to: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// `GET /` renders the login form. Always: an existing session does not
/// short-circuit, which keeps the flow explicit and testable.
pub async fn show_login(Query(flow): Query<LoginFlowQuery>) -> Html<String> {
    Html(pages::login_page(
        flow.app.as_deref(),
        flow.redirect_to.as_deref(),
        None,
    ))
}

/// `POST /login` exchanges the form credentials for tokens, sets the
/// session cookies, and 303-redirects to the resolved target. Failures
/// re-render the form; the browser never leaves the gateway.
pub async fn handle_login(
    State(state): State<GatewayState>,
    Query(flow): Query<LoginFlowQuery>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Response {
    let pair = match state.auth.login(&form.username, &form.password).await {
        Ok(pair) => pair,
        Err(GatewayError::Unauthenticated) => {
            return Html(pages::login_page(
                flow.app.as_deref(),
                flow.redirect_to.as_deref(),
                Some("Invalid username or password."),
            ))
            .into_response();
        }
        Err(err) => {
            warn!(error = %err, "login call to the authentication service failed");
            return Html(pages::login_page(
                flow.app.as_deref(),
                flow.redirect_to.as_deref(),
                Some("The sign-in service is unavailable. Try again shortly."),
            ))
            .into_response();
        }
    };

    let target = state
        .redirects
        .resolve_login(flow.app.as_deref(), flow.redirect_to.as_deref());
    info!(username = %form.username, target = %target, "login succeeded");

    let jar = jar
        .add(cookies::access_cookie(&pair.access_token, state.cookie_secure))
        .add(cookies::refresh_cookie(&pair.refresh_token, state.cookie_secure));
    (jar, Redirect::to(&target)).into_response()
}

/// `GET|POST /logout` best-effort revokes the session's access token,
/// clears both cookies, and redirects. Calling it without a session, or
/// twice, behaves identically.
pub async fn logout(
    State(state): State<GatewayState>,
    Query(flow): Query<LoginFlowQuery>,
    jar: CookieJar,
) -> Response {
    if let Some(cookie) = jar.get(ACCESS_TOKEN_COOKIE) {
        if let Err(err) = state.auth.revoke(cookie.value()).await {
            // An already-dead token is exactly what logout wants anyway.
            debug!(error = %err, "revocation during logout failed");
        }
    }

    let target = state.redirects.resolve_logout(flow.redirect_to.as_deref());
    let jar = jar
        .add(cookies::clear_access_cookie(state.cookie_secure))
        .add(cookies::clear_refresh_cookie(state.cookie_secure));
    (jar, Redirect::to(&target)).into_response()
}
