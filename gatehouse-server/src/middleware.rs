use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::CookieJar;
use std::future::Future;
use std::pin::Pin;

use gatehouse_core::api_types::ACCESS_TOKEN_COOKIE;
use gatehouse_core::model::VerifiedIdentity;

use crate::infra::app_state::AppState;
use crate::infra::errors::AppError;

/// The raw access token a request authenticated with, for handlers that
/// need the token itself rather than the identity (revocation).
#[derive(Debug, Clone)]
pub struct RawAccessToken(pub String);

/// Authenticate the request from the `Authorization` header or, failing
/// that, the access-token cookie set by the SSO gateway. On success the
/// request carries a [`VerifiedIdentity`] and the raw token in its
/// extensions.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_token(&request)
        .ok_or_else(|| AppError::unauthorized("missing bearer token or access token cookie"))?;

    let identity = state.auth.verify(&token).await.map_err(AppError::from)?;

    request.extensions_mut().insert(identity);
    request.extensions_mut().insert(RawAccessToken(token));
    Ok(next.run(request).await)
}

/// Middleware that checks the verified identity for a role.
/// This must run AFTER `auth_middleware` in the layer stack.
pub fn require_role(
    role: &'static str,
) -> impl Fn(Request, Next) -> Pin<Box<dyn Future<Output = Response> + Send>>
+ Clone
+ Send
+ Sync
+ 'static {
    move |request: Request, next: Next| Box::pin(check_role_async(request, next, role))
}

async fn check_role_async(request: Request, next: Next, role: &str) -> Response {
    let Some(identity) = request.extensions().get::<VerifiedIdentity>() else {
        return AppError::unauthorized("authentication required").into_response();
    };

    if !identity.has_role(role) {
        return AppError::forbidden(format!("role '{role}' required")).into_response();
    }

    next.run(request).await
}

fn extract_token(request: &Request) -> Option<String> {
    let from_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));
    if let Some(token) = from_header {
        return Some(token.to_string());
    }

    CookieJar::from_headers(request.headers())
        .get(ACCESS_TOKEN_COOKIE)
        .map(|cookie| cookie.value().to_string())
}
