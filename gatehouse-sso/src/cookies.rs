//! Set and clear the HttpOnly session cookies shared by every application
//! behind the gateway.

use axum_extra::extract::cookie::{Cookie, SameSite};
use time::Duration;

use gatehouse_core::api_types::{ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE};
use gatehouse_core::token::{ACCESS_TOKEN_TTL_SECS, REFRESH_TOKEN_TTL_SECS};

/// HttpOnly cookie carrying the access token, aligned with its lifetime.
pub fn access_cookie(token: &str, secure: bool) -> Cookie<'static> {
    Cookie::build((ACCESS_TOKEN_COOKIE, token.to_string()))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(Duration::seconds(ACCESS_TOKEN_TTL_SECS))
        .build()
}

/// HttpOnly cookie carrying the refresh token, aligned with its lifetime.
pub fn refresh_cookie(token: &str, secure: bool) -> Cookie<'static> {
    Cookie::build((REFRESH_TOKEN_COOKIE, token.to_string()))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(Duration::seconds(REFRESH_TOKEN_TTL_SECS))
        .build()
}

/// Expired cookie that clears the access token.
pub fn clear_access_cookie(secure: bool) -> Cookie<'static> {
    Cookie::build((ACCESS_TOKEN_COOKIE, String::new()))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(Duration::ZERO)
        .build()
}

/// Expired cookie that clears the refresh token.
pub fn clear_refresh_cookie(secure: bool) -> Cookie<'static> {
    Cookie::build((REFRESH_TOKEN_COOKIE, String::new()))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(Duration::ZERO)
        .build()
}
