use axum::{
    Router, middleware,
    routing::{get, post, put},
};
use tower_http::trace::TraceLayer;

use gatehouse_core::model::ADMIN_ROLE;

use crate::{
    handlers::{auth, domains, sessions, users},
    infra::app_state::AppState,
    middleware::{auth_middleware, require_role},
};

/// Assemble the full HTTP surface.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(public_routes())
        .merge(verified_routes(state.clone()))
        .merge(admin_routes(state.clone()))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Endpoints reachable without a token.
fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/tokens/refresh", post(auth::refresh))
        .route("/health", get(auth::health))
}

/// Endpoints that require a valid access token.
fn verified_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/verify", get(auth::verify))
        .route("/tokens/revoke", post(auth::revoke))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Endpoints gated on the admin role.
///
/// Layer order matters: `route_layer` calls stack so the last one added runs
/// first. The auth layer goes on last so every request is authenticated
/// before the role check reads the identity extension.
fn admin_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/domains", get(domains::list).post(domains::create))
        .route("/domains/{name}", put(domains::rename))
        .route("/domains/{name}", axum::routing::delete(domains::remove))
        .route("/users", get(users::list))
        .route("/users/{username}", get(users::show))
        .route("/users/{username}", put(users::update))
        .route("/users/{username}", axum::routing::delete(users::remove))
        .route("/sessions", get(sessions::list))
        .route_layer(middleware::from_fn(require_role(ADMIN_ROLE)))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}
