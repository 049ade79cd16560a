use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::GatewayState;

/// Assemble the gateway's HTTP surface.
pub fn build_router(state: GatewayState) -> Router {
    Router::new()
        .route("/", get(handlers::show_login))
        .route("/login", post(handlers::handle_login))
        .route("/logout", get(handlers::logout).post(handlers::logout))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
