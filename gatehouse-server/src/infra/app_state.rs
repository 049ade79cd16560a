use std::sync::Arc;

use gatehouse_core::service::AuthenticationService;

/// Shared application state, cloned into every handler.
#[derive(Debug, Clone)]
pub struct AppState {
    pub auth: Arc<AuthenticationService>,
}

impl AppState {
    pub fn new(auth: Arc<AuthenticationService>) -> Self {
        Self { auth }
    }
}
