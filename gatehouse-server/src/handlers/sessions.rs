use axum::{Json, extract::State};

use gatehouse_core::api_types::SessionResponse;

use crate::infra::{app_state::AppState, errors::AppResult};

/// One entry per live refresh token, newest first. Strictly telemetry;
/// access tokens stay valid regardless of what this view shows.
pub async fn list(State(state): State<AppState>) -> AppResult<Json<Vec<SessionResponse>>> {
    let sessions = state.auth.active_sessions().await?;
    Ok(Json(sessions.into_iter().map(SessionResponse::from).collect()))
}
