use axum::{Extension, Json, extract::State};

use gatehouse_core::api_types::{
    LoginRequest, LoginResponse, RefreshRequest, RefreshResponse, RegisterRequest, RevokeRequest,
    RevokeResponse, StatusResponse, VerifyResponse,
};
use gatehouse_core::model::VerifiedIdentity;

use crate::infra::{app_state::AppState, errors::AppResult};
use crate::middleware::RawAccessToken;

pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> AppResult<Json<StatusResponse>> {
    state.auth.register(request).await?;
    Ok(Json(StatusResponse::new("registered")))
}

pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let pair = state.auth.login(&request.username, &request.password).await?;
    Ok(Json(pair))
}

/// The identity was already established by the middleware; echo it back.
pub async fn verify(
    Extension(identity): Extension<VerifiedIdentity>,
) -> AppResult<Json<VerifyResponse>> {
    Ok(Json(VerifyResponse::from(identity)))
}

pub async fn refresh(
    State(state): State<AppState>,
    Json(request): Json<RefreshRequest>,
) -> AppResult<Json<RefreshResponse>> {
    let pair = state.auth.refresh(&request.refresh_token).await?;
    Ok(Json(RefreshResponse {
        access_token: pair.access_token,
        refresh_token: pair.refresh_token,
    }))
}

/// Body is optional: an empty POST revokes the token the caller
/// authenticated with.
pub async fn revoke(
    State(state): State<AppState>,
    Extension(token): Extension<RawAccessToken>,
    request: Option<Json<RevokeRequest>>,
) -> AppResult<Json<RevokeResponse>> {
    let request = request.map(|Json(body)| body).unwrap_or_default();
    let response = state.auth.revoke(request, Some(&token.0)).await?;
    Ok(Json(response))
}

pub async fn health() -> Json<StatusResponse> {
    Json(StatusResponse::new("ok"))
}
