use axum::{
    Json,
    extract::{Path, State},
};

use gatehouse_core::api_types::{StatusResponse, UserResponse, UserUpdateRequest};

use crate::infra::{app_state::AppState, errors::AppResult};

pub async fn list(State(state): State<AppState>) -> AppResult<Json<Vec<UserResponse>>> {
    let users = state.auth.list_users().await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

pub async fn show(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> AppResult<Json<UserResponse>> {
    let user = state.auth.get_user(&username).await?;
    Ok(Json(UserResponse::from(user)))
}

pub async fn update(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Json(request): Json<UserUpdateRequest>,
) -> AppResult<Json<UserResponse>> {
    let user = state.auth.update_user(&username, request).await?;
    Ok(Json(UserResponse::from(user)))
}

pub async fn remove(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> AppResult<Json<StatusResponse>> {
    state.auth.delete_user(&username).await?;
    Ok(Json(StatusResponse::new("deleted")))
}
