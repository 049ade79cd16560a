use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use gatehouse_core::api_types::{
    DomainCreateRequest, DomainRenameRequest, DomainResponse, StatusResponse,
};

use crate::infra::{app_state::AppState, errors::AppResult};

pub async fn list(State(state): State<AppState>) -> AppResult<Json<Vec<DomainResponse>>> {
    let domains = state.auth.list_domains().await?;
    Ok(Json(domains.into_iter().map(DomainResponse::from).collect()))
}

pub async fn create(
    State(state): State<AppState>,
    Json(request): Json<DomainCreateRequest>,
) -> AppResult<(StatusCode, Json<DomainResponse>)> {
    let domain = state.auth.create_domain(&request.name).await?;
    Ok((StatusCode::CREATED, Json(DomainResponse::from(domain))))
}

pub async fn rename(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(request): Json<DomainRenameRequest>,
) -> AppResult<Json<DomainResponse>> {
    let domain = state.auth.rename_domain(&name, &request.name).await?;
    Ok(Json(DomainResponse::from(domain)))
}

pub async fn remove(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> AppResult<Json<StatusResponse>> {
    state.auth.delete_domain(&name).await?;
    Ok(Json(StatusResponse::new("deleted")))
}
