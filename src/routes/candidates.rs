use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use uuid::Uuid;
use validator::Validate;

use crate::dto::candidate_dto::UpdateCandidateRequest;
use crate::AppState;

#[axum::debug_handler]
pub async fn list_candidates(
    State(state): State<AppState>,
) -> crate::error::Result<impl IntoResponse> {
    let candidates = state.candidate_service.list().await?;
    Ok(Json(candidates))
}

#[axum::debug_handler]
pub async fn get_candidate(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> crate::error::Result<impl IntoResponse> {
    let detail = state.candidate_service.detail(id).await?;
    Ok(Json(detail))
}

#[axum::debug_handler]
pub async fn update_candidate(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCandidateRequest>,
) -> crate::error::Result<impl IntoResponse> {
    payload.validate()?;
    let candidate = state.candidate_service.update(id, payload).await?;
    Ok(Json(candidate))
}

#[axum::debug_handler]
pub async fn delete_candidate(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> crate::error::Result<impl IntoResponse> {
    state.candidate_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
