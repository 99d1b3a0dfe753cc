use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use uuid::Uuid;
use validator::Validate;

use crate::dto::user_dto::{CreateUserRequest, UpdateUserRequest, UpdateUserSettingsRequest};
use crate::middleware::auth::Claims;
use crate::AppState;

#[axum::debug_handler]
pub async fn list_users(State(state): State<AppState>) -> crate::error::Result<impl IntoResponse> {
    let users = state.user_service.list().await?;
    Ok(Json(users))
}

#[axum::debug_handler]
pub async fn create_user(
    State(state): State<AppState>,
    Json(payload): Json<CreateUserRequest>,
) -> crate::error::Result<impl IntoResponse> {
    payload.validate()?;
    let user = state.user_service.create(payload).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

#[axum::debug_handler]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> crate::error::Result<impl IntoResponse> {
    let user = state.user_service.get(id).await?;
    Ok(Json(user))
}

#[axum::debug_handler]
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateUserRequest>,
) -> crate::error::Result<impl IntoResponse> {
    payload.validate()?;
    let user = state.user_service.update(id, payload).await?;
    Ok(Json(user))
}

#[axum::debug_handler]
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> crate::error::Result<impl IntoResponse> {
    state.user_service.delete(id, claims.user_id()?).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[axum::debug_handler]
pub async fn get_my_settings(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> crate::error::Result<impl IntoResponse> {
    let settings = state.user_service.settings(claims.user_id()?).await?;
    Ok(Json(settings))
}

#[axum::debug_handler]
pub async fn update_my_settings(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<UpdateUserSettingsRequest>,
) -> crate::error::Result<impl IntoResponse> {
    payload.validate()?;
    let settings = state
        .user_service
        .update_settings(claims.user_id()?, payload)
        .await?;
    Ok(Json(settings))
}
