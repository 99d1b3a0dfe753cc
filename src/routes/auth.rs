use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use validator::Validate;

use crate::dto::auth_dto::{LoginRequest, RegisterRequest};
use crate::middleware::auth::Claims;
use crate::AppState;

#[axum::debug_handler]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> crate::error::Result<impl IntoResponse> {
    payload.validate()?;
    let user = state.auth_service.register(payload).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> crate::error::Result<impl IntoResponse> {
    payload.validate()?;
    let response = state.auth_service.login(payload).await?;
    Ok(Json(response))
}

#[axum::debug_handler]
pub async fn profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> crate::error::Result<impl IntoResponse> {
    let user = state.auth_service.profile(claims.user_id()?).await?;
    Ok(Json(user))
}
