use axum::{
    extract::State,
    response::{IntoResponse, Json},
};
use validator::Validate;

use crate::dto::settings_dto::UpdateSystemSettingsRequest;
use crate::AppState;

#[axum::debug_handler]
pub async fn get_settings(
    State(state): State<AppState>,
) -> crate::error::Result<impl IntoResponse> {
    let settings = state.settings_service.get().await?;
    Ok(Json(settings))
}

#[axum::debug_handler]
pub async fn update_settings(
    State(state): State<AppState>,
    Json(payload): Json<UpdateSystemSettingsRequest>,
) -> crate::error::Result<impl IntoResponse> {
    payload.validate()?;
    let settings = state.settings_service.update(payload).await?;
    Ok(Json(settings))
}
