use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, Path, State},
    http::{header, HeaderMap},
    response::{IntoResponse, Json},
};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::error::Error;
use crate::AppState;

/// Client address as seen through the reverse proxy, falling back to the
/// socket peer.
fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> Option<String> {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());
    let real_ip = headers
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty());
    forwarded
        .or(real_ip)
        .map(str::to_string)
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
}

#[utoipa::path(
    get,
    path = "/api/v1/questionnaires/token/{token}",
    tag = "questionnaires",
    params(("token" = String, Path, description = "Invitation token from the emailed link")),
    responses(
        (status = 200, description = "The candidate's questionnaire, created on first visit", body = crate::dto::questionnaire_dto::QuestionnaireView),
        (status = 400, description = "Invitation revoked or expired"),
        (status = 404, description = "Unknown token")
    )
)]
#[axum::debug_handler]
pub async fn get_by_token(
    State(state): State<AppState>,
    Path(token): Path<String>,
    headers: HeaderMap,
    peer: Option<ConnectInfo<SocketAddr>>,
) -> crate::error::Result<impl IntoResponse> {
    state.invitation_service.find_by_token(&token).await?;
    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let ip = client_ip(&headers, peer.map(|ConnectInfo(addr)| addr));
    state
        .invitation_service
        .mark_as_opened(&token, ip, user_agent)
        .await?;
    let questionnaire = state
        .questionnaire_service
        .get_or_create_by_token(&token)
        .await?;
    Ok(Json(questionnaire))
}

#[utoipa::path(
    post,
    path = "/api/v1/questionnaires/token/{token}",
    tag = "questionnaires",
    params(("token" = String, Path, description = "Invitation token from the emailed link")),
    request_body(content = crate::models::questionnaire::QuestionnaireData, description = "Any subset of top-level fields; null clears a field"),
    responses(
        (status = 200, description = "Draft saved", body = crate::dto::questionnaire_dto::QuestionnaireView),
        (status = 400, description = "Malformed field, or questionnaire already submitted")
    )
)]
#[axum::debug_handler]
pub async fn save_by_token(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Json(body): Json<JsonValue>,
) -> crate::error::Result<impl IntoResponse> {
    let patch = body
        .as_object()
        .ok_or_else(|| Error::BadRequest("Request body must be a JSON object".to_string()))?;
    let questionnaire = state
        .questionnaire_service
        .update_by_token(&token, patch)
        .await?;
    Ok(Json(questionnaire))
}

#[utoipa::path(
    post,
    path = "/api/v1/questionnaires/token/{token}/submit",
    tag = "questionnaires",
    params(("token" = String, Path, description = "Invitation token from the emailed link")),
    responses(
        (status = 200, description = "Questionnaire submitted", body = crate::dto::questionnaire_dto::QuestionnaireView),
        (status = 400, description = "Incomplete or already submitted; `errors` lists what is missing")
    )
)]
#[axum::debug_handler]
pub async fn submit_by_token(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> crate::error::Result<impl IntoResponse> {
    let submission = state.questionnaire_service.submit_by_token(&token).await?;
    if let Err(e) = state
        .questionnaire_service
        .notify_submission(&submission)
        .await
    {
        tracing::warn!(
            questionnaire_id = %submission.questionnaire.id,
            error = %e,
            "recruiter was not notified about submission"
        );
    }
    Ok(Json(submission.questionnaire))
}

#[utoipa::path(
    get,
    path = "/api/v1/questionnaires",
    tag = "questionnaires",
    responses((status = 200, description = "All questionnaires, newest first", body = [crate::dto::questionnaire_dto::QuestionnaireView]))
)]
#[axum::debug_handler]
pub async fn list_questionnaires(
    State(state): State<AppState>,
) -> crate::error::Result<impl IntoResponse> {
    let questionnaires = state.questionnaire_service.find_all().await?;
    Ok(Json(questionnaires))
}

#[utoipa::path(
    get,
    path = "/api/v1/questionnaires/{id}",
    tag = "questionnaires",
    params(("id" = Uuid, Path, description = "Questionnaire id")),
    responses((status = 200, body = crate::dto::questionnaire_dto::QuestionnaireView), (status = 404, description = "Unknown questionnaire"))
)]
#[axum::debug_handler]
pub async fn get_questionnaire(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> crate::error::Result<impl IntoResponse> {
    let questionnaire = state.questionnaire_service.find_one(id).await?;
    Ok(Json(questionnaire))
}

#[utoipa::path(
    get,
    path = "/api/v1/questionnaires/{id}/pdf",
    tag = "questionnaires",
    params(("id" = Uuid, Path, description = "Questionnaire id")),
    responses(
        (status = 200, description = "Printable questionnaire", body = Vec<u8>, content_type = "application/pdf"),
        (status = 404, description = "Unknown questionnaire"),
        (status = 502, description = "PDF converter failed")
    )
)]
#[axum::debug_handler]
pub async fn download_pdf(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> crate::error::Result<impl IntoResponse> {
    let questionnaire = state.questionnaire_service.find_one(id).await?;
    let pdf = state
        .pdf_service
        .render_questionnaire_pdf(&questionnaire)
        .await?;
    let disposition = format!("attachment; filename=\"questionnaire-{}.pdf\"", questionnaire.id);
    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        pdf,
    ))
}
