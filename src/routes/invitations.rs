use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use uuid::Uuid;
use validator::Validate;

use crate::dto::invitation_dto::{CreateInvitationRequest, IssuedInvitationResponse};
use crate::middleware::auth::Claims;
use crate::services::invitation_service::IssuedInvitation;
use crate::AppState;

/// Delivery failures end here: the invitation stays pending and the
/// recruiter can resend it.
fn issued_response(issued: IssuedInvitation) -> IssuedInvitationResponse {
    let email_sent = match &issued.delivery {
        Ok(_) => true,
        Err(e) => {
            tracing::warn!(
                invitation_id = %issued.invitation.id,
                candidate_id = %issued.invitation.candidate_id,
                error = %e,
                "invitation email was not delivered"
            );
            false
        }
    };
    IssuedInvitationResponse {
        invitation: issued.invitation,
        email_sent,
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/invitations",
    tag = "invitations",
    responses((status = 200, description = "All invitations, newest first", body = [crate::dto::invitation_dto::InvitationView]))
)]
#[axum::debug_handler]
pub async fn list_invitations(
    State(state): State<AppState>,
) -> crate::error::Result<impl IntoResponse> {
    let invitations = state.invitation_service.find_all().await?;
    Ok(Json(invitations))
}

#[utoipa::path(
    get,
    path = "/api/v1/invitations/{id}",
    tag = "invitations",
    params(("id" = Uuid, Path, description = "Invitation id")),
    responses(
        (status = 200, body = crate::dto::invitation_dto::InvitationView),
        (status = 404, description = "Unknown invitation")
    )
)]
#[axum::debug_handler]
pub async fn get_invitation(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> crate::error::Result<impl IntoResponse> {
    let invitation = state.invitation_service.find_one(id).await?;
    Ok(Json(invitation))
}

#[utoipa::path(
    post,
    path = "/api/v1/invitations",
    tag = "invitations",
    request_body = CreateInvitationRequest,
    responses(
        (status = 201, description = "Invitation issued; earlier live invitations revoked", body = IssuedInvitationResponse),
        (status = 400, description = "Validation failed")
    )
)]
#[axum::debug_handler]
pub async fn create_invitation(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateInvitationRequest>,
) -> crate::error::Result<impl IntoResponse> {
    payload.validate()?;
    let issued = state
        .invitation_service
        .create_invitation(payload, claims.user_id()?)
        .await?;
    Ok((StatusCode::CREATED, Json(issued_response(issued))))
}

#[utoipa::path(
    post,
    path = "/api/v1/invitations/{id}/resend",
    tag = "invitations",
    params(("id" = Uuid, Path, description = "Invitation id")),
    responses(
        (status = 201, description = "A new invitation with a fresh token", body = IssuedInvitationResponse),
        (status = 400, description = "Invitation already completed"),
        (status = 404, description = "Unknown invitation")
    )
)]
#[axum::debug_handler]
pub async fn resend_invitation(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> crate::error::Result<impl IntoResponse> {
    let issued = state
        .invitation_service
        .resend_invitation(id, claims.user_id()?)
        .await?;
    Ok((StatusCode::CREATED, Json(issued_response(issued))))
}

#[utoipa::path(
    post,
    path = "/api/v1/invitations/{id}/revoke",
    tag = "invitations",
    params(("id" = Uuid, Path, description = "Invitation id")),
    responses(
        (status = 200, body = crate::dto::invitation_dto::InvitationView),
        (status = 404, description = "Unknown invitation"),
        (status = 409, description = "Invitation already revoked, completed or expired")
    )
)]
#[axum::debug_handler]
pub async fn revoke_invitation(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> crate::error::Result<impl IntoResponse> {
    let invitation = state.invitation_service.revoke_invitation(id).await?;
    Ok(Json(invitation))
}
