use axum::Json;
use utoipa::OpenApi;

use crate::dto::{
    invitation_dto::{
        CandidateSummary, CreateInvitationRequest, InvitationView, IssuedInvitationResponse,
        UserSummary,
    },
    questionnaire_dto::QuestionnaireView,
};
use crate::models::{
    candidate::CandidateStatus,
    invitation::InvitationStatus,
    questionnaire::{
        Address, Consents, EducationEntry, FamilyMember, QuestionnaireData, QuestionnaireStatus,
        Reference, WorkExperienceEntry,
    },
};

#[derive(OpenApi)]
#[openapi(
    info(title = "Candidate onboarding API"),
    paths(
        crate::routes::invitations::list_invitations,
        crate::routes::invitations::get_invitation,
        crate::routes::invitations::create_invitation,
        crate::routes::invitations::resend_invitation,
        crate::routes::invitations::revoke_invitation,
        crate::routes::questionnaires::get_by_token,
        crate::routes::questionnaires::save_by_token,
        crate::routes::questionnaires::submit_by_token,
        crate::routes::questionnaires::list_questionnaires,
        crate::routes::questionnaires::get_questionnaire,
        crate::routes::questionnaires::download_pdf,
    ),
    components(schemas(
        CreateInvitationRequest,
        InvitationView,
        IssuedInvitationResponse,
        CandidateSummary,
        UserSummary,
        QuestionnaireView,
        QuestionnaireData,
        Address,
        EducationEntry,
        WorkExperienceEntry,
        FamilyMember,
        Reference,
        Consents,
        InvitationStatus,
        CandidateStatus,
        QuestionnaireStatus,
    )),
    tags(
        (name = "invitations", description = "Issuing and tracking candidate invitations"),
        (name = "questionnaires", description = "Candidate questionnaire drafts, submission and review")
    )
)]
pub struct ApiDoc;

#[axum::debug_handler]
pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
