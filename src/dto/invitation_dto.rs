use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::{trim_optional_string, trim_string};
use crate::models::{
    candidate::{Candidate, CandidateStatus},
    invitation::{Invitation, InvitationStatus},
    user::User,
};

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateInvitationRequest {
    #[validate(length(min = 1, max = 100, message = "First name is required"))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100, message = "Last name is required"))]
    pub last_name: String,
    #[serde(default, deserialize_with = "trim_optional_string")]
    #[validate(length(max = 100))]
    pub middle_name: Option<String>,
    #[validate(email(message = "Email address is invalid"))]
    pub email: String,
    #[serde(default, deserialize_with = "trim_string")]
    #[validate(
        length(min = 1, message = "Phone is required"),
        custom(function = "crate::utils::validation::phone")
    )]
    pub phone: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CandidateSummary {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub middle_name: Option<String>,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub status: CandidateStatus,
}

impl From<&Candidate> for CandidateSummary {
    fn from(candidate: &Candidate) -> Self {
        Self {
            id: candidate.id,
            first_name: candidate.first_name.clone(),
            last_name: candidate.last_name.clone(),
            middle_name: candidate.middle_name.clone(),
            full_name: candidate.full_name(),
            email: candidate.email.clone(),
            phone: candidate.phone.clone(),
            status: candidate.status,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InvitationView {
    pub id: Uuid,
    pub candidate_id: Uuid,
    pub created_by: Uuid,
    pub token: String,
    pub invitation_url: String,
    pub expires_at: DateTime<Utc>,
    pub status: InvitationStatus,
    pub sent_at: Option<DateTime<Utc>>,
    pub opened_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub revoked_at: Option<DateTime<Utc>>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub candidate: Option<CandidateSummary>,
    pub creator: Option<UserSummary>,
}

impl InvitationView {
    pub fn new(
        invitation: Invitation,
        invitation_url: String,
        candidate: Option<&Candidate>,
        creator: Option<&User>,
    ) -> Self {
        Self {
            id: invitation.id,
            candidate_id: invitation.candidate_id,
            created_by: invitation.created_by,
            token: invitation.token,
            invitation_url,
            expires_at: invitation.expires_at,
            status: invitation.status,
            sent_at: invitation.sent_at,
            opened_at: invitation.opened_at,
            completed_at: invitation.completed_at,
            revoked_at: invitation.revoked_at,
            ip_address: invitation.ip_address,
            user_agent: invitation.user_agent,
            created_at: invitation.created_at,
            updated_at: invitation.updated_at,
            candidate: candidate.map(CandidateSummary::from),
            creator: creator.map(UserSummary::from),
        }
    }
}

/// Body returned when an invitation is issued or re-issued.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IssuedInvitationResponse {
    #[serde(flatten)]
    pub invitation: InvitationView,
    pub email_sent: bool,
}
