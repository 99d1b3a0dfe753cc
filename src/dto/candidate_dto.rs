use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use validator::Validate;

use super::{invitation_dto::InvitationView, trim_optional_string};
use crate::models::{
    candidate::{Candidate, CandidateStatus},
    questionnaire::QuestionnaireStatus,
};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateDetail {
    #[serde(flatten)]
    pub candidate: Candidate,
    pub questionnaire_status: Option<QuestionnaireStatus>,
    pub invitations: Vec<InvitationView>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCandidateRequest {
    #[serde(default, deserialize_with = "trim_optional_string")]
    #[validate(length(max = 100))]
    pub first_name: Option<String>,
    #[serde(default, deserialize_with = "trim_optional_string")]
    #[validate(length(max = 100))]
    pub last_name: Option<String>,
    #[serde(default, deserialize_with = "trim_optional_string")]
    #[validate(length(max = 100))]
    pub middle_name: Option<String>,
    #[serde(default, deserialize_with = "trim_optional_string")]
    #[validate(custom(function = "crate::utils::validation::phone"))]
    pub phone: Option<String>,
    pub metadata: Option<JsonValue>,
    pub status: Option<CandidateStatus>,
}
