use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::invitation_dto::CandidateSummary;
use crate::models::{
    candidate::Candidate,
    questionnaire::{Questionnaire, QuestionnaireData, QuestionnaireStatus},
};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuestionnaireView {
    pub id: Uuid,
    pub candidate_id: Uuid,
    pub status: QuestionnaireStatus,
    pub data: QuestionnaireData,
    pub submitted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub candidate: CandidateSummary,
}

impl QuestionnaireView {
    pub fn new(questionnaire: Questionnaire, candidate: &Candidate) -> Self {
        Self {
            id: questionnaire.id,
            candidate_id: questionnaire.candidate_id,
            status: questionnaire.status,
            data: questionnaire.data,
            submitted_at: questionnaire.submitted_at,
            created_at: questionnaire.created_at,
            updated_at: questionnaire.updated_at,
            candidate: CandidateSummary::from(candidate),
        }
    }
}
