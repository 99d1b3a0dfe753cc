use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub middle_name: Option<String>,
    pub email: String,
    pub phone: Option<String>,
    pub status: CandidateStatus,
    pub invitation_token: Option<String>,
    pub invitation_expires_at: Option<DateTime<Utc>>,
    pub document_token: Option<String>,
    pub document_token_expires_at: Option<DateTime<Utc>>,
    pub metadata: JsonValue,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Candidate {
    pub fn new(
        first_name: String,
        last_name: String,
        middle_name: Option<String>,
        email: String,
        phone: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            first_name,
            last_name,
            middle_name,
            email: normalize_email(&email),
            phone,
            status: CandidateStatus::Draft,
            invitation_token: None,
            invitation_expires_at: None,
            document_token: None,
            document_token_expires_at: None,
            metadata: JsonValue::Object(Default::default()),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn full_name(&self) -> String {
        match self.middle_name.as_deref().filter(|m| !m.trim().is_empty()) {
            Some(middle) => format!("{} {} {}", self.last_name, self.first_name, middle),
            None => format!("{} {}", self.last_name, self.first_name),
        }
    }

    /// Moves the candidate forward, refusing any backwards or out-of-terminal move.
    pub fn advance_status(&mut self, next: CandidateStatus) -> Result<(), String> {
        if !self.status.can_advance_to(next) {
            return Err(format!(
                "Candidate status cannot change from {} to {}",
                self.status, next
            ));
        }
        self.status = next;
        self.updated_at = Utc::now();
        Ok(())
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CandidateStatus {
    Draft,
    QuestionnaireSubmitted,
    SecurityCheckPending,
    SecurityCheckApproved,
    SecurityCheckRejected,
    DocumentsPending,
    DocumentsUploaded,
    #[serde(rename = "ready_for_1c")]
    ReadyFor1c,
    #[serde(rename = "transferred_to_1c")]
    TransferredTo1c,
    Completed,
    Rejected,
}

impl CandidateStatus {
    pub const ALL: [CandidateStatus; 11] = [
        CandidateStatus::Draft,
        CandidateStatus::QuestionnaireSubmitted,
        CandidateStatus::SecurityCheckPending,
        CandidateStatus::SecurityCheckApproved,
        CandidateStatus::SecurityCheckRejected,
        CandidateStatus::DocumentsPending,
        CandidateStatus::DocumentsUploaded,
        CandidateStatus::ReadyFor1c,
        CandidateStatus::TransferredTo1c,
        CandidateStatus::Completed,
        CandidateStatus::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CandidateStatus::Draft => "draft",
            CandidateStatus::QuestionnaireSubmitted => "questionnaire_submitted",
            CandidateStatus::SecurityCheckPending => "security_check_pending",
            CandidateStatus::SecurityCheckApproved => "security_check_approved",
            CandidateStatus::SecurityCheckRejected => "security_check_rejected",
            CandidateStatus::DocumentsPending => "documents_pending",
            CandidateStatus::DocumentsUploaded => "documents_uploaded",
            CandidateStatus::ReadyFor1c => "ready_for_1c",
            CandidateStatus::TransferredTo1c => "transferred_to_1c",
            CandidateStatus::Completed => "completed",
            CandidateStatus::Rejected => "rejected",
        }
    }

    fn rank(&self) -> u8 {
        match self {
            CandidateStatus::Draft => 0,
            CandidateStatus::QuestionnaireSubmitted => 1,
            CandidateStatus::SecurityCheckPending => 2,
            CandidateStatus::SecurityCheckApproved | CandidateStatus::SecurityCheckRejected => 3,
            CandidateStatus::DocumentsPending => 4,
            CandidateStatus::DocumentsUploaded => 5,
            CandidateStatus::ReadyFor1c => 6,
            CandidateStatus::TransferredTo1c => 7,
            CandidateStatus::Completed => 8,
            CandidateStatus::Rejected => u8::MAX,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, CandidateStatus::Completed | CandidateStatus::Rejected)
    }

    pub fn can_advance_to(&self, next: CandidateStatus) -> bool {
        if self.is_terminal() || *self == next {
            return false;
        }
        if next == CandidateStatus::Rejected {
            return true;
        }
        if *self == CandidateStatus::SecurityCheckRejected {
            return false;
        }
        next.rank() > self.rank()
    }
}

impl fmt::Display for CandidateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CandidateStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CandidateStatus::ALL
            .iter()
            .copied()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("Unknown candidate status: {}", s))
    }
}
