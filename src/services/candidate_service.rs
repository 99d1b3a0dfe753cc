use uuid::Uuid;

use crate::dto::candidate_dto::{CandidateDetail, UpdateCandidateRequest};
use crate::error::{Error, Result};
use crate::models::candidate::Candidate;
use crate::repositories::Repositories;
use crate::services::invitation_service::InvitationService;
use crate::utils::time::now;

#[derive(Clone)]
pub struct CandidateService {
    repos: Repositories,
    invitations: InvitationService,
}

impl CandidateService {
    pub fn new(repos: Repositories, invitations: InvitationService) -> Self {
        Self { repos, invitations }
    }

    pub async fn list(&self) -> Result<Vec<Candidate>> {
        self.repos.candidates.list().await
    }

    async fn get(&self, id: Uuid) -> Result<Candidate> {
        self.repos
            .candidates
            .find_by_id(id)
            .await?
            .ok_or_else(|| Error::NotFound("Candidate not found".to_string()))
    }

    pub async fn detail(&self, id: Uuid) -> Result<CandidateDetail> {
        let candidate = self.get(id).await?;
        let questionnaire_status = self
            .repos
            .questionnaires
            .find_by_candidate(id)
            .await?
            .map(|q| q.status);
        let invitations = self.invitations.find_for_candidate(&candidate).await?;
        Ok(CandidateDetail {
            candidate,
            questionnaire_status,
            invitations,
        })
    }

    pub async fn update(&self, id: Uuid, request: UpdateCandidateRequest) -> Result<Candidate> {
        let mut candidate = self.get(id).await?;
        if let Some(first_name) = request.first_name {
            candidate.first_name = first_name;
        }
        if let Some(last_name) = request.last_name {
            candidate.last_name = last_name;
        }
        if let Some(middle_name) = request.middle_name {
            candidate.middle_name = Some(middle_name);
        }
        if let Some(phone) = request.phone {
            candidate.phone = Some(phone);
        }
        if let Some(metadata) = request.metadata {
            if !metadata.is_object() {
                return Err(Error::BadRequest("metadata must be a JSON object".to_string()));
            }
            candidate.metadata = metadata;
        }
        if let Some(status) = request.status {
            let previous = candidate.status;
            candidate.advance_status(status).map_err(Error::BadRequest)?;
            tracing::info!(
                candidate_id = %id,
                from = %previous,
                to = %status,
                "candidate status changed"
            );
        }
        candidate.updated_at = now();
        self.repos.candidates.update(&candidate).await
    }

    /// Deletes the candidate with its questionnaire and invitations.
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        if !self.repos.candidates.delete(id).await? {
            return Err(Error::NotFound("Candidate not found".to_string()));
        }
        tracing::info!(candidate_id = %id, "candidate deleted");
        Ok(())
    }
}
