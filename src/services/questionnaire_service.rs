use std::collections::HashMap;

use serde_json::{Map, Value as JsonValue};
use uuid::Uuid;
use validator::Validate;

use crate::dto::questionnaire_dto::QuestionnaireView;
use crate::error::{Error, Result};
use crate::models::{
    candidate::{Candidate, CandidateStatus},
    invitation::Invitation,
    questionnaire::{Questionnaire, QuestionnaireStatus},
};
use crate::repositories::Repositories;
use crate::services::completeness::check_completeness;
use crate::services::invitation_service::InvitationService;
use crate::services::mail_service::{MailService, Sent, SubmissionNotice};
use crate::utils::time::now;

/// A freshly submitted questionnaire and the invitation it closed.
#[derive(Debug)]
pub struct Submission {
    pub questionnaire: QuestionnaireView,
    pub invitation: Invitation,
}

#[derive(Clone)]
pub struct QuestionnaireService {
    repos: Repositories,
    invitations: InvitationService,
    mail: MailService,
}

impl QuestionnaireService {
    pub fn new(repos: Repositories, invitations: InvitationService, mail: MailService) -> Self {
        Self {
            repos,
            invitations,
            mail,
        }
    }

    async fn candidate(&self, id: Uuid) -> Result<Candidate> {
        self.repos
            .candidates
            .find_by_id(id)
            .await?
            .ok_or_else(|| Error::NotFound("Candidate not found".to_string()))
    }

    async fn load_by_token(&self, token: &str) -> Result<(Invitation, Questionnaire)> {
        let invitation = self.invitations.find_by_token(token).await?;
        let questionnaire = self
            .repos
            .questionnaires
            .insert_if_absent(Questionnaire::draft(invitation.candidate_id))
            .await?;
        Ok((invitation, questionnaire))
    }

    /// Returns the candidate's questionnaire, creating an empty draft on first
    /// access.
    pub async fn get_or_create_by_token(&self, token: &str) -> Result<QuestionnaireView> {
        let (invitation, questionnaire) = self.load_by_token(token).await?;
        let candidate = self.candidate(invitation.candidate_id).await?;
        Ok(QuestionnaireView::new(questionnaire, &candidate))
    }

    /// Auto-save. Top-level keys in `patch` replace what is stored; the result
    /// must be well formed but may still be incomplete.
    pub async fn update_by_token(
        &self,
        token: &str,
        patch: &Map<String, JsonValue>,
    ) -> Result<QuestionnaireView> {
        let (invitation, mut questionnaire) = self.load_by_token(token).await?;
        if questionnaire.is_submitted() {
            return Err(Error::BadRequest(
                "Questionnaire has already been submitted".to_string(),
            ));
        }

        let data = questionnaire
            .data
            .merged_with(patch)
            .map_err(|e| Error::BadRequest(format!("Invalid questionnaire data: {}", e)))?;
        data.validate()?;

        questionnaire.data = data;
        questionnaire.updated_at = now();
        let questionnaire = self.repos.questionnaires.update(&questionnaire).await?;
        tracing::debug!(
            questionnaire_id = %questionnaire.id,
            fields = patch.len(),
            "questionnaire draft saved"
        );

        let candidate = self.candidate(invitation.candidate_id).await?;
        Ok(QuestionnaireView::new(questionnaire, &candidate))
    }

    pub async fn submit_by_token(&self, token: &str) -> Result<Submission> {
        let (_, mut questionnaire) = self.load_by_token(token).await?;
        if questionnaire.is_submitted() {
            return Err(Error::BadRequest(
                "Questionnaire has already been submitted".to_string(),
            ));
        }

        let errors = check_completeness(&questionnaire.data);
        if !errors.is_empty() {
            return Err(Error::Incomplete(errors));
        }

        let invitation = self.invitations.mark_as_completed(token).await?;

        let submitted_at = now();
        questionnaire.status = QuestionnaireStatus::Submitted;
        questionnaire.submitted_at = Some(submitted_at);
        questionnaire.updated_at = submitted_at;
        let questionnaire = self.repos.questionnaires.update(&questionnaire).await?;

        let mut candidate = self.candidate(questionnaire.candidate_id).await?;
        if candidate
            .status
            .can_advance_to(CandidateStatus::QuestionnaireSubmitted)
        {
            candidate
                .advance_status(CandidateStatus::QuestionnaireSubmitted)
                .map_err(Error::BadRequest)?;
            candidate = self.repos.candidates.update(&candidate).await?;
        }

        tracing::info!(
            questionnaire_id = %questionnaire.id,
            candidate_id = %candidate.id,
            invitation_id = %invitation.id,
            "questionnaire submitted"
        );

        Ok(Submission {
            questionnaire: QuestionnaireView::new(questionnaire, &candidate),
            invitation,
        })
    }

    /// Emails the recruiter who issued the invitation, if they asked for it.
    /// `Ok(None)` means no notice was wanted.
    pub async fn notify_submission(&self, submission: &Submission) -> Result<Option<Sent>> {
        let Some(recruiter) = self
            .repos
            .users
            .find_by_id(submission.invitation.created_by)
            .await?
        else {
            return Ok(None);
        };
        if !recruiter.is_active || !recruiter.notification_preferences().email_on_submission {
            return Ok(None);
        }

        let candidate = &submission.questionnaire.candidate;
        let sent = self
            .mail
            .send_submission_notice(SubmissionNotice {
                recruiter_name: recruiter.full_name(),
                recruiter_email: recruiter.email.clone(),
                candidate_name: candidate.full_name.clone(),
                candidate_email: candidate.email.clone(),
                submitted_at: submission
                    .questionnaire
                    .submitted_at
                    .unwrap_or_else(now),
            })
            .await?;
        Ok(Some(sent))
    }

    pub async fn find_all(&self) -> Result<Vec<QuestionnaireView>> {
        let questionnaires = self.repos.questionnaires.list().await?;
        let candidates: HashMap<Uuid, Candidate> = self
            .repos
            .candidates
            .list()
            .await?
            .into_iter()
            .map(|c| (c.id, c))
            .collect();

        Ok(questionnaires
            .into_iter()
            .filter_map(|q| {
                let candidate = candidates.get(&q.candidate_id)?;
                Some(QuestionnaireView::new(q, candidate))
            })
            .collect())
    }

    pub async fn find_one(&self, id: Uuid) -> Result<QuestionnaireView> {
        let questionnaire = self
            .repos
            .questionnaires
            .find_by_id(id)
            .await?
            .ok_or_else(|| Error::NotFound("Questionnaire not found".to_string()))?;
        let candidate = self.candidate(questionnaire.candidate_id).await?;
        Ok(QuestionnaireView::new(questionnaire, &candidate))
    }
}
