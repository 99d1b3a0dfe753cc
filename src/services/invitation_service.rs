use std::collections::HashMap;
use std::sync::Arc;

use chrono::Duration;
use uuid::Uuid;

use crate::config::Config;
use crate::dto::invitation_dto::{CreateInvitationRequest, InvitationView};
use crate::error::{Error, Result};
use crate::models::{
    candidate::{normalize_email, Candidate},
    invitation::{Invitation, InvitationStatus},
    user::User,
};
use crate::repositories::Repositories;
use crate::services::mail_service::{InvitationEmail, MailError, MailService, Sent};
use crate::utils::{time::now, token::generate_invitation_token};

const COMPLETABLE: [InvitationStatus; 5] = [
    InvitationStatus::Pending,
    InvitationStatus::Sent,
    InvitationStatus::Opened,
    InvitationStatus::Completed,
    InvitationStatus::Expired,
];

fn ensure_revocable(status: InvitationStatus) -> Result<()> {
    match status {
        InvitationStatus::Revoked => {
            Err(Error::Conflict("Invitation is already revoked".to_string()))
        }
        status if status.is_terminal() => Err(Error::Conflict(format!(
            "Invitation is already {} and cannot be revoked",
            status
        ))),
        _ => Ok(()),
    }
}

/// Outcome of issuing an invitation. The invitation exists whatever happened
/// to the email; `delivery` says whether the candidate was notified.
#[derive(Debug)]
pub struct IssuedInvitation {
    pub invitation: InvitationView,
    pub delivery: std::result::Result<Sent, MailError>,
}

#[derive(Clone)]
pub struct InvitationService {
    repos: Repositories,
    mail: MailService,
    config: Arc<Config>,
}

impl InvitationService {
    pub fn new(repos: Repositories, mail: MailService, config: Arc<Config>) -> Self {
        Self {
            repos,
            mail,
            config,
        }
    }

    pub async fn create_invitation(
        &self,
        request: CreateInvitationRequest,
        creator_id: Uuid,
    ) -> Result<IssuedInvitation> {
        let creator = self
            .repos
            .users
            .find_by_id(creator_id)
            .await?
            .ok_or_else(|| Error::NotFound("User not found".to_string()))?;

        let mut candidate = self.find_or_create_candidate(request).await?;

        let expiry_days = creator
            .invitation_preferences()
            .default_expiry_days
            .filter(|days| (1..=90).contains(days))
            .unwrap_or(self.config.invitation_expiry_days);
        let invitation = Invitation::new(
            candidate.id,
            creator.id,
            generate_invitation_token(),
            Duration::days(expiry_days),
        );

        let (mut invitation, revoked) = self
            .repos
            .invitations
            .replace_active(invitation, now())
            .await?;
        tracing::info!(
            invitation_id = %invitation.id,
            candidate_id = %candidate.id,
            revoked,
            expiry_days,
            "invitation issued"
        );

        candidate.invitation_token = Some(invitation.token.clone());
        candidate.invitation_expires_at = Some(invitation.expires_at);
        candidate.updated_at = now();
        let candidate = self.repos.candidates.update(&candidate).await?;

        let invitation_url = self.config.invitation_url(&invitation.token);
        let delivery = self
            .mail
            .send_invitation_email(InvitationEmail {
                candidate_first_name: candidate.first_name.clone(),
                candidate_last_name: candidate.last_name.clone(),
                candidate_email: candidate.email.clone(),
                invitation_url: invitation_url.clone(),
                expires_at: invitation.expires_at,
                recruiter_name: Some(creator.full_name()).filter(|n| !n.is_empty()),
                recruiter_email: Some(creator.email.clone()),
            })
            .await;

        if delivery.is_ok() {
            invitation.mark_sent(now());
            let stored = self
                .repos
                .invitations
                .transition(&invitation, &[InvitationStatus::Pending])
                .await?;
            invitation = match stored {
                Some(sent) => sent,
                None => {
                    // superseded by a newer invitation while the email was in flight
                    tracing::warn!(
                        invitation_id = %invitation.id,
                        "invitation changed during send"
                    );
                    self.get(invitation.id).await?
                }
            };
        }

        Ok(IssuedInvitation {
            invitation: InvitationView::new(
                invitation,
                invitation_url,
                Some(&candidate),
                Some(&creator),
            ),
            delivery,
        })
    }

    async fn find_or_create_candidate(
        &self,
        request: CreateInvitationRequest,
    ) -> Result<Candidate> {
        let email = normalize_email(&request.email);
        let phone = Some(request.phone).filter(|p| !p.is_empty());
        if let Some(mut existing) = self.repos.candidates.find_by_email(&email).await? {
            existing.first_name = request.first_name;
            existing.last_name = request.last_name;
            if request.middle_name.is_some() {
                existing.middle_name = request.middle_name;
            }
            if phone.is_some() {
                existing.phone = phone;
            }
            existing.updated_at = now();
            return self.repos.candidates.update(&existing).await;
        }

        let candidate = Candidate::new(
            request.first_name,
            request.last_name,
            request.middle_name,
            email.clone(),
            phone,
        );
        match self.repos.candidates.insert(candidate).await {
            Ok(created) => {
                tracing::info!(candidate_id = %created.id, "candidate created");
                Ok(created)
            }
            // another request created the same candidate in between
            Err(Error::Conflict(_)) => self
                .repos
                .candidates
                .find_by_email(&email)
                .await?
                .ok_or_else(|| Error::Internal("candidate vanished after conflict".to_string())),
            Err(e) => Err(e),
        }
    }

    /// Issues a fresh invitation for the same candidate. The named invitation
    /// is revoked along with any other live one.
    pub async fn resend_invitation(&self, id: Uuid, user_id: Uuid) -> Result<IssuedInvitation> {
        let invitation = self.get(id).await?;
        if invitation.status == InvitationStatus::Completed {
            return Err(Error::BadRequest(
                "Cannot resend an invitation whose questionnaire is already completed".to_string(),
            ));
        }
        let candidate = self
            .repos
            .candidates
            .find_by_id(invitation.candidate_id)
            .await?
            .ok_or_else(|| Error::NotFound("Candidate not found".to_string()))?;

        tracing::info!(invitation_id = %id, candidate_id = %candidate.id, "resending invitation");
        self.create_invitation(
            CreateInvitationRequest {
                first_name: candidate.first_name,
                last_name: candidate.last_name,
                middle_name: candidate.middle_name,
                email: candidate.email,
                phone: candidate.phone.unwrap_or_default(),
            },
            user_id,
        )
        .await
    }

    pub async fn revoke_invitation(&self, id: Uuid) -> Result<InvitationView> {
        let mut invitation = self.get(id).await?;
        ensure_revocable(invitation.status)?;
        invitation.mark_revoked(now());
        let Some(invitation) = self
            .repos
            .invitations
            .transition(&invitation, &InvitationStatus::ACTIVE)
            .await?
        else {
            let current = self.get(id).await?;
            ensure_revocable(current.status)?;
            return Err(Error::Conflict("Invitation changed, try again".to_string()));
        };
        tracing::info!(invitation_id = %invitation.id, "invitation revoked");
        self.view(invitation).await
    }

    /// Resolves a candidate's bearer token, refusing revoked or expired ones.
    pub async fn find_by_token(&self, token: &str) -> Result<Invitation> {
        let invitation = self
            .repos
            .invitations
            .find_by_token(token)
            .await?
            .ok_or_else(|| Error::NotFound("Invitation not found".to_string()))?;
        match invitation.status {
            InvitationStatus::Revoked => {
                Err(Error::BadRequest("Invitation has been revoked".to_string()))
            }
            InvitationStatus::Expired => {
                Err(Error::BadRequest("Invitation has expired".to_string()))
            }
            _ if invitation.is_expired_at(now()) => {
                Err(Error::BadRequest("Invitation has expired".to_string()))
            }
            _ => Ok(invitation),
        }
    }

    /// Records the first visit. Later visits, and visits to invitations that
    /// are past the open stage, leave the invitation untouched.
    pub async fn mark_as_opened(
        &self,
        token: &str,
        ip_address: Option<String>,
        user_agent: Option<String>,
    ) -> Result<Invitation> {
        let mut invitation = self
            .repos
            .invitations
            .find_by_token(token)
            .await?
            .ok_or_else(|| Error::NotFound("Invitation not found".to_string()))?;
        if !invitation.mark_opened(now(), ip_address, user_agent) {
            return Ok(invitation);
        }
        match self
            .repos
            .invitations
            .transition(&invitation, &[InvitationStatus::Pending, InvitationStatus::Sent])
            .await?
        {
            Some(opened) => {
                tracing::info!(invitation_id = %opened.id, "invitation opened");
                Ok(opened)
            }
            None => self.get(invitation.id).await,
        }
    }

    /// Completes the invitation from any status except revoked.
    pub async fn mark_as_completed(&self, token: &str) -> Result<Invitation> {
        let mut invitation = self
            .repos
            .invitations
            .find_by_token(token)
            .await?
            .ok_or_else(|| Error::NotFound("Invitation not found".to_string()))?;
        invitation.mark_completed(now());
        self.repos
            .invitations
            .transition(&invitation, &COMPLETABLE)
            .await?
            .ok_or_else(|| Error::BadRequest("Invitation has been revoked".to_string()))
    }

    pub async fn find_all(&self) -> Result<Vec<InvitationView>> {
        let invitations = self.repos.invitations.list().await?;
        let candidates: HashMap<Uuid, Candidate> = self
            .repos
            .candidates
            .list()
            .await?
            .into_iter()
            .map(|c| (c.id, c))
            .collect();
        let users: HashMap<Uuid, User> = self
            .repos
            .users
            .list()
            .await?
            .into_iter()
            .map(|u| (u.id, u))
            .collect();

        Ok(invitations
            .into_iter()
            .map(|inv| {
                let url = self.config.invitation_url(&inv.token);
                let candidate = candidates.get(&inv.candidate_id);
                let creator = users.get(&inv.created_by);
                InvitationView::new(inv, url, candidate, creator)
            })
            .collect())
    }

    pub async fn find_one(&self, id: Uuid) -> Result<InvitationView> {
        let invitation = self.get(id).await?;
        self.view(invitation).await
    }

    /// Every invitation ever issued to the candidate, newest first.
    pub async fn find_for_candidate(&self, candidate: &Candidate) -> Result<Vec<InvitationView>> {
        let invitations = self.repos.invitations.list_by_candidate(candidate.id).await?;
        let mut views = Vec::with_capacity(invitations.len());
        for invitation in invitations {
            let creator = self.repos.users.find_by_id(invitation.created_by).await?;
            let url = self.config.invitation_url(&invitation.token);
            views.push(InvitationView::new(
                invitation,
                url,
                Some(candidate),
                creator.as_ref(),
            ));
        }
        Ok(views)
    }

    async fn get(&self, id: Uuid) -> Result<Invitation> {
        self.repos
            .invitations
            .find_by_id(id)
            .await?
            .ok_or_else(|| Error::NotFound("Invitation not found".to_string()))
    }

    async fn view(&self, invitation: Invitation) -> Result<InvitationView> {
        let candidate = self
            .repos
            .candidates
            .find_by_id(invitation.candidate_id)
            .await?;
        let creator = self.repos.users.find_by_id(invitation.created_by).await?;
        let url = self.config.invitation_url(&invitation.token);
        Ok(InvitationView::new(
            invitation,
            url,
            candidate.as_ref(),
            creator.as_ref(),
        ))
    }
}
