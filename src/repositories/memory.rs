use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use super::{
    CandidateRepository, InvitationRepository, QuestionnaireRepository, SettingsRepository,
    UserRepository,
};
use crate::error::{Error, Result};
use crate::models::{
    candidate::Candidate,
    invitation::{Invitation, InvitationStatus},
    questionnaire::Questionnaire,
    user::User,
};

#[derive(Default)]
struct State {
    candidates: HashMap<Uuid, Candidate>,
    invitations: HashMap<Uuid, Invitation>,
    questionnaires: HashMap<Uuid, Questionnaire>,
    users: HashMap<Uuid, User>,
    settings: HashMap<String, JsonValue>,
}

/// Process-local store. A single lock guards every collection, so multi-row
/// operations such as `replace_active` are atomic.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    fn state(&self) -> Result<MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|_| Error::Internal("memory store lock poisoned".to_string()))
    }
}

fn newest_first<T, F>(mut items: Vec<T>, created_at: F) -> Vec<T>
where
    F: Fn(&T) -> DateTime<Utc>,
{
    items.sort_by(|a, b| created_at(b).cmp(&created_at(a)));
    items
}

#[async_trait]
impl CandidateRepository for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Candidate>> {
        Ok(self.state()?.candidates.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Candidate>> {
        Ok(self
            .state()?
            .candidates
            .values()
            .find(|c| c.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn list(&self) -> Result<Vec<Candidate>> {
        let items = self.state()?.candidates.values().cloned().collect();
        Ok(newest_first(items, |c: &Candidate| c.created_at))
    }

    async fn insert(&self, candidate: Candidate) -> Result<Candidate> {
        let mut state = self.state()?;
        if state
            .candidates
            .values()
            .any(|c| c.email.eq_ignore_ascii_case(&candidate.email))
        {
            return Err(Error::Conflict(
                "A candidate with this email address already exists".to_string(),
            ));
        }
        state.candidates.insert(candidate.id, candidate.clone());
        Ok(candidate)
    }

    async fn update(&self, candidate: &Candidate) -> Result<Candidate> {
        let mut state = self.state()?;
        match state.candidates.get_mut(&candidate.id) {
            Some(stored) => {
                *stored = candidate.clone();
                Ok(candidate.clone())
            }
            None => Err(Error::NotFound("Candidate not found".to_string())),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let mut state = self.state()?;
        if state.candidates.remove(&id).is_none() {
            return Ok(false);
        }
        state.invitations.retain(|_, inv| inv.candidate_id != id);
        state.questionnaires.retain(|_, q| q.candidate_id != id);
        Ok(true)
    }
}

#[async_trait]
impl InvitationRepository for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Invitation>> {
        Ok(self.state()?.invitations.get(&id).cloned())
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<Invitation>> {
        Ok(self
            .state()?
            .invitations
            .values()
            .find(|inv| inv.token == token)
            .cloned())
    }

    async fn list(&self) -> Result<Vec<Invitation>> {
        let items = self.state()?.invitations.values().cloned().collect();
        Ok(newest_first(items, |inv: &Invitation| inv.created_at))
    }

    async fn list_by_candidate(&self, candidate_id: Uuid) -> Result<Vec<Invitation>> {
        let items = self
            .state()?
            .invitations
            .values()
            .filter(|inv| inv.candidate_id == candidate_id)
            .cloned()
            .collect();
        Ok(newest_first(items, |inv: &Invitation| inv.created_at))
    }

    async fn replace_active(
        &self,
        invitation: Invitation,
        revoked_at: DateTime<Utc>,
    ) -> Result<(Invitation, u64)> {
        let mut state = self.state()?;
        if !state.candidates.contains_key(&invitation.candidate_id) {
            return Err(Error::NotFound("Candidate not found".to_string()));
        }
        if state
            .invitations
            .values()
            .any(|inv| inv.token == invitation.token)
        {
            return Err(Error::Conflict("Invitation token collision".to_string()));
        }
        let mut revoked = 0;
        for existing in state.invitations.values_mut() {
            if existing.candidate_id == invitation.candidate_id && existing.status.is_active() {
                existing.mark_revoked(revoked_at);
                revoked += 1;
            }
        }
        state.invitations.insert(invitation.id, invitation.clone());
        Ok((invitation, revoked))
    }

    async fn transition(
        &self,
        invitation: &Invitation,
        from: &[InvitationStatus],
    ) -> Result<Option<Invitation>> {
        let mut state = self.state()?;
        match state.invitations.get_mut(&invitation.id) {
            Some(stored) if from.contains(&stored.status) => {
                *stored = invitation.clone();
                Ok(Some(invitation.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn count_created_by(&self, user_id: Uuid) -> Result<i64> {
        Ok(self
            .state()?
            .invitations
            .values()
            .filter(|inv| inv.created_by == user_id)
            .count() as i64)
    }
}

#[async_trait]
impl QuestionnaireRepository for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Questionnaire>> {
        Ok(self.state()?.questionnaires.get(&id).cloned())
    }

    async fn find_by_candidate(&self, candidate_id: Uuid) -> Result<Option<Questionnaire>> {
        Ok(self
            .state()?
            .questionnaires
            .values()
            .find(|q| q.candidate_id == candidate_id)
            .cloned())
    }

    async fn list(&self) -> Result<Vec<Questionnaire>> {
        let items = self.state()?.questionnaires.values().cloned().collect();
        Ok(newest_first(items, |q: &Questionnaire| q.created_at))
    }

    async fn insert_if_absent(&self, draft: Questionnaire) -> Result<Questionnaire> {
        let mut state = self.state()?;
        if let Some(existing) = state
            .questionnaires
            .values()
            .find(|q| q.candidate_id == draft.candidate_id)
        {
            return Ok(existing.clone());
        }
        state.questionnaires.insert(draft.id, draft.clone());
        Ok(draft)
    }

    async fn update(&self, questionnaire: &Questionnaire) -> Result<Questionnaire> {
        let mut state = self.state()?;
        match state.questionnaires.get_mut(&questionnaire.id) {
            Some(stored) => {
                *stored = questionnaire.clone();
                Ok(questionnaire.clone())
            }
            None => Err(Error::NotFound("Questionnaire not found".to_string())),
        }
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.state()?.users.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self
            .state()?
            .users
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn list(&self) -> Result<Vec<User>> {
        let items = self.state()?.users.values().cloned().collect();
        Ok(newest_first(items, |u: &User| u.created_at))
    }

    async fn count(&self) -> Result<i64> {
        Ok(self.state()?.users.len() as i64)
    }

    async fn insert(&self, user: User) -> Result<User> {
        let mut state = self.state()?;
        if state
            .users
            .values()
            .any(|u| u.email.eq_ignore_ascii_case(&user.email))
        {
            return Err(Error::Conflict(
                "A user with this email address already exists".to_string(),
            ));
        }
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update(&self, user: &User) -> Result<User> {
        let mut state = self.state()?;
        match state.users.get_mut(&user.id) {
            Some(stored) => {
                *stored = user.clone();
                Ok(user.clone())
            }
            None => Err(Error::NotFound("User not found".to_string())),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        Ok(self.state()?.users.remove(&id).is_some())
    }
}

#[async_trait]
impl SettingsRepository for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<JsonValue>> {
        Ok(self.state()?.settings.get(key).cloned())
    }

    async fn put(&self, key: &str, value: JsonValue) -> Result<()> {
        self.state()?.settings.insert(key.to_string(), value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[tokio::test]
    async fn replace_active_revokes_previous_live_invitations() {
        let store = MemoryStore::default();
        let candidate = CandidateRepository::insert(
            &store,
            Candidate::new("Ivan".into(), "Petrov".into(), None, "ivan@x.com".into(), None),
        )
        .await
        .unwrap();
        let creator = Uuid::new_v4();

        let first = Invitation::new(candidate.id, creator, "t1".into(), Duration::days(14));
        let (first, revoked) = store.replace_active(first, Utc::now()).await.unwrap();
        assert_eq!(revoked, 0);

        let second = Invitation::new(candidate.id, creator, "t2".into(), Duration::days(14));
        let (_, revoked) = store.replace_active(second, Utc::now()).await.unwrap();
        assert_eq!(revoked, 1);

        let first = InvitationRepository::find_by_id(&store, first.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(first.status, InvitationStatus::Revoked);
        assert!(first.revoked_at.is_some());
    }

    #[tokio::test]
    async fn transition_refuses_stale_status() {
        let store = MemoryStore::default();
        let candidate = CandidateRepository::insert(
            &store,
            Candidate::new("Ivan".into(), "Petrov".into(), None, "ivan@x.com".into(), None),
        )
        .await
        .unwrap();
        let first = Invitation::new(candidate.id, Uuid::new_v4(), "t1".into(), Duration::days(14));
        let (mut first, _) = store.replace_active(first, Utc::now()).await.unwrap();
        let second = Invitation::new(candidate.id, Uuid::new_v4(), "t2".into(), Duration::days(14));
        store.replace_active(second, Utc::now()).await.unwrap();

        first.mark_sent(Utc::now());
        let written = store
            .transition(&first, &[InvitationStatus::Pending])
            .await
            .unwrap();
        assert!(written.is_none());
        let stored = InvitationRepository::find_by_id(&store, first.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, InvitationStatus::Revoked);
    }

    #[tokio::test]
    async fn deleting_candidate_cascades() {
        let store = MemoryStore::default();
        let candidate = CandidateRepository::insert(
            &store,
            Candidate::new("Olga".into(), "Ivanova".into(), None, "olga@x.com".into(), None),
        )
        .await
        .unwrap();
        let inv = Invitation::new(candidate.id, Uuid::new_v4(), "tok".into(), Duration::days(1));
        store.replace_active(inv, Utc::now()).await.unwrap();
        store
            .insert_if_absent(Questionnaire::draft(candidate.id))
            .await
            .unwrap();

        assert!(CandidateRepository::delete(&store, candidate.id).await.unwrap());
        assert!(store.find_by_token("tok").await.unwrap().is_none());
        assert!(store.find_by_candidate(candidate.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn insert_if_absent_keeps_first_draft() {
        let store = MemoryStore::default();
        let candidate_id = Uuid::new_v4();
        let first = store
            .insert_if_absent(Questionnaire::draft(candidate_id))
            .await
            .unwrap();
        let second = store
            .insert_if_absent(Questionnaire::draft(candidate_id))
            .await
            .unwrap();
        assert_eq!(first.id, second.id);
    }
}
