//! Storage traits the services depend on. `PgStore` backs them with
//! PostgreSQL, `MemoryStore` keeps everything in process for tests and demos.

pub mod memory;
pub mod postgres;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{
    candidate::Candidate,
    invitation::{Invitation, InvitationStatus},
    questionnaire::Questionnaire,
    user::User,
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[async_trait]
pub trait CandidateRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Candidate>>;
    async fn find_by_email(&self, email: &str) -> Result<Option<Candidate>>;
    /// Newest first.
    async fn list(&self) -> Result<Vec<Candidate>>;
    async fn insert(&self, candidate: Candidate) -> Result<Candidate>;
    async fn update(&self, candidate: &Candidate) -> Result<Candidate>;
    /// Removes the candidate together with its invitations and questionnaire.
    async fn delete(&self, id: Uuid) -> Result<bool>;
}

#[async_trait]
pub trait InvitationRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Invitation>>;
    async fn find_by_token(&self, token: &str) -> Result<Option<Invitation>>;
    /// Newest first.
    async fn list(&self) -> Result<Vec<Invitation>>;
    async fn list_by_candidate(&self, candidate_id: Uuid) -> Result<Vec<Invitation>>;
    /// Revokes every active invitation of `invitation.candidate_id` and inserts
    /// `invitation`, atomically. Returns the stored invitation and how many
    /// earlier invitations were revoked.
    async fn replace_active(
        &self,
        invitation: Invitation,
        revoked_at: DateTime<Utc>,
    ) -> Result<(Invitation, u64)>;
    /// Stores `invitation` only while the stored status is still one of `from`.
    /// `None` means the row is gone or another writer moved it first.
    async fn transition(
        &self,
        invitation: &Invitation,
        from: &[InvitationStatus],
    ) -> Result<Option<Invitation>>;
    async fn count_created_by(&self, user_id: Uuid) -> Result<i64>;
}

#[async_trait]
pub trait QuestionnaireRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Questionnaire>>;
    async fn find_by_candidate(&self, candidate_id: Uuid) -> Result<Option<Questionnaire>>;
    /// Newest first.
    async fn list(&self) -> Result<Vec<Questionnaire>>;
    /// Inserts `draft` unless the candidate already has a questionnaire, in
    /// which case the existing one is returned untouched.
    async fn insert_if_absent(&self, draft: Questionnaire) -> Result<Questionnaire>;
    async fn update(&self, questionnaire: &Questionnaire) -> Result<Questionnaire>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;
    async fn list(&self) -> Result<Vec<User>>;
    async fn count(&self) -> Result<i64>;
    async fn insert(&self, user: User) -> Result<User>;
    async fn update(&self, user: &User) -> Result<User>;
    async fn delete(&self, id: Uuid) -> Result<bool>;
}

#[async_trait]
pub trait SettingsRepository: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<JsonValue>>;
    async fn put(&self, key: &str, value: JsonValue) -> Result<()>;
}

/// One handle per storage concern, all pointing at the same backing store.
#[derive(Clone)]
pub struct Repositories {
    pub candidates: Arc<dyn CandidateRepository>,
    pub invitations: Arc<dyn InvitationRepository>,
    pub questionnaires: Arc<dyn QuestionnaireRepository>,
    pub users: Arc<dyn UserRepository>,
    pub settings: Arc<dyn SettingsRepository>,
}

impl Repositories {
    pub fn postgres(pool: PgPool) -> Self {
        Self::from_store(Arc::new(PgStore::new(pool)))
    }

    pub fn in_memory() -> Self {
        Self::from_store(Arc::new(MemoryStore::default()))
    }

    fn from_store<S>(store: Arc<S>) -> Self
    where
        S: CandidateRepository
            + InvitationRepository
            + QuestionnaireRepository
            + UserRepository
            + SettingsRepository
            + 'static,
    {
        Self {
            candidates: store.clone(),
            invitations: store.clone(),
            questionnaires: store.clone(),
            users: store.clone(),
            settings: store,
        }
    }
}
