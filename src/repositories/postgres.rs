use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use sqlx::{types::Json, FromRow, PgPool};
use uuid::Uuid;

use super::{
    CandidateRepository, InvitationRepository, QuestionnaireRepository, SettingsRepository,
    UserRepository,
};
use crate::error::{Error, Result};
use crate::models::{
    candidate::Candidate,
    invitation::{Invitation, InvitationStatus},
    questionnaire::{Questionnaire, QuestionnaireData},
    user::User,
};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn corrupt(entity: &str, detail: String) -> Error {
    Error::Internal(format!("Stored {} row is invalid: {}", entity, detail))
}

fn unique_violation(err: sqlx::Error, message: &str) -> Error {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            Error::Conflict(message.to_string())
        }
        _ => Error::from(err),
    }
}

#[derive(Debug, FromRow)]
struct CandidateRow {
    id: Uuid,
    first_name: String,
    last_name: String,
    middle_name: Option<String>,
    email: String,
    phone: Option<String>,
    status: String,
    invitation_token: Option<String>,
    invitation_expires_at: Option<DateTime<Utc>>,
    document_token: Option<String>,
    document_token_expires_at: Option<DateTime<Utc>>,
    metadata: JsonValue,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<CandidateRow> for Candidate {
    type Error = Error;

    fn try_from(row: CandidateRow) -> Result<Self> {
        Ok(Candidate {
            id: row.id,
            first_name: row.first_name,
            last_name: row.last_name,
            middle_name: row.middle_name,
            email: row.email,
            phone: row.phone,
            status: row.status.parse().map_err(|e| corrupt("candidate", e))?,
            invitation_token: row.invitation_token,
            invitation_expires_at: row.invitation_expires_at,
            document_token: row.document_token,
            document_token_expires_at: row.document_token_expires_at,
            metadata: row.metadata,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct InvitationRow {
    id: Uuid,
    candidate_id: Uuid,
    created_by: Uuid,
    token: String,
    expires_at: DateTime<Utc>,
    status: String,
    sent_at: Option<DateTime<Utc>>,
    opened_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    revoked_at: Option<DateTime<Utc>>,
    ip_address: Option<String>,
    user_agent: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<InvitationRow> for Invitation {
    type Error = Error;

    fn try_from(row: InvitationRow) -> Result<Self> {
        Ok(Invitation {
            id: row.id,
            candidate_id: row.candidate_id,
            created_by: row.created_by,
            token: row.token,
            expires_at: row.expires_at,
            status: row.status.parse().map_err(|e| corrupt("invitation", e))?,
            sent_at: row.sent_at,
            opened_at: row.opened_at,
            completed_at: row.completed_at,
            revoked_at: row.revoked_at,
            ip_address: row.ip_address,
            user_agent: row.user_agent,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct QuestionnaireRow {
    id: Uuid,
    candidate_id: Uuid,
    data: Json<QuestionnaireData>,
    status: String,
    submitted_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<QuestionnaireRow> for Questionnaire {
    type Error = Error;

    fn try_from(row: QuestionnaireRow) -> Result<Self> {
        Ok(Questionnaire {
            id: row.id,
            candidate_id: row.candidate_id,
            data: row.data.0,
            status: row
                .status
                .parse()
                .map_err(|e| corrupt("questionnaire", e))?,
            submitted_at: row.submitted_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    password_hash: String,
    first_name: String,
    last_name: String,
    role: String,
    is_active: bool,
    notification_settings: JsonValue,
    invitation_settings: JsonValue,
    last_login_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = Error;

    fn try_from(row: UserRow) -> Result<Self> {
        Ok(User {
            id: row.id,
            email: row.email,
            password_hash: row.password_hash,
            first_name: row.first_name,
            last_name: row.last_name,
            role: row.role.parse().map_err(|e| corrupt("user", e))?,
            is_active: row.is_active,
            notification_settings: row.notification_settings,
            invitation_settings: row.invitation_settings,
            last_login_at: row.last_login_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn map_all<R, T>(rows: Vec<R>) -> Result<Vec<T>>
where
    T: TryFrom<R, Error = Error>,
{
    rows.into_iter().map(T::try_from).collect()
}

fn map_opt<R, T>(row: Option<R>) -> Result<Option<T>>
where
    T: TryFrom<R, Error = Error>,
{
    row.map(T::try_from).transpose()
}

#[async_trait]
impl CandidateRepository for PgStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Candidate>> {
        let row = sqlx::query_as::<_, CandidateRow>(r#"SELECT * FROM candidates WHERE id = $1"#)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        map_opt(row)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Candidate>> {
        let row = sqlx::query_as::<_, CandidateRow>(
            r#"SELECT * FROM candidates WHERE LOWER(email) = LOWER($1)"#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        map_opt(row)
    }

    async fn list(&self) -> Result<Vec<Candidate>> {
        let rows = sqlx::query_as::<_, CandidateRow>(
            r#"SELECT * FROM candidates ORDER BY created_at DESC"#,
        )
        .fetch_all(&self.pool)
        .await?;
        map_all(rows)
    }

    async fn insert(&self, candidate: Candidate) -> Result<Candidate> {
        let row = sqlx::query_as::<_, CandidateRow>(
            r#"
            INSERT INTO candidates (
                id, first_name, last_name, middle_name, email, phone, status,
                invitation_token, invitation_expires_at, document_token, document_token_expires_at,
                metadata, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING *
            "#,
        )
        .bind(candidate.id)
        .bind(&candidate.first_name)
        .bind(&candidate.last_name)
        .bind(&candidate.middle_name)
        .bind(&candidate.email)
        .bind(&candidate.phone)
        .bind(candidate.status.as_str())
        .bind(&candidate.invitation_token)
        .bind(candidate.invitation_expires_at)
        .bind(&candidate.document_token)
        .bind(candidate.document_token_expires_at)
        .bind(&candidate.metadata)
        .bind(candidate.created_at)
        .bind(candidate.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| unique_violation(e, "A candidate with this email address already exists"))?;
        Candidate::try_from(row)
    }

    async fn update(&self, candidate: &Candidate) -> Result<Candidate> {
        let row = sqlx::query_as::<_, CandidateRow>(
            r#"
            UPDATE candidates
            SET first_name = $2, last_name = $3, middle_name = $4, email = $5, phone = $6,
                status = $7, invitation_token = $8, invitation_expires_at = $9,
                document_token = $10, document_token_expires_at = $11, metadata = $12,
                updated_at = $13
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(candidate.id)
        .bind(&candidate.first_name)
        .bind(&candidate.last_name)
        .bind(&candidate.middle_name)
        .bind(&candidate.email)
        .bind(&candidate.phone)
        .bind(candidate.status.as_str())
        .bind(&candidate.invitation_token)
        .bind(candidate.invitation_expires_at)
        .bind(&candidate.document_token)
        .bind(candidate.document_token_expires_at)
        .bind(&candidate.metadata)
        .bind(candidate.updated_at)
        .fetch_one(&self.pool)
        .await?;
        Candidate::try_from(row)
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        // invitations and questionnaires go with it via ON DELETE CASCADE
        let result = sqlx::query(r#"DELETE FROM candidates WHERE id = $1"#)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl InvitationRepository for PgStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Invitation>> {
        let row =
            sqlx::query_as::<_, InvitationRow>(r#"SELECT * FROM invitations WHERE id = $1"#)
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        map_opt(row)
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<Invitation>> {
        let row =
            sqlx::query_as::<_, InvitationRow>(r#"SELECT * FROM invitations WHERE token = $1"#)
                .bind(token)
                .fetch_optional(&self.pool)
                .await?;
        map_opt(row)
    }

    async fn list(&self) -> Result<Vec<Invitation>> {
        let rows = sqlx::query_as::<_, InvitationRow>(
            r#"SELECT * FROM invitations ORDER BY created_at DESC"#,
        )
        .fetch_all(&self.pool)
        .await?;
        map_all(rows)
    }

    async fn list_by_candidate(&self, candidate_id: Uuid) -> Result<Vec<Invitation>> {
        let rows = sqlx::query_as::<_, InvitationRow>(
            r#"SELECT * FROM invitations WHERE candidate_id = $1 ORDER BY created_at DESC"#,
        )
        .bind(candidate_id)
        .fetch_all(&self.pool)
        .await?;
        map_all(rows)
    }

    async fn replace_active(
        &self,
        invitation: Invitation,
        revoked_at: DateTime<Utc>,
    ) -> Result<(Invitation, u64)> {
        let mut tx = self.pool.begin().await?;

        let revoked = sqlx::query(
            r#"
            UPDATE invitations
            SET status = $1, revoked_at = $2, updated_at = $2
            WHERE candidate_id = $3 AND status = ANY($4)
            "#,
        )
        .bind(InvitationStatus::Revoked.as_str())
        .bind(revoked_at)
        .bind(invitation.candidate_id)
        .bind(
            InvitationStatus::ACTIVE
                .iter()
                .map(|s| s.as_str())
                .collect::<Vec<_>>(),
        )
        .execute(&mut *tx)
        .await?
        .rows_affected();

        let row = sqlx::query_as::<_, InvitationRow>(
            r#"
            INSERT INTO invitations (
                id, candidate_id, created_by, token, expires_at, status,
                sent_at, opened_at, completed_at, revoked_at, ip_address, user_agent,
                created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING *
            "#,
        )
        .bind(invitation.id)
        .bind(invitation.candidate_id)
        .bind(invitation.created_by)
        .bind(&invitation.token)
        .bind(invitation.expires_at)
        .bind(invitation.status.as_str())
        .bind(invitation.sent_at)
        .bind(invitation.opened_at)
        .bind(invitation.completed_at)
        .bind(invitation.revoked_at)
        .bind(&invitation.ip_address)
        .bind(&invitation.user_agent)
        .bind(invitation.created_at)
        .bind(invitation.updated_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| unique_violation(e, "Another invitation was issued concurrently"))?;

        tx.commit().await?;
        Ok((Invitation::try_from(row)?, revoked))
    }

    async fn transition(
        &self,
        invitation: &Invitation,
        from: &[InvitationStatus],
    ) -> Result<Option<Invitation>> {
        let row = sqlx::query_as::<_, InvitationRow>(
            r#"
            UPDATE invitations
            SET status = $2, expires_at = $3, sent_at = $4, opened_at = $5, completed_at = $6,
                revoked_at = $7, ip_address = $8, user_agent = $9, updated_at = $10
            WHERE id = $1 AND status = ANY($11)
            RETURNING *
            "#,
        )
        .bind(invitation.id)
        .bind(invitation.status.as_str())
        .bind(invitation.expires_at)
        .bind(invitation.sent_at)
        .bind(invitation.opened_at)
        .bind(invitation.completed_at)
        .bind(invitation.revoked_at)
        .bind(&invitation.ip_address)
        .bind(&invitation.user_agent)
        .bind(invitation.updated_at)
        .bind(from.iter().map(|s| s.as_str()).collect::<Vec<_>>())
        .fetch_optional(&self.pool)
        .await?;
        map_opt(row)
    }

    async fn count_created_by(&self, user_id: Uuid) -> Result<i64> {
        let count: i64 =
            sqlx::query_scalar(r#"SELECT COUNT(*) FROM invitations WHERE created_by = $1"#)
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }
}

#[async_trait]
impl QuestionnaireRepository for PgStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Questionnaire>> {
        let row = sqlx::query_as::<_, QuestionnaireRow>(
            r#"SELECT * FROM questionnaires WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        map_opt(row)
    }

    async fn find_by_candidate(&self, candidate_id: Uuid) -> Result<Option<Questionnaire>> {
        let row = sqlx::query_as::<_, QuestionnaireRow>(
            r#"SELECT * FROM questionnaires WHERE candidate_id = $1"#,
        )
        .bind(candidate_id)
        .fetch_optional(&self.pool)
        .await?;
        map_opt(row)
    }

    async fn list(&self) -> Result<Vec<Questionnaire>> {
        let rows = sqlx::query_as::<_, QuestionnaireRow>(
            r#"SELECT * FROM questionnaires ORDER BY created_at DESC"#,
        )
        .fetch_all(&self.pool)
        .await?;
        map_all(rows)
    }

    async fn insert_if_absent(&self, draft: Questionnaire) -> Result<Questionnaire> {
        sqlx::query(
            r#"
            INSERT INTO questionnaires (id, candidate_id, data, status, submitted_at, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (candidate_id) DO NOTHING
            "#,
        )
        .bind(draft.id)
        .bind(draft.candidate_id)
        .bind(Json(&draft.data))
        .bind(draft.status.as_str())
        .bind(draft.submitted_at)
        .bind(draft.created_at)
        .bind(draft.updated_at)
        .execute(&self.pool)
        .await?;

        let row = sqlx::query_as::<_, QuestionnaireRow>(
            r#"SELECT * FROM questionnaires WHERE candidate_id = $1"#,
        )
        .bind(draft.candidate_id)
        .fetch_one(&self.pool)
        .await?;
        Questionnaire::try_from(row)
    }

    async fn update(&self, questionnaire: &Questionnaire) -> Result<Questionnaire> {
        let row = sqlx::query_as::<_, QuestionnaireRow>(
            r#"
            UPDATE questionnaires
            SET data = $2, status = $3, submitted_at = $4, updated_at = $5
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(questionnaire.id)
        .bind(Json(&questionnaire.data))
        .bind(questionnaire.status.as_str())
        .bind(questionnaire.submitted_at)
        .bind(questionnaire.updated_at)
        .fetch_one(&self.pool)
        .await?;
        Questionnaire::try_from(row)
    }
}

#[async_trait]
impl UserRepository for PgStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(r#"SELECT * FROM users WHERE id = $1"#)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        map_opt(row)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"SELECT * FROM users WHERE LOWER(email) = LOWER($1)"#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        map_opt(row)
    }

    async fn list(&self) -> Result<Vec<User>> {
        let rows = sqlx::query_as::<_, UserRow>(r#"SELECT * FROM users ORDER BY created_at DESC"#)
            .fetch_all(&self.pool)
            .await?;
        map_all(rows)
    }

    async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(r#"SELECT COUNT(*) FROM users"#)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn insert(&self, user: User) -> Result<User> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (
                id, email, password_hash, first_name, last_name, role, is_active,
                notification_settings, invitation_settings, last_login_at, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING *
            "#,
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(user.role.as_str())
        .bind(user.is_active)
        .bind(&user.notification_settings)
        .bind(&user.invitation_settings)
        .bind(user.last_login_at)
        .bind(user.created_at)
        .bind(user.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| unique_violation(e, "A user with this email address already exists"))?;
        User::try_from(row)
    }

    async fn update(&self, user: &User) -> Result<User> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            UPDATE users
            SET email = $2, password_hash = $3, first_name = $4, last_name = $5, role = $6,
                is_active = $7, notification_settings = $8, invitation_settings = $9,
                last_login_at = $10, updated_at = $11
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(user.role.as_str())
        .bind(user.is_active)
        .bind(&user.notification_settings)
        .bind(&user.invitation_settings)
        .bind(user.last_login_at)
        .bind(user.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| unique_violation(e, "A user with this email address already exists"))?;
        User::try_from(row)
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query(r#"DELETE FROM users WHERE id = $1"#)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl SettingsRepository for PgStore {
    async fn get(&self, key: &str) -> Result<Option<JsonValue>> {
        let value: Option<JsonValue> =
            sqlx::query_scalar(r#"SELECT value FROM system_settings WHERE key = $1"#)
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;
        Ok(value)
    }

    async fn put(&self, key: &str, value: JsonValue) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO system_settings (key, value, updated_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value, updated_at = NOW()
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
