use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invitation {
    pub id: Uuid,
    pub candidate_id: Uuid,
    pub created_by: Uuid,
    pub token: String,
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
}

impl Invitation {
    pub fn new(candidate_id: Uuid, created_by: Uuid, token: String, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            candidate_id,
            created_by,
            token,
            expires_at: now + ttl,
            status: InvitationStatus::Pending,
            sent_at: None,
            opened_at: None,
            completed_at: None,
            revoked_at: None,
            ip_address: None,
            user_agent: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }

    /// Whether the token still grants access to the questionnaire.
    pub fn is_usable_at(&self, now: DateTime<Utc>) -> bool {
        !matches!(
            self.status,
            InvitationStatus::Expired | InvitationStatus::Revoked
        ) && !self.is_expired_at(now)
    }

    pub fn mark_sent(&mut self, now: DateTime<Utc>) {
        if self.status == InvitationStatus::Pending {
            self.status = InvitationStatus::Sent;
            self.sent_at = Some(now);
            self.updated_at = now;
        }
    }

    /// Returns false when the invitation was not in a state that can be opened.
    pub fn mark_opened(
        &mut self,
        now: DateTime<Utc>,
        ip_address: Option<String>,
        user_agent: Option<String>,
    ) -> bool {
        if !matches!(
            self.status,
            InvitationStatus::Pending | InvitationStatus::Sent
        ) {
            return false;
        }
        self.status = InvitationStatus::Opened;
        self.opened_at = Some(now);
        self.ip_address = ip_address;
        self.user_agent = user_agent;
        self.updated_at = now;
        true
    }

    pub fn mark_completed(&mut self, now: DateTime<Utc>) {
        self.status = InvitationStatus::Completed;
        self.completed_at = Some(now);
        self.updated_at = now;
    }

    pub fn mark_revoked(&mut self, now: DateTime<Utc>) {
        self.status = InvitationStatus::Revoked;
        self.revoked_at = Some(now);
        self.updated_at = now;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum InvitationStatus {
    Pending,
    Sent,
    Opened,
    Completed,
    Expired,
    Revoked,
}

impl InvitationStatus {
    /// Statuses counted by the single-active-invitation rule.
    pub const ACTIVE: [InvitationStatus; 3] = [
        InvitationStatus::Pending,
        InvitationStatus::Sent,
        InvitationStatus::Opened,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            InvitationStatus::Pending => "pending",
            InvitationStatus::Sent => "sent",
            InvitationStatus::Opened => "opened",
            InvitationStatus::Completed => "completed",
            InvitationStatus::Expired => "expired",
            InvitationStatus::Revoked => "revoked",
        }
    }

    pub fn is_active(&self) -> bool {
        Self::ACTIVE.contains(self)
    }

    pub fn is_terminal(&self) -> bool {
        !self.is_active()
    }
}

impl fmt::Display for InvitationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InvitationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(InvitationStatus::Pending),
            "sent" => Ok(InvitationStatus::Sent),
            "opened" => Ok(InvitationStatus::Opened),
            "completed" => Ok(InvitationStatus::Completed),
            "expired" => Ok(InvitationStatus::Expired),
            "revoked" => Ok(InvitationStatus::Revoked),
            other => Err(format!("Unknown invitation status: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invitation() -> Invitation {
        Invitation::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            "a".repeat(64),
            Duration::days(14),
        )
    }

    #[test]
    fn opened_only_from_pending_or_sent() {
        let now = Utc::now();
        let mut inv = invitation();
        inv.mark_sent(now);
        assert_eq!(inv.status, InvitationStatus::Sent);
        assert!(inv.mark_opened(now, Some("10.0.0.1".into()), Some("curl".into())));
        assert_eq!(inv.status, InvitationStatus::Opened);
        assert_eq!(inv.ip_address.as_deref(), Some("10.0.0.1"));

        assert!(!inv.mark_opened(now, Some("10.0.0.2".into()), None));
        assert_eq!(inv.ip_address.as_deref(), Some("10.0.0.1"));

        let mut revoked = invitation();
        revoked.mark_revoked(now);
        assert!(!revoked.mark_opened(now, None, None));
        assert_eq!(revoked.status, InvitationStatus::Revoked);
    }

    #[test]
    fn expiry_invalidates_regardless_of_status() {
        let mut inv = invitation();
        inv.mark_sent(Utc::now());
        assert!(inv.is_usable_at(Utc::now()));
        inv.expires_at = Utc::now() - Duration::minutes(1);
        assert!(!inv.is_usable_at(Utc::now()));
    }

    #[test]
    fn completed_invitation_remains_readable() {
        let mut inv = invitation();
        inv.mark_completed(Utc::now());
        assert!(inv.is_usable_at(Utc::now()));
        assert!(inv.status.is_terminal());
    }

    #[test]
    fn sent_is_not_reapplied_after_open() {
        let now = Utc::now();
        let mut inv = invitation();
        inv.mark_opened(now, None, None);
        inv.mark_sent(now);
        assert_eq!(inv.status, InvitationStatus::Opened);
        assert!(inv.sent_at.is_none());
    }
}
