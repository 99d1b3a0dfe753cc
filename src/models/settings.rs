use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

pub const SESSION_TIMEOUT_HOURS_KEY: &str = "session_timeout_hours";
pub const DEFAULT_SESSION_TIMEOUT_HOURS: i64 = 24;

/// System-wide settings editable by administrators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SystemSettings {
    #[validate(range(min = 1, max = 720, message = "Session timeout must be between 1 and 720 hours"))]
    pub session_timeout_hours: i64,
}

impl Default for SystemSettings {
    fn default() -> Self {
        Self {
            session_timeout_hours: DEFAULT_SESSION_TIMEOUT_HOURS,
        }
    }
}
