use serde::Deserialize;
use validator::Validate;

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSystemSettingsRequest {
    #[validate(range(min = 1, max = 720, message = "Session timeout must be between 1 and 720 hours"))]
    pub session_timeout_hours: Option<i64>,
}
