use serde::{Deserialize, Serialize};
use validator::Validate;

use super::trim_optional_string;
use crate::models::user::{InvitationPreferences, NotificationPreferences, UserRole};

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    #[validate(email(message = "Email address is invalid"))]
    pub email: String,
    #[validate(length(min = 8, max = 128, message = "Password must be at least 8 characters"))]
    pub password: String,
    #[validate(length(min = 1, max = 100))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100))]
    pub last_name: String,
    pub role: UserRole,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    #[serde(default, deserialize_with = "trim_optional_string")]
    #[validate(length(max = 100))]
    pub first_name: Option<String>,
    #[serde(default, deserialize_with = "trim_optional_string")]
    #[validate(length(max = 100))]
    pub last_name: Option<String>,
    pub role: Option<UserRole>,
    pub is_active: Option<bool>,
    #[validate(length(min = 8, max = 128, message = "Password must be at least 8 characters"))]
    pub password: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSettingsResponse {
    pub notification_settings: NotificationPreferences,
    pub invitation_settings: InvitationPreferences,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserSettingsRequest {
    #[validate(nested)]
    pub notification_settings: Option<NotificationPreferences>,
    #[validate(nested)]
    pub invitation_settings: Option<InvitationPreferences>,
}
