use serde_json::json;

use crate::dto::settings_dto::UpdateSystemSettingsRequest;
use crate::error::Result;
use crate::models::settings::{
    SystemSettings, DEFAULT_SESSION_TIMEOUT_HOURS, SESSION_TIMEOUT_HOURS_KEY,
};
use crate::repositories::Repositories;

#[derive(Clone)]
pub struct SettingsService {
    repos: Repositories,
}

impl SettingsService {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }

    pub async fn get(&self) -> Result<SystemSettings> {
        Ok(SystemSettings {
            session_timeout_hours: self.session_timeout_hours().await?,
        })
    }

    /// Stored value, or the default when it is missing or out of range.
    pub async fn session_timeout_hours(&self) -> Result<i64> {
        let stored = self
            .repos
            .settings
            .get(SESSION_TIMEOUT_HOURS_KEY)
            .await?
            .and_then(|v| v.as_i64())
            .filter(|hours| (1..=720).contains(hours));
        Ok(stored.unwrap_or(DEFAULT_SESSION_TIMEOUT_HOURS))
    }

    pub async fn update(&self, request: UpdateSystemSettingsRequest) -> Result<SystemSettings> {
        if let Some(hours) = request.session_timeout_hours {
            self.repos
                .settings
                .put(SESSION_TIMEOUT_HOURS_KEY, json!(hours))
                .await?;
            tracing::info!(session_timeout_hours = hours, "system settings updated");
        }
        self.get().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn defaults_until_changed() {
        let service = SettingsService::new(Repositories::in_memory());
        assert_eq!(service.get().await.unwrap(), SystemSettings::default());

        let updated = service
            .update(UpdateSystemSettingsRequest {
                session_timeout_hours: Some(8),
            })
            .await
            .unwrap();
        assert_eq!(updated.session_timeout_hours, 8);
        assert_eq!(service.session_timeout_hours().await.unwrap(), 8);
    }

    #[tokio::test]
    async fn out_of_range_stored_value_is_ignored() {
        let repos = Repositories::in_memory();
        repos
            .settings
            .put(SESSION_TIMEOUT_HOURS_KEY, json!(10_000))
            .await
            .unwrap();
        let service = SettingsService::new(repos);
        assert_eq!(
            service.session_timeout_hours().await.unwrap(),
            DEFAULT_SESSION_TIMEOUT_HOURS
        );
    }
}
