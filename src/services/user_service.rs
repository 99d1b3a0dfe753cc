use serde_json::to_value;
use uuid::Uuid;

use crate::dto::user_dto::{
    CreateUserRequest, UpdateUserRequest, UpdateUserSettingsRequest, UserSettingsResponse,
};
use crate::error::{Error, Result};
use crate::models::user::User;
use crate::repositories::Repositories;
use crate::utils::{crypto::hash_password, time::now};

#[derive(Clone)]
pub struct UserService {
    repos: Repositories,
}

impl UserService {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }

    pub async fn list(&self) -> Result<Vec<User>> {
        self.repos.users.list().await
    }

    pub async fn get(&self, id: Uuid) -> Result<User> {
        self.repos
            .users
            .find_by_id(id)
            .await?
            .ok_or_else(|| Error::NotFound("User not found".to_string()))
    }

    pub async fn create(&self, request: CreateUserRequest) -> Result<User> {
        let user = User::new(
            &request.email,
            hash_password(&request.password)?,
            request.first_name,
            request.last_name,
            request.role,
        );
        let user = self.repos.users.insert(user).await?;
        tracing::info!(user_id = %user.id, role = %user.role, "user created");
        Ok(user)
    }

    pub async fn update(&self, id: Uuid, request: UpdateUserRequest) -> Result<User> {
        let mut user = self.get(id).await?;
        if let Some(first_name) = request.first_name {
            user.first_name = first_name;
        }
        if let Some(last_name) = request.last_name {
            user.last_name = last_name;
        }
        if let Some(role) = request.role {
            user.role = role;
        }
        if let Some(is_active) = request.is_active {
            user.is_active = is_active;
        }
        if let Some(password) = request.password {
            user.password_hash = hash_password(&password)?;
        }
        user.updated_at = now();
        self.repos.users.update(&user).await
    }

    /// Users who issued invitations stay, so every invitation keeps its author.
    pub async fn delete(&self, id: Uuid, acting_user: Uuid) -> Result<()> {
        if id == acting_user {
            return Err(Error::BadRequest("You cannot delete your own account".to_string()));
        }
        self.get(id).await?;
        let issued = self.repos.invitations.count_created_by(id).await?;
        if issued > 0 {
            return Err(Error::Conflict(format!(
                "User has issued {} invitation(s); deactivate the account instead",
                issued
            )));
        }
        self.repos.users.delete(id).await?;
        tracing::info!(user_id = %id, "user deleted");
        Ok(())
    }

    pub async fn settings(&self, id: Uuid) -> Result<UserSettingsResponse> {
        let user = self.get(id).await?;
        Ok(UserSettingsResponse {
            notification_settings: user.notification_preferences(),
            invitation_settings: user.invitation_preferences(),
        })
    }

    pub async fn update_settings(
        &self,
        id: Uuid,
        request: UpdateUserSettingsRequest,
    ) -> Result<UserSettingsResponse> {
        let mut user = self.get(id).await?;
        if let Some(notifications) = &request.notification_settings {
            user.notification_settings = to_value(notifications)?;
        }
        if let Some(invitations) = &request.invitation_settings {
            user.invitation_settings = to_value(invitations)?;
        }
        user.updated_at = now();
        let user = self.repos.users.update(&user).await?;
        Ok(UserSettingsResponse {
            notification_settings: user.notification_preferences(),
            invitation_settings: user.invitation_preferences(),
        })
    }
}
