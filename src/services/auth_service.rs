use chrono::Duration;
use jsonwebtoken::{encode, EncodingKey, Header};
use uuid::Uuid;

use crate::dto::auth_dto::{LoginRequest, LoginResponse, RegisterRequest};
use crate::error::{Error, Result};
use crate::middleware::auth::Claims;
use crate::models::user::{User, UserRole};
use crate::repositories::Repositories;
use crate::services::settings_service::SettingsService;
use crate::utils::{
    crypto::{hash_password, verify_password},
    time::now,
};

#[derive(Clone)]
pub struct AuthService {
    repos: Repositories,
    settings: SettingsService,
    jwt_secret: String,
}

impl AuthService {
    pub fn new(repos: Repositories, settings: SettingsService, jwt_secret: String) -> Self {
        Self {
            repos,
            settings,
            jwt_secret,
        }
    }

    /// Self-registration. The very first account administers the system;
    /// everyone after that starts as a viewer until an admin promotes them.
    pub async fn register(&self, request: RegisterRequest) -> Result<User> {
        let role = if self.repos.users.count().await? == 0 {
            UserRole::Admin
        } else {
            UserRole::Viewer
        };
        let user = User::new(
            &request.email,
            hash_password(&request.password)?,
            request.first_name,
            request.last_name,
            role,
        );
        let user = self.repos.users.insert(user).await?;
        tracing::info!(user_id = %user.id, role = %user.role, "user registered");
        Ok(user)
    }

    pub async fn login(&self, request: LoginRequest) -> Result<LoginResponse> {
        let invalid = || Error::Unauthorized("Invalid email or password".to_string());
        let mut user = self
            .repos
            .users
            .find_by_email(&request.email)
            .await?
            .ok_or_else(invalid)?;
        if !verify_password(&request.password, &user.password_hash) {
            tracing::warn!(user_id = %user.id, "login with wrong password");
            return Err(invalid());
        }
        if !user.is_active {
            return Err(Error::Forbidden("Account is disabled".to_string()));
        }

        let hours = self.settings.session_timeout_hours().await?;
        let issued_at = now();
        let claims = Claims {
            sub: user.id.to_string(),
            exp: (issued_at + Duration::hours(hours)).timestamp() as usize,
            role: user.role,
        };
        let access_token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )?;

        user.last_login_at = Some(issued_at);
        user.updated_at = issued_at;
        let user = self.repos.users.update(&user).await?;
        tracing::info!(user_id = %user.id, "user logged in");

        Ok(LoginResponse {
            access_token,
            token_type: "Bearer",
            expires_in: hours * 3600,
            user,
        })
    }

    pub async fn profile(&self, user_id: Uuid) -> Result<User> {
        self.repos
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| Error::NotFound("User not found".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};

    fn service(repos: &Repositories) -> AuthService {
        AuthService::new(
            repos.clone(),
            SettingsService::new(repos.clone()),
            "test-secret".into(),
        )
    }

    fn register(email: &str) -> RegisterRequest {
        RegisterRequest {
            email: email.into(),
            password: "s3cure-password".into(),
            first_name: "Anna".into(),
            last_name: "Smirnova".into(),
        }
    }

    #[tokio::test]
    async fn first_user_becomes_admin() {
        let repos = Repositories::in_memory();
        let auth = service(&repos);
        let first = auth.register(register("first@example.com")).await.unwrap();
        let second = auth.register(register("second@example.com")).await.unwrap();
        assert_eq!(first.role, UserRole::Admin);
        assert_eq!(second.role, UserRole::Viewer);

        let duplicate = auth.register(register("FIRST@example.com")).await;
        assert!(matches!(duplicate, Err(Error::Conflict(_))));
    }

    #[tokio::test]
    async fn login_issues_token_with_role() {
        let repos = Repositories::in_memory();
        let auth = service(&repos);
        let user = auth.register(register("anna@example.com")).await.unwrap();

        let response = auth
            .login(LoginRequest {
                email: "anna@example.com".into(),
                password: "s3cure-password".into(),
            })
            .await
            .unwrap();
        assert_eq!(response.expires_in, 24 * 3600);
        assert!(response.user.last_login_at.is_some());

        let decoded = decode::<Claims>(
            &response.access_token,
            &DecodingKey::from_secret(b"test-secret"),
            &Validation::new(Algorithm::HS256),
        )
        .unwrap();
        assert_eq!(decoded.claims.sub, user.id.to_string());
        assert_eq!(decoded.claims.role, UserRole::Admin);
    }

    #[tokio::test]
    async fn bad_credentials_and_disabled_accounts_are_refused() {
        let repos = Repositories::in_memory();
        let auth = service(&repos);
        let mut user = auth.register(register("anna@example.com")).await.unwrap();

        let wrong = auth
            .login(LoginRequest {
                email: "anna@example.com".into(),
                password: "nope".into(),
            })
            .await;
        assert!(matches!(wrong, Err(Error::Unauthorized(_))));

        user.is_active = false;
        repos.users.update(&user).await.unwrap();
        let disabled = auth
            .login(LoginRequest {
                email: "anna@example.com".into(),
                password: "s3cure-password".into(),
            })
            .await;
        assert!(matches!(disabled, Err(Error::Forbidden(_))));
    }
}
