use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, StatusCode},
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::user::UserRole;
use crate::AppState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
    pub role: UserRole,
}

impl Claims {
    pub fn user_id(&self) -> Result<Uuid> {
        Uuid::parse_str(&self.sub).map_err(|_| Error::Unauthorized("invalid_token".to_string()))
    }
}

const STAFF: &[UserRole] = &[UserRole::Admin, UserRole::Recruiter, UserRole::Security];
const MANAGERS: &[UserRole] = &[UserRole::Admin, UserRole::Recruiter];
const ADMINS: &[UserRole] = &[UserRole::Admin];

fn reject(status: StatusCode, code: &str) -> Response {
    (status, Json(json!({ "error": code }))).into_response()
}

fn authenticate(state: &AppState, req: &Request) -> std::result::Result<Claims, Response> {
    let Some(auth_header) = req.headers().get(AUTHORIZATION) else {
        return Err(reject(StatusCode::UNAUTHORIZED, "missing_authorization"));
    };
    let Ok(auth_str) = auth_header.to_str() else {
        return Err(reject(StatusCode::UNAUTHORIZED, "bad_authorization"));
    };
    let Some(token) = auth_str.strip_prefix("Bearer ") else {
        return Err(reject(StatusCode::UNAUTHORIZED, "unsupported_scheme"));
    };

    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(state.config.jwt_secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|_| reject(StatusCode::UNAUTHORIZED, "invalid_token"))
}

async fn require_roles(
    state: AppState,
    mut req: Request,
    next: Next,
    allowed: &[UserRole],
) -> Response {
    let claims = match authenticate(&state, &req) {
        Ok(claims) => claims,
        Err(response) => return response,
    };
    if !allowed.is_empty() && !allowed.contains(&claims.role) {
        tracing::debug!(
            user = %claims.sub,
            role = %claims.role,
            path = %req.uri().path(),
            "role not permitted"
        );
        return reject(StatusCode::FORBIDDEN, "forbidden");
    }
    req.extensions_mut().insert(claims);
    next.run(req).await
}

/// Any signed-in user.
pub async fn require_bearer_auth(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    require_roles(state, req, next, &[]).await
}

/// Admins, recruiters and security officers.
pub async fn require_staff(State(state): State<AppState>, req: Request, next: Next) -> Response {
    require_roles(state, req, next, STAFF).await
}

/// Admins and recruiters.
pub async fn require_manager(State(state): State<AppState>, req: Request, next: Next) -> Response {
    require_roles(state, req, next, MANAGERS).await
}

pub async fn require_admin(State(state): State<AppState>, req: Request, next: Next) -> Response {
    require_roles(state, req, next, ADMINS).await
}
