use axum::{
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::json;

use crate::services::mail_service::MailError;
use crate::services::pdf_service::PdfError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Questionnaire is incomplete")]
    Incomplete(Vec<String>),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Mail delivery error: {0}")]
    Mail(#[from] MailError),

    #[error("PDF rendering error: {0}")]
    Pdf(#[from] PdfError),

    #[error("Token error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for Error {
    fn into_response(self) -> axum::response::Response {
        let (status, body) = match self {
            Error::BadRequest(msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
            Error::Incomplete(errors) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": "Questionnaire is incomplete", "errors": errors }),
            ),
            Error::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, json!({ "error": msg })),
            Error::Forbidden(msg) => (StatusCode::FORBIDDEN, json!({ "error": msg })),
            Error::NotFound(msg) => (StatusCode::NOT_FOUND, json!({ "error": msg })),
            Error::Conflict(msg) => (StatusCode::CONFLICT, json!({ "error": msg })),
            Error::Validation(err) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": "Validation failed", "fields": err }),
            ),
            Error::Json(err) => (StatusCode::BAD_REQUEST, json!({ "error": err.to_string() })),
            Error::Mail(err) => {
                tracing::error!(error = %err, "mail delivery failed");
                (
                    StatusCode::BAD_GATEWAY,
                    json!({ "error": format!("Mail service error: {}", err) }),
                )
            }
            Error::Pdf(err) => {
                tracing::error!(error = %err, "pdf rendering failed");
                (
                    StatusCode::BAD_GATEWAY,
                    json!({ "error": format!("PDF service error: {}", err) }),
                )
            }
            Error::Jwt(_) => (
                StatusCode::UNAUTHORIZED,
                json!({ "error": "invalid_token" }),
            ),
            Error::Database(err) => {
                tracing::error!(error = %err, "database error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "A database error occurred" }),
                )
            }
            other => {
                tracing::error!(error = %other, "unhandled error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "An unexpected error occurred" }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => Error::NotFound("Resource not found".to_string()),
            other => Error::Database(other),
        }
    }
}
