#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use bytes::Bytes;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::Value as JsonValue;
use tower::ServiceExt;

use onboarding_backend::{
    config::{Config, LogFormat},
    middleware::auth::Claims,
    models::user::{User, UserRole},
    repositories::Repositories,
    routes::build_router,
    services::{
        mail_service::{MailError, MailTransport, OutgoingMail, Sent},
        pdf_service::{PdfConverter, PdfError},
    },
    AppState,
};

pub const JWT_SECRET: &str = "test_secret_key";

/// Keeps every message it is handed; can be switched to fail.
#[derive(Default)]
pub struct RecordingTransport {
    pub sent: Mutex<Vec<OutgoingMail>>,
    pub fail: AtomicBool,
}

impl RecordingTransport {
    pub fn messages(&self) -> Vec<OutgoingMail> {
        self.sent.lock().unwrap().clone()
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl MailTransport for RecordingTransport {
    async fn send(&self, mail: &OutgoingMail) -> Result<Sent, MailError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(MailError::Rejected {
                status: 503,
                body: "relay unavailable".into(),
            });
        }
        self.sent.lock().unwrap().push(mail.clone());
        Ok(Sent { message_id: None })
    }
}

#[derive(Default)]
pub struct StubPdf {
    pub fail: AtomicBool,
    pub last_html: Mutex<Option<String>>,
}

#[async_trait]
impl PdfConverter for StubPdf {
    async fn convert(&self, html: String) -> Result<Bytes, PdfError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(PdfError::Empty);
        }
        *self.last_html.lock().unwrap() = Some(html);
        Ok(Bytes::from_static(b"%PDF-1.7 stub"))
    }
}

pub fn test_config() -> Config {
    Config {
        server_address: "127.0.0.1:0".into(),
        database_url: "postgres://unused".into(),
        database_max_connections: 1,
        jwt_secret: JWT_SECRET.into(),
        frontend_url: "https://hr.example.com".into(),
        mail_relay_url: "http://mail.invalid/send".into(),
        mail_relay_token: None,
        mail_from: "hr@example.com".into(),
        pdf_service_url: "http://pdf.invalid/convert".into(),
        pdf_timeout_secs: 5,
        invitation_expiry_days: 14,
        public_rps: 1000,
        api_rps: 1000,
        log_format: LogFormat::Text,
    }
}

pub struct TestApp {
    pub router: Router,
    pub repos: Repositories,
    pub mail: Arc<RecordingTransport>,
    pub pdf: Arc<StubPdf>,
}

pub fn spawn_app() -> TestApp {
    spawn_app_with(test_config())
}

pub fn spawn_app_with(config: Config) -> TestApp {
    let repos = Repositories::in_memory();
    let mail = Arc::new(RecordingTransport::default());
    let pdf = Arc::new(StubPdf::default());
    let state = AppState::new(Arc::new(config), repos.clone(), mail.clone(), pdf.clone())
        .expect("app state");
    let router = build_router(state).expect("router");
    TestApp {
        router,
        repos,
        mail,
        pdf,
    }
}

pub fn token_for(user: &User) -> String {
    let claims = Claims {
        sub: user.id.to_string(),
        exp: (chrono::Utc::now() + chrono::Duration::hours(1)).timestamp() as usize,
        role: user.role,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .unwrap()
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: axum::http::HeaderMap,
    pub bytes: Bytes,
}

impl TestResponse {
    pub fn json(&self) -> JsonValue {
        serde_json::from_slice(&self.bytes).unwrap_or(JsonValue::Null)
    }
}

impl TestApp {
    pub async fn seed_user(&self, email: &str, role: UserRole) -> (User, String) {
        let user = self
            .repos
            .users
            .insert(User::new(
                email,
                "not-a-real-hash".into(),
                "Anna".into(),
                "Smirnova".into(),
                role,
            ))
            .await
            .unwrap();
        let token = token_for(&user);
        (user, token)
    }

    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<JsonValue>,
        extra_headers: &[(&str, &str)],
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }
        for (name, value) in extra_headers {
            builder = builder.header(*name, *value);
        }
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), 10 * 1024 * 1024).await.unwrap();
        TestResponse {
            status,
            headers,
            bytes,
        }
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.send("GET", uri, token, None, &[]).await
    }

    pub async fn post(
        &self,
        uri: &str,
        token: Option<&str>,
        body: Option<JsonValue>,
    ) -> TestResponse {
        self.send("POST", uri, token, body, &[]).await
    }

    /// Issues an invitation through the API and returns its JSON body.
    pub async fn invite(&self, recruiter_token: &str, email: &str) -> JsonValue {
        let response = self
            .post(
                "/api/v1/invitations",
                Some(recruiter_token),
                Some(serde_json::json!({
                    "firstName": "Ivan",
                    "lastName": "Petrov",
                    "email": email,
                    "phone": "+79001234567"
                })),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.json());
        response.json()
    }
}

pub fn complete_questionnaire() -> JsonValue {
    serde_json::json!({
        "passportSeries": "4510",
        "passportNumber": "123456",
        "passportIssuer": "MVD Moscow",
        "passportIssueDate": "2015-06-01",
        "passportIssuerCode": "770-001",
        "birthDate": "1990-01-01",
        "birthPlace": "Moscow",
        "registrationAddress": { "city": "Moscow", "street": "Arbat", "house": "1" },
        "actualAddressSameAsRegistration": true,
        "education": [{ "institution": "MSU", "degree": "Master", "startYear": 2007, "endYear": 2012 }],
        "consents": { "pdnConsent": true, "backgroundCheckConsent": true }
    })
}
