use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use minijinja::{context, Environment};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::utils::time::to_display_date;

const INVITATION_TEMPLATE: &str = "invitation_email.html";
const SUBMISSION_TEMPLATE: &str = "submission_notice.html";

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("failed to render email: {0}")]
    Template(#[from] minijinja::Error),

    #[error("mail relay unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("mail relay answered {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// Proof that the relay accepted a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sent {
    pub message_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutgoingMail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub html: String,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, mail: &OutgoingMail) -> Result<Sent, MailError>;
}

/// Posts messages as JSON to an HTTP mail relay.
#[derive(Clone)]
pub struct HttpMailTransport {
    client: Client,
    url: String,
    token: Option<String>,
}

impl HttpMailTransport {
    pub fn new(client: Client, url: String, token: Option<String>) -> Self {
        Self { client, url, token }
    }
}

#[derive(Debug, Default, Deserialize)]
struct RelayReply {
    #[serde(default, alias = "messageId")]
    id: Option<String>,
}

#[async_trait]
impl MailTransport for HttpMailTransport {
    async fn send(&self, mail: &OutgoingMail) -> Result<Sent, MailError> {
        let mut request = self.client.post(&self.url).json(mail);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MailError::Rejected {
                status: status.as_u16(),
                body,
            });
        }
        // relays differ in what they echo back; an unreadable body still means accepted
        let reply = response.json::<RelayReply>().await.unwrap_or_default();
        Ok(Sent {
            message_id: reply.id,
        })
    }
}

#[derive(Debug, Clone)]
pub struct InvitationEmail {
    pub candidate_first_name: String,
    pub candidate_last_name: String,
    pub candidate_email: String,
    pub invitation_url: String,
    pub expires_at: DateTime<Utc>,
    pub recruiter_name: Option<String>,
    pub recruiter_email: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SubmissionNotice {
    pub recruiter_name: String,
    pub recruiter_email: String,
    pub candidate_name: String,
    pub candidate_email: String,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct MailService {
    transport: Arc<dyn MailTransport>,
    from: String,
    templates: Arc<Environment<'static>>,
}

impl MailService {
    pub fn new(transport: Arc<dyn MailTransport>, from: String) -> Result<Self, MailError> {
        let mut env = Environment::new();
        env.add_template(
            INVITATION_TEMPLATE,
            include_str!("../../templates/invitation_email.html"),
        )?;
        env.add_template(
            SUBMISSION_TEMPLATE,
            include_str!("../../templates/submission_notice.html"),
        )?;
        Ok(Self {
            transport,
            from,
            templates: Arc::new(env),
        })
    }

    /// Renders and sends the invitation link. One attempt; the caller decides
    /// what a failure means.
    pub async fn send_invitation_email(&self, email: InvitationEmail) -> Result<Sent, MailError> {
        let html = self.templates.get_template(INVITATION_TEMPLATE)?.render(context! {
            candidate_first_name => email.candidate_first_name,
            candidate_last_name => email.candidate_last_name,
            invitation_url => email.invitation_url,
            expiry_date => to_display_date(email.expires_at),
            recruiter_name => email.recruiter_name,
            recruiter_email => email.recruiter_email,
        })?;
        let mail = OutgoingMail {
            from: self.from.clone(),
            to: email.candidate_email,
            subject: "Invitation to complete your candidate questionnaire".to_string(),
            html,
        };
        let sent = self.transport.send(&mail).await?;
        tracing::info!(to = %mail.to, message_id = ?sent.message_id, "invitation email sent");
        Ok(sent)
    }

    pub async fn send_submission_notice(
        &self,
        notice: SubmissionNotice,
    ) -> Result<Sent, MailError> {
        let html = self.templates.get_template(SUBMISSION_TEMPLATE)?.render(context! {
            recruiter_name => notice.recruiter_name,
            candidate_name => notice.candidate_name,
            candidate_email => notice.candidate_email,
            submitted_date => to_display_date(notice.submitted_at),
        })?;
        let mail = OutgoingMail {
            from: self.from.clone(),
            to: notice.recruiter_email,
            subject: format!("Questionnaire submitted: {}", notice.candidate_name),
            html,
        };
        let sent = self.transport.send(&mail).await?;
        tracing::info!(to = %mail.to, "submission notice sent");
        Ok(sent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn invitation() -> InvitationEmail {
        InvitationEmail {
            candidate_first_name: "Ivan".into(),
            candidate_last_name: "Petrov".into(),
            candidate_email: "ivan@example.com".into(),
            invitation_url: "https://hr.example.com/questionnaire/abc".into(),
            expires_at: Utc.with_ymd_and_hms(2026, 3, 15, 12, 0, 0).unwrap(),
            recruiter_name: Some("Anna Smirnova".into()),
            recruiter_email: Some("anna@example.com".into()),
        }
    }

    #[tokio::test]
    async fn invitation_email_carries_link_and_expiry() {
        let mut transport = MockMailTransport::new();
        transport
            .expect_send()
            .withf(|mail| {
                mail.to == "ivan@example.com"
                    && mail.from == "hr@example.com"
                    && mail.html.contains(
                        "https:&#x2f;&#x2f;hr.example.com&#x2f;questionnaire&#x2f;abc",
                    )
                    && mail.html.contains("15.03.2026")
                    && mail.html.contains("Anna Smirnova")
            })
            .times(1)
            .returning(|_| {
                Ok(Sent {
                    message_id: Some("m-1".into()),
                })
            });

        let service = MailService::new(Arc::new(transport), "hr@example.com".into()).unwrap();
        let sent = service.send_invitation_email(invitation()).await.unwrap();
        assert_eq!(sent.message_id.as_deref(), Some("m-1"));
    }

    #[tokio::test]
    async fn template_values_are_html_escaped() {
        let mut transport = MockMailTransport::new();
        transport
            .expect_send()
            .withf(|mail| {
                mail.html.contains("&lt;b&gt;Anna&lt;&#x2f;b&gt;") && !mail.html.contains("<b>Anna")
            })
            .times(1)
            .returning(|_| Ok(Sent { message_id: None }));

        let service = MailService::new(Arc::new(transport), "hr@example.com".into()).unwrap();
        let mut email = invitation();
        email.recruiter_name = Some("<b>Anna</b>".into());
        service.send_invitation_email(email).await.unwrap();
    }

    #[tokio::test]
    async fn transport_failure_is_returned_to_caller() {
        let mut transport = MockMailTransport::new();
        transport.expect_send().returning(|_| {
            Err(MailError::Rejected {
                status: 503,
                body: "down".into(),
            })
        });
        let service = MailService::new(Arc::new(transport), "hr@example.com".into()).unwrap();
        let err = service.send_invitation_email(invitation()).await.unwrap_err();
        assert!(matches!(err, MailError::Rejected { status: 503, .. }));
    }

    #[tokio::test]
    async fn http_transport_posts_json_with_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/send"))
            .and(header("authorization", "Bearer relay-token"))
            .and(body_partial_json(serde_json::json!({
                "to": "ivan@example.com",
                "subject": "hello"
            })))
            .respond_with(
                ResponseTemplate::new(202).set_body_json(serde_json::json!({"id": "abc"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let transport = HttpMailTransport::new(
            Client::new(),
            format!("{}/send", server.uri()),
            Some("relay-token".into()),
        );
        let sent = transport
            .send(&OutgoingMail {
                from: "hr@example.com".into(),
                to: "ivan@example.com".into(),
                subject: "hello".into(),
                html: "<p>hi</p>".into(),
            })
            .await
            .unwrap();
        assert_eq!(sent.message_id.as_deref(), Some("abc"));
    }

    #[tokio::test]
    async fn http_transport_reports_rejection() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("relay broken"))
            .mount(&server)
            .await;

        let transport = HttpMailTransport::new(Client::new(), server.uri(), None);
        let err = transport
            .send(&OutgoingMail {
                from: "a@example.com".into(),
                to: "b@example.com".into(),
                subject: "s".into(),
                html: String::new(),
            })
            .await
            .unwrap_err();
        match err {
            MailError::Rejected { status, body } => {
                assert_eq!(status, 500);
                assert_eq!(body, "relay broken");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
