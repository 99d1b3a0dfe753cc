use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use minijinja::{context, Environment};
use reqwest::Client;
use serde_json::json;

use crate::dto::questionnaire_dto::QuestionnaireView;
use crate::utils::time::{now, to_display_date};

const QUESTIONNAIRE_TEMPLATE: &str = "questionnaire_pdf.html";

#[derive(Debug, thiserror::Error)]
pub enum PdfError {
    #[error("failed to render questionnaire html: {0}")]
    Template(#[from] minijinja::Error),

    #[error("pdf converter unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("pdf converter answered {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("pdf converter returned an empty document")]
    Empty,
}

/// Turns an HTML document into PDF bytes.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PdfConverter: Send + Sync {
    async fn convert(&self, html: String) -> Result<Bytes, PdfError>;
}

#[derive(Clone)]
pub struct HttpPdfConverter {
    client: Client,
    url: String,
    timeout: Duration,
}

impl HttpPdfConverter {
    pub fn new(client: Client, url: String, timeout: Duration) -> Self {
        Self {
            client,
            url,
            timeout,
        }
    }
}

#[async_trait]
impl PdfConverter for HttpPdfConverter {
    async fn convert(&self, html: String) -> Result<Bytes, PdfError> {
        let response = self
            .client
            .post(&self.url)
            .timeout(self.timeout)
            .json(&json!({
                "html": html,
                "options": { "format": "A4", "printBackground": true }
            }))
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PdfError::Rejected {
                status: status.as_u16(),
                body,
            });
        }
        let document = response.bytes().await?;
        if document.is_empty() {
            return Err(PdfError::Empty);
        }
        Ok(document)
    }
}

#[derive(Clone)]
pub struct PdfService {
    converter: Arc<dyn PdfConverter>,
    templates: Arc<Environment<'static>>,
}

impl PdfService {
    pub fn new(converter: Arc<dyn PdfConverter>) -> Result<Self, PdfError> {
        let mut env = Environment::new();
        env.add_template(
            QUESTIONNAIRE_TEMPLATE,
            include_str!("../../templates/questionnaire_pdf.html"),
        )?;
        Ok(Self {
            converter,
            templates: Arc::new(env),
        })
    }

    pub fn render_html(&self, view: &QuestionnaireView) -> Result<String, PdfError> {
        let data = &view.data;
        let registration_address = data
            .registration_address
            .as_ref()
            .map(|a| a.one_line())
            .unwrap_or_default();
        let actual_address = if data.actual_address_same_as_registration == Some(true) {
            "Same as registration address".to_string()
        } else {
            data.actual_address
                .as_ref()
                .map(|a| a.one_line())
                .unwrap_or_default()
        };

        let html = self
            .templates
            .get_template(QUESTIONNAIRE_TEMPLATE)?
            .render(context! {
                candidate => &view.candidate,
                data => data,
                status => view.status.as_str(),
                submitted_date => view.submitted_at.map(to_display_date),
                generated_date => to_display_date(now()),
                registration_address => registration_address,
                actual_address => actual_address,
            })?;
        Ok(html)
    }

    /// Renders the questionnaire and has the external converter print it.
    /// No retries and no caching.
    pub async fn render_questionnaire_pdf(
        &self,
        view: &QuestionnaireView,
    ) -> Result<Bytes, PdfError> {
        let html = self.render_html(view)?;
        let started = std::time::Instant::now();
        let document = self.converter.convert(html).await?;
        tracing::info!(
            questionnaire_id = %view.id,
            bytes = document.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "questionnaire pdf rendered"
        );
        Ok(document)
    }
}
