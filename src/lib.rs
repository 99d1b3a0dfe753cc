pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod utils;

use std::sync::Arc;

use crate::config::Config;
use crate::repositories::Repositories;
use crate::services::{
    auth_service::AuthService, candidate_service::CandidateService,
    invitation_service::InvitationService,
    mail_service::{MailService, MailTransport},
    pdf_service::{PdfConverter, PdfService},
    questionnaire_service::QuestionnaireService, settings_service::SettingsService,
    user_service::UserService,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub auth_service: AuthService,
    pub candidate_service: CandidateService,
    pub invitation_service: InvitationService,
    pub questionnaire_service: QuestionnaireService,
    pub pdf_service: PdfService,
    pub settings_service: SettingsService,
    pub user_service: UserService,
}

impl AppState {
    /// Wires every service onto one set of repositories and the two outbound
    /// transports.
    pub fn new(
        config: Arc<Config>,
        repos: Repositories,
        mail_transport: Arc<dyn MailTransport>,
        pdf_converter: Arc<dyn PdfConverter>,
    ) -> error::Result<Self> {
        let mail_service = MailService::new(mail_transport, config.mail_from.clone())?;
        let pdf_service = PdfService::new(pdf_converter)?;

        let settings_service = SettingsService::new(repos.clone());
        let auth_service = AuthService::new(
            repos.clone(),
            settings_service.clone(),
            config.jwt_secret.clone(),
        );
        let invitation_service =
            InvitationService::new(repos.clone(), mail_service.clone(), config.clone());
        let questionnaire_service = QuestionnaireService::new(
            repos.clone(),
            invitation_service.clone(),
            mail_service,
        );
        let candidate_service = CandidateService::new(repos.clone(), invitation_service.clone());
        let user_service = UserService::new(repos);

        Ok(Self {
            config,
            auth_service,
            candidate_service,
            invitation_service,
            questionnaire_service,
            pdf_service,
            settings_service,
            user_service,
        })
    }
}
