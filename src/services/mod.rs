pub mod auth_service;
pub mod candidate_service;
pub mod completeness;
pub mod invitation_service;
pub mod mail_service;
pub mod pdf_service;
pub mod questionnaire_service;
pub mod settings_service;
pub mod user_service;
