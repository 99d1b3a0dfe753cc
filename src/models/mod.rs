pub mod candidate;
pub mod invitation;
pub mod questionnaire;
pub mod settings;
pub mod user;
