pub mod auth_dto;
pub mod candidate_dto;
pub mod invitation_dto;
pub mod questionnaire_dto;
pub mod settings_dto;
pub mod user_dto;

use serde::Deserialize;

pub(crate) fn trim_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    String::deserialize(deserializer).map(|s| s.trim().to_string())
}

/// Trims the value and turns an empty string into `None`.
pub(crate) fn trim_optional_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    Ok(opt.and_then(|s| {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }))
}
