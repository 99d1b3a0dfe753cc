use crate::error::{Error, Result};
use dotenvy::dotenv;
use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    pub database_url: String,
    pub database_max_connections: u32,
    pub jwt_secret: String,
    pub frontend_url: String,
    pub mail_relay_url: String,
    pub mail_relay_token: Option<String>,
    pub mail_from: String,
    pub pdf_service_url: String,
    pub pdf_timeout_secs: u64,
    pub invitation_expiry_days: i64,
    pub public_rps: u32,
    pub api_rps: u32,
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let frontend_url = get_env("FRONTEND_URL")?;
        url::Url::parse(&frontend_url)
            .map_err(|e| Error::Config(format!("Invalid value for FRONTEND_URL: {}", e)))?;

        let invitation_expiry_days: i64 = get_env_parse_or("INVITATION_EXPIRY_DAYS", 14)?;
        if !(1..=90).contains(&invitation_expiry_days) {
            return Err(Error::Config(
                "INVITATION_EXPIRY_DAYS must be between 1 and 90".to_string(),
            ));
        }

        let log_format = match env::var("LOG_FORMAT").ok().as_deref() {
            Some("json") => LogFormat::Json,
            _ => LogFormat::Text,
        };

        Ok(Self {
            server_address: get_env("SERVER_ADDRESS")?,
            database_url: get_env("DATABASE_URL")?,
            database_max_connections: get_env_parse_or("DATABASE_MAX_CONNECTIONS", 20)?,
            jwt_secret: get_env("JWT_SECRET")?,
            frontend_url: frontend_url.trim_end_matches('/').to_string(),
            mail_relay_url: get_env("MAIL_RELAY_URL")?,
            mail_relay_token: env::var("MAIL_RELAY_TOKEN").ok().filter(|t| !t.is_empty()),
            mail_from: get_env("MAIL_FROM")?,
            pdf_service_url: get_env("PDF_SERVICE_URL")?,
            pdf_timeout_secs: get_env_parse_or("PDF_TIMEOUT_SECS", 30)?,
            invitation_expiry_days,
            public_rps: get_env_parse_or("PUBLIC_RPS", 20)?,
            api_rps: get_env_parse_or("API_RPS", 100)?,
            log_format,
        })
    }

    /// Link a candidate follows to open their questionnaire.
    pub fn invitation_url(&self, token: &str) -> String {
        format!("{}/questionnaire/{}", self.frontend_url, token)
    }
}

fn get_env(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::Config(format!("Missing environment variable: {}", name)))
}

fn get_env_parse_or<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e))),
        _ => Ok(default),
    }
}

#[cfg(test)]
impl Config {
    pub(crate) fn for_tests() -> Self {
        Self {
            server_address: "127.0.0.1:0".into(),
            database_url: "postgres://localhost/onboarding".into(),
            database_max_connections: 5,
            jwt_secret: "test-secret".into(),
            frontend_url: "https://hr.example.com".into(),
            mail_relay_url: "http://mail.local/send".into(),
            mail_relay_token: None,
            mail_from: "hr@example.com".into(),
            pdf_service_url: "http://pdf.local/convert".into(),
            pdf_timeout_secs: 30,
            invitation_expiry_days: 14,
            public_rps: 20,
            api_rps: 100,
            log_format: LogFormat::Text,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invitation_url_joins_frontend_and_token() {
        let config = Config::for_tests();
        assert_eq!(
            config.invitation_url("abc123"),
            "https://hr.example.com/questionnaire/abc123"
        );
    }

    #[test]
    fn numeric_env_falls_back_to_default() {
        std::env::remove_var("ONBOARDING_TEST_UNSET_NUMBER");
        let value: u32 = get_env_parse_or("ONBOARDING_TEST_UNSET_NUMBER", 7).unwrap();
        assert_eq!(value, 7);

        std::env::set_var("ONBOARDING_TEST_BAD_NUMBER", "many");
        let err = get_env_parse_or::<u32>("ONBOARDING_TEST_BAD_NUMBER", 7).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
