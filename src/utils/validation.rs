//! Field-format checks used by the request DTOs. Blank values pass: a blank
//! field is simply not filled in yet, which only matters at submit time.

use std::borrow::Cow;

use chrono::NaiveDate;
use validator::ValidationError;

fn invalid(code: &'static str, message: &'static str) -> ValidationError {
    ValidationError::new(code).with_message(Cow::Borrowed(message))
}

fn is_digits(value: &str, len: usize) -> bool {
    value.len() == len && value.bytes().all(|b| b.is_ascii_digit())
}

pub fn passport_series(value: &str) -> Result<(), ValidationError> {
    let value = value.trim();
    if value.is_empty() || is_digits(value, 4) {
        Ok(())
    } else {
        Err(invalid("passport_series", "Passport series must be 4 digits"))
    }
}

pub fn passport_number(value: &str) -> Result<(), ValidationError> {
    let value = value.trim();
    if value.is_empty() || is_digits(value, 6) {
        Ok(())
    } else {
        Err(invalid("passport_number", "Passport number must be 6 digits"))
    }
}

/// Issuing department code, `NNN-NNN`.
pub fn passport_issuer_code(value: &str) -> Result<(), ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(());
    }
    match value.split_once('-') {
        Some((left, right)) if is_digits(left, 3) && is_digits(right, 3) => Ok(()),
        _ => Err(invalid(
            "passport_issuer_code",
            "Issuer code must look like 123-456",
        )),
    }
}

pub fn iso_date(value: &str) -> Result<(), ValidationError> {
    let value = value.trim();
    if value.is_empty() || NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok() {
        Ok(())
    } else {
        Err(invalid("date", "Date must be in YYYY-MM-DD format"))
    }
}

pub fn phone(value: &str) -> Result<(), ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(());
    }
    let digits = value.chars().filter(|c| c.is_ascii_digit()).count();
    let allowed = value
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | ' ' | '-' | '(' | ')'));
    if allowed && (10..=15).contains(&digits) {
        Ok(())
    } else {
        Err(invalid("phone", "Phone number is not valid"))
    }
}

pub fn optional_email(value: &str) -> Result<(), ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(());
    }
    match value.split_once('@') {
        Some((local, domain))
            if !local.is_empty() && domain.contains('.') && !domain.starts_with('.') =>
        {
            Ok(())
        }
        _ => Err(invalid("email", "Email address is not valid")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passport_patterns() {
        assert!(passport_series("4510").is_ok());
        assert!(passport_series("45 10").is_err());
        assert!(passport_number("123456").is_ok());
        assert!(passport_number("12345").is_err());
        assert!(passport_issuer_code("770-001").is_ok());
        assert!(passport_issuer_code("770001").is_err());
        assert!(passport_issuer_code("77-0001").is_err());
    }

    #[test]
    fn blanks_are_accepted_while_drafting() {
        assert!(passport_series("").is_ok());
        assert!(passport_issuer_code("  ").is_ok());
        assert!(iso_date("").is_ok());
        assert!(phone("").is_ok());
        assert!(optional_email("").is_ok());
    }

    #[test]
    fn dates_must_be_well_formed() {
        assert!(iso_date("1990-05-17").is_ok());
        assert!(iso_date("1990-02-30").is_err());
        assert!(iso_date("17.05.1990").is_err());
    }

    #[test]
    fn phones_and_emails() {
        assert!(phone("+7 (999) 123-45-67").is_ok());
        assert!(phone("12345").is_err());
        assert!(phone("+7 999 abc").is_err());
        assert!(optional_email("ivan@x.com").is_ok());
        assert!(optional_email("ivan@").is_err());
    }
}
