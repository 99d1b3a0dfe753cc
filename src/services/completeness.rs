//! Submit-time completeness rules for a questionnaire. Format checks happen on
//! every save; these only decide whether a draft may be submitted.

use crate::models::questionnaire::{Address, QuestionnaireData};

fn missing(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |v| v.trim().is_empty())
}

fn missing_address(value: &Option<Address>) -> bool {
    value.as_ref().map_or(true, Address::is_blank)
}

/// Returns every reason the questionnaire cannot be submitted yet, in form
/// order. An empty list means it is complete.
pub fn check_completeness(data: &QuestionnaireData) -> Vec<String> {
    let mut errors = Vec::new();
    let mut require = |absent: bool, message: &str| {
        if absent {
            errors.push(message.to_string());
        }
    };

    require(missing(&data.passport_series), "Passport series is required");
    require(missing(&data.passport_number), "Passport number is required");
    require(missing(&data.passport_issuer), "Passport issuer is required");
    require(
        missing(&data.passport_issue_date),
        "Passport issue date is required",
    );
    require(
        missing(&data.passport_issuer_code),
        "Passport issuer code is required",
    );
    require(missing(&data.birth_date), "Birth date is required");
    require(missing(&data.birth_place), "Birth place is required");
    require(
        missing_address(&data.registration_address),
        "Registration address is required",
    );
    // an unanswered "same as registration" box counts as a separate address
    require(
        data.actual_address_same_as_registration != Some(true)
            && missing_address(&data.actual_address),
        "Actual address is required",
    );
    require(
        data.education.is_empty(),
        "At least one education entry is required",
    );

    let consents = data.consents.as_ref();
    require(
        !consents.map_or(false, |c| c.pdn_consent),
        "Consent to personal data processing is required",
    );
    require(
        !consents.map_or(false, |c| c.background_check_consent),
        "Consent to background check is required",
    );

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::questionnaire::{Consents, EducationEntry};

    fn complete() -> QuestionnaireData {
        QuestionnaireData {
            passport_series: Some("4510".into()),
            passport_number: Some("123456".into()),
            passport_issuer: Some("MVD Moscow".into()),
            passport_issue_date: Some("2015-06-01".into()),
            passport_issuer_code: Some("770-001".into()),
            birth_date: Some("1990-01-01".into()),
            birth_place: Some("Moscow".into()),
            registration_address: Some(Address {
                city: Some("Moscow".into()),
                street: Some("Arbat".into()),
                ..Default::default()
            }),
            actual_address_same_as_registration: Some(true),
            education: vec![EducationEntry {
                institution: Some("MSU".into()),
                ..Default::default()
            }],
            consents: Some(Consents {
                pdn_consent: true,
                background_check_consent: true,
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn complete_questionnaire_passes() {
        assert!(check_completeness(&complete()).is_empty());
    }

    #[test]
    fn empty_draft_lists_every_requirement() {
        let errors = check_completeness(&QuestionnaireData::default());
        assert_eq!(
            errors,
            vec![
                "Passport series is required",
                "Passport number is required",
                "Passport issuer is required",
                "Passport issue date is required",
                "Passport issuer code is required",
                "Birth date is required",
                "Birth place is required",
                "Registration address is required",
                "Actual address is required",
                "At least one education entry is required",
                "Consent to personal data processing is required",
                "Consent to background check is required",
            ]
        );
    }

    #[test]
    fn actual_address_needed_only_when_it_differs() {
        let mut data = complete();
        data.passport_series = None;
        data.actual_address_same_as_registration = Some(false);
        data.actual_address = None;
        let errors = check_completeness(&data);
        assert!(errors.contains(&"Passport series is required".to_string()));
        assert!(errors.contains(&"Actual address is required".to_string()));

        data.actual_address_same_as_registration = Some(true);
        let errors = check_completeness(&data);
        assert!(errors.contains(&"Passport series is required".to_string()));
        assert!(!errors.contains(&"Actual address is required".to_string()));
    }

    #[test]
    fn unanswered_same_address_box_needs_actual_address() {
        let mut data = complete();
        data.actual_address_same_as_registration = None;
        assert_eq!(check_completeness(&data), vec!["Actual address is required"]);

        data.actual_address = Some(Address {
            city: Some("Kazan".into()),
            ..Default::default()
        });
        assert!(check_completeness(&data).is_empty());
    }

    #[test]
    fn blank_strings_count_as_missing() {
        let mut data = complete();
        data.birth_place = Some("   ".into());
        data.registration_address = Some(Address {
            city: Some(" ".into()),
            ..Default::default()
        });
        assert_eq!(
            check_completeness(&data),
            vec!["Birth place is required", "Registration address is required"]
        );
    }

    #[test]
    fn consents_must_be_given() {
        let mut data = complete();
        data.consents = Some(Consents {
            pdn_consent: true,
            background_check_consent: false,
            photo_consent: None,
            medical_check_consent: None,
        });
        assert_eq!(
            check_completeness(&data),
            vec!["Consent to background check is required"]
        );
    }
}
