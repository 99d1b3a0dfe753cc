use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Questionnaire {
    pub id: Uuid,
    pub candidate_id: Uuid,
    pub data: QuestionnaireData,
    pub status: QuestionnaireStatus,
    pub submitted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Questionnaire {
    pub fn draft(candidate_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            candidate_id,
            data: QuestionnaireData::default(),
            status: QuestionnaireStatus::Draft,
            submitted_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_submitted(&self) -> bool {
        self.status == QuestionnaireStatus::Submitted
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum QuestionnaireStatus {
    Draft,
    Submitted,
}

impl QuestionnaireStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionnaireStatus::Draft => "draft",
            QuestionnaireStatus::Submitted => "submitted",
        }
    }
}

impl fmt::Display for QuestionnaireStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuestionnaireStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(QuestionnaireStatus::Draft),
            "submitted" => Ok(QuestionnaireStatus::Submitted),
            other => Err(format!("Unknown questionnaire status: {}", other)),
        }
    }
}

/// Everything the candidate fills in. Every field is optional while drafting;
/// completeness is only enforced at submit time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct QuestionnaireData {
    #[validate(custom(function = "crate::utils::validation::phone"))]
    pub phone: Option<String>,
    #[validate(custom(function = "crate::utils::validation::optional_email"))]
    pub email: Option<String>,
    #[validate(custom(function = "crate::utils::validation::phone"))]
    pub additional_phone: Option<String>,

    #[validate(custom(function = "crate::utils::validation::passport_series"))]
    pub passport_series: Option<String>,
    #[validate(custom(function = "crate::utils::validation::passport_number"))]
    pub passport_number: Option<String>,
    pub passport_issuer: Option<String>,
    #[validate(custom(function = "crate::utils::validation::iso_date"))]
    pub passport_issue_date: Option<String>,
    #[validate(custom(function = "crate::utils::validation::passport_issuer_code"))]
    pub passport_issuer_code: Option<String>,

    #[validate(custom(function = "crate::utils::validation::iso_date"))]
    pub birth_date: Option<String>,
    pub birth_place: Option<String>,
    pub citizenship: Option<String>,
    pub inn: Option<String>,
    pub snils: Option<String>,

    pub registration_address: Option<Address>,
    pub actual_address: Option<Address>,
    pub actual_address_same_as_registration: Option<bool>,

    #[serde(deserialize_with = "null_as_default")]
    pub education: Vec<EducationEntry>,
    #[serde(deserialize_with = "null_as_default")]
    pub work_experience: Vec<WorkExperienceEntry>,
    #[serde(deserialize_with = "null_as_default")]
    pub family_members: Vec<FamilyMember>,
    #[serde(deserialize_with = "null_as_default")]
    pub references: Vec<Reference>,

    pub marital_status: Option<String>,
    pub military_service_status: Option<String>,

    pub consents: Option<Consents>,
    pub additional_info: Option<String>,
}

impl QuestionnaireData {
    /// Shallow merge: every top-level key present in `patch` replaces the stored
    /// value, an explicit `null` clears it, absent keys are left untouched.
    pub fn merged_with(&self, patch: &Map<String, JsonValue>) -> serde_json::Result<Self> {
        let mut current = match serde_json::to_value(self)? {
            JsonValue::Object(map) => map,
            _ => Map::new(),
        };
        for (key, value) in patch {
            current.insert(key.clone(), value.clone());
        }
        serde_json::from_value(JsonValue::Object(current))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct Address {
    pub region: Option<String>,
    pub city: Option<String>,
    pub street: Option<String>,
    pub house: Option<String>,
    pub building: Option<String>,
    pub apartment: Option<String>,
    pub postal_code: Option<String>,
}

impl Address {
    pub fn is_blank(&self) -> bool {
        [
            &self.region,
            &self.city,
            &self.street,
            &self.house,
            &self.building,
            &self.apartment,
            &self.postal_code,
        ]
        .iter()
        .all(|part| part.as_deref().map_or(true, |p| p.trim().is_empty()))
    }

    pub fn one_line(&self) -> String {
        [
            &self.postal_code,
            &self.region,
            &self.city,
            &self.street,
            &self.house,
            &self.building,
            &self.apartment,
        ]
        .iter()
        .filter_map(|part| part.as_deref())
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct EducationEntry {
    pub institution: Option<String>,
    pub degree: Option<String>,
    pub specialty: Option<String>,
    pub start_year: Option<i32>,
    pub end_year: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct WorkExperienceEntry {
    pub company: Option<String>,
    pub position: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub responsibilities: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct FamilyMember {
    pub relation: Option<String>,
    pub full_name: Option<String>,
    pub birth_date: Option<String>,
    pub occupation: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct Reference {
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub relation: Option<String>,
    pub company: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct Consents {
    #[serde(deserialize_with = "null_as_default")]
    pub pdn_consent: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub background_check_consent: bool,
    pub photo_consent: Option<bool>,
    pub medical_check_consent: Option<bool>,
}

/// `null` reads as the field's empty value, so a patch can clear lists and flags.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn merge_overwrites_only_present_keys() {
        let stored = QuestionnaireData {
            birth_place: Some("Kazan".into()),
            passport_series: Some("4510".into()),
            ..Default::default()
        };
        let patch = json!({ "birthPlace": "Moscow" });
        let merged = stored.merged_with(patch.as_object().unwrap()).unwrap();
        assert_eq!(merged.birth_place.as_deref(), Some("Moscow"));
        assert_eq!(merged.passport_series.as_deref(), Some("4510"));
    }

    #[test]
    fn explicit_null_clears_field() {
        let stored = QuestionnaireData {
            birth_place: Some("Kazan".into()),
            ..Default::default()
        };
        let patch = json!({ "birthPlace": null });
        let merged = stored.merged_with(patch.as_object().unwrap()).unwrap();
        assert_eq!(merged.birth_place, None);
    }

    #[test]
    fn merge_replaces_nested_arrays_wholesale() {
        let stored = QuestionnaireData {
            education: vec![EducationEntry {
                institution: Some("MSU".into()),
                ..Default::default()
            }],
            ..Default::default()
        };
        let patch = json!({ "education": [{ "institution": "SPbU" }, { "institution": "HSE" }] });
        let merged = stored.merged_with(patch.as_object().unwrap()).unwrap();
        assert_eq!(merged.education.len(), 2);
        assert_eq!(merged.education[0].institution.as_deref(), Some("SPbU"));
    }

    #[test]
    fn null_clears_lists_and_consent_flags() {
        let stored = QuestionnaireData {
            education: vec![EducationEntry {
                institution: Some("MSU".into()),
                ..Default::default()
            }],
            references: vec![Reference::default()],
            consents: Some(Consents {
                pdn_consent: true,
                background_check_consent: true,
                ..Default::default()
            }),
            ..Default::default()
        };
        let patch = json!({
            "education": null,
            "references": null,
            "consents": { "pdnConsent": null, "backgroundCheckConsent": true }
        });
        let merged = stored.merged_with(patch.as_object().unwrap()).unwrap();
        assert!(merged.education.is_empty());
        assert!(merged.references.is_empty());
        let consents = merged.consents.unwrap();
        assert!(!consents.pdn_consent);
        assert!(consents.background_check_consent);
    }

    #[test]
    fn merge_rejects_wrong_types() {
        let patch = json!({ "education": "none" });
        assert!(QuestionnaireData::default()
            .merged_with(patch.as_object().unwrap())
            .is_err());
    }

    #[test]
    fn address_one_line_skips_blanks() {
        let address = Address {
            city: Some("Moscow".into()),
            street: Some("Tverskaya".into()),
            house: Some("1".into()),
            apartment: Some("  ".into()),
            ..Default::default()
        };
        assert_eq!(address.one_line(), "Moscow, Tverskaya, 1");
        assert!(!address.is_blank());
        assert!(Address::default().is_blank());
    }
}
