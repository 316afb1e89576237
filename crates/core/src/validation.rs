//! Coercion of raw patient input into typed data.
//!
//! [`PatientDataInput`] keeps every field as the string it arrived as. Coercion happens here, once,
//! when a caller needs numbers and vocabulary values (for example before building a prediction
//! request). A failure names the dotted field path and the offending value.

use crate::command::FieldPath;
use crate::record::{PatientDataInput, PatientRecord};
use crate::{CoreError, CoreResult};
use readmit_types::{Gender, HousingSituation, SupportSystem};
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Demographics {
    pub age: u32,
    pub gender: Option<Gender>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicalHistory {
    pub diagnosis_codes: Vec<String>,
    pub previous_admissions: u32,
    pub length_of_stay_days: f64,
    pub treatment_summary: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LabResults {
    pub key_lab_results_text: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SocialDeterminants {
    pub has_support_system: Option<bool>,
    pub housing_situation: Option<HousingSituation>,
}

/// Typed patient data produced by coercing a [`PatientDataInput`].
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedPatientData {
    pub demographics: Demographics,
    pub medical_history: MedicalHistory,
    pub lab_results: LabResults,
    pub social_determinants: SocialDeterminants,
}

impl TryFrom<&PatientDataInput> for ProcessedPatientData {
    type Error = CoreError;

    fn try_from(input: &PatientDataInput) -> CoreResult<Self> {
        Ok(Self {
            demographics: Demographics {
                age: required_count(input, FieldPath::Age)?,
                gender: optional_vocabulary::<Gender>(input, FieldPath::Gender)?,
            },
            medical_history: MedicalHistory {
                diagnosis_codes: split_codes(input.get(FieldPath::DiagnosisCodes)),
                previous_admissions: optional_count(input, FieldPath::PreviousAdmissions)?,
                length_of_stay_days: required_duration(input, FieldPath::LengthOfStayDays)?,
                treatment_summary: input.get(FieldPath::TreatmentSummary).trim().to_string(),
            },
            lab_results: LabResults {
                key_lab_results_text: input.get(FieldPath::KeyLabResultsText).trim().to_string(),
            },
            social_determinants: SocialDeterminants {
                has_support_system: optional_vocabulary::<SupportSystem>(
                    input,
                    FieldPath::HasSupportSystem,
                )?
                .map(SupportSystem::as_bool),
                housing_situation: optional_vocabulary::<HousingSituation>(
                    input,
                    FieldPath::HousingSituation,
                )?,
            },
        })
    }
}

/// Coercion outcome for one batch record.
#[derive(Debug)]
pub struct RecordValidation {
    pub id: String,
    pub outcome: CoreResult<ProcessedPatientData>,
}

impl RecordValidation {
    pub fn is_valid(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Coerces every record, reporting each outcome rather than stopping at the first failure.
pub fn validate_batch(records: &[PatientRecord]) -> Vec<RecordValidation> {
    records
        .iter()
        .map(|record| {
            let outcome = ProcessedPatientData::try_from(record.data());
            if let Err(err) = &outcome {
                tracing::warn!("record '{}' failed coercion: {}", record.id(), err);
            }
            RecordValidation {
                id: record.id().to_string(),
                outcome,
            }
        })
        .collect()
}

fn invalid(field: FieldPath, value: &str, reason: impl Into<String>) -> CoreError {
    CoreError::InvalidField {
        field: field.as_str(),
        value: value.to_string(),
        reason: reason.into(),
    }
}

fn required_count(input: &PatientDataInput, field: FieldPath) -> CoreResult<u32> {
    let raw = input.get(field).trim();
    if raw.is_empty() {
        return Err(invalid(field, raw, "value is required"));
    }
    raw.parse::<u32>()
        .map_err(|_| invalid(field, raw, "expected a non-negative whole number"))
}

fn optional_count(input: &PatientDataInput, field: FieldPath) -> CoreResult<u32> {
    if input.get(field).trim().is_empty() {
        return Ok(0);
    }
    required_count(input, field)
}

fn required_duration(input: &PatientDataInput, field: FieldPath) -> CoreResult<f64> {
    let raw = input.get(field).trim();
    if raw.is_empty() {
        return Err(invalid(field, raw, "value is required"));
    }
    match raw.parse::<f64>() {
        Ok(days) if days.is_finite() && days >= 0.0 => Ok(days),
        _ => Err(invalid(field, raw, "expected a non-negative number")),
    }
}

fn optional_vocabulary<T>(input: &PatientDataInput, field: FieldPath) -> CoreResult<Option<T>>
where
    T: std::str::FromStr<Err = readmit_types::VocabularyError>,
{
    let raw = input.get(field).trim();
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse::<T>()
        .map(Some)
        .map_err(|err| invalid(field, raw, err.to_string()))
}

fn split_codes(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|code| !code.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_input() -> PatientDataInput {
        let mut input = PatientDataInput::default();
        input.set(FieldPath::Age, "67");
        input.set(FieldPath::Gender, "male");
        input.set(FieldPath::DiagnosisCodes, " E11.9, I10 ,,J44.9 ");
        input.set(FieldPath::PreviousAdmissions, "2");
        input.set(FieldPath::LengthOfStayDays, "4.5");
        input.set(FieldPath::TreatmentSummary, "Insulin started");
        input.set(FieldPath::KeyLabResultsText, "HbA1c 9.1%");
        input.set(FieldPath::HasSupportSystem, "Yes");
        input.set(FieldPath::HousingSituation, "UNSTABLE");
        input
    }

    #[test]
    fn coerces_complete_input() {
        let processed = ProcessedPatientData::try_from(&complete_input()).expect("valid input");

        assert_eq!(processed.demographics.age, 67);
        assert_eq!(processed.demographics.gender, Some(Gender::Male));
        assert_eq!(
            processed.medical_history.diagnosis_codes,
            vec!["E11.9", "I10", "J44.9"]
        );
        assert_eq!(processed.medical_history.previous_admissions, 2);
        assert_eq!(processed.medical_history.length_of_stay_days, 4.5);
        assert_eq!(processed.social_determinants.has_support_system, Some(true));
        assert_eq!(
            processed.social_determinants.housing_situation,
            Some(HousingSituation::Unstable)
        );
    }

    #[test]
    fn empty_optional_fields_take_defaults() {
        let mut input = complete_input();
        input.set(FieldPath::Gender, "");
        input.set(FieldPath::PreviousAdmissions, " ");
        input.set(FieldPath::HasSupportSystem, "");
        input.set(FieldPath::HousingSituation, "");

        let processed = ProcessedPatientData::try_from(&input).expect("valid input");
        assert_eq!(processed.demographics.gender, None);
        assert_eq!(processed.medical_history.previous_admissions, 0);
        assert_eq!(processed.social_determinants.has_support_system, None);
        assert_eq!(processed.social_determinants.housing_situation, None);
    }

    #[test]
    fn missing_age_is_rejected() {
        let mut input = complete_input();
        input.set(FieldPath::Age, "");

        let err = ProcessedPatientData::try_from(&input).expect_err("age is required");
        assert!(matches!(
            err,
            CoreError::InvalidField { field: "demographics.age", ref reason, .. } if reason.contains("required")
        ));
    }

    #[test]
    fn negative_or_fractional_counts_are_rejected() {
        for bad in ["-1", "2.5", "two"] {
            let mut input = complete_input();
            input.set(FieldPath::PreviousAdmissions, bad);
            let err = ProcessedPatientData::try_from(&input).expect_err("should reject");
            assert!(matches!(
                err,
                CoreError::InvalidField { field: "medicalHistory.previousAdmissions", ref value, .. } if value == bad
            ));
        }
    }

    #[test]
    fn length_of_stay_must_be_non_negative() {
        let mut input = complete_input();
        input.set(FieldPath::LengthOfStayDays, "-3");
        assert!(ProcessedPatientData::try_from(&input).is_err());

        input.set(FieldPath::LengthOfStayDays, "NaN");
        assert!(ProcessedPatientData::try_from(&input).is_err());
    }

    #[test]
    fn unknown_vocabulary_value_names_the_field() {
        let mut input = complete_input();
        input.set(FieldPath::HousingSituation, "caravan");

        let err = ProcessedPatientData::try_from(&input).expect_err("should reject");
        let message = err.to_string();
        assert!(message.contains("socialDeterminants.housingSituation"));
        assert!(message.contains("caravan"));
    }

    #[test]
    fn validate_batch_reports_every_record() {
        let mut broken = complete_input();
        broken.set(FieldPath::Age, "old");
        let records = vec![
            PatientRecord::new("P1", complete_input()),
            PatientRecord::new("P2", broken),
            PatientRecord::new("P3", complete_input()),
        ];

        let outcomes = validate_batch(&records);
        let summary: Vec<(&str, bool)> = outcomes
            .iter()
            .map(|o| (o.id.as_str(), o.is_valid()))
            .collect();
        assert_eq!(summary, vec![("P1", true), ("P2", false), ("P3", true)]);
    }
}
