//! Patient record input model.
//!
//! Every field is held as the raw string it arrived as, whether from a batch cell or a voice fill
//! command. Numeric-looking fields are not coerced here; see [`crate::validation`] for the explicit
//! coercion step.

use crate::command::{FieldPath, FieldValue};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DemographicsInput {
    pub age: String,
    pub gender: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicalHistoryInput {
    /// Comma-separated codes, kept verbatim.
    pub diagnosis_codes: String,
    pub previous_admissions: String,
    pub length_of_stay_days: String,
    pub treatment_summary: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabResultsInput {
    pub key_lab_results_text: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SocialDeterminantsInput {
    pub has_support_system: String,
    pub housing_situation: String,
}

/// The four sections of patient input, as filled by the form or a batch row.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientDataInput {
    pub demographics: DemographicsInput,
    pub medical_history: MedicalHistoryInput,
    pub lab_results: LabResultsInput,
    pub social_determinants: SocialDeterminantsInput,
}

impl PatientDataInput {
    /// Returns the raw value held at `field`.
    pub fn get(&self, field: FieldPath) -> &str {
        match field {
            FieldPath::Age => &self.demographics.age,
            FieldPath::Gender => &self.demographics.gender,
            FieldPath::DiagnosisCodes => &self.medical_history.diagnosis_codes,
            FieldPath::PreviousAdmissions => &self.medical_history.previous_admissions,
            FieldPath::LengthOfStayDays => &self.medical_history.length_of_stay_days,
            FieldPath::TreatmentSummary => &self.medical_history.treatment_summary,
            FieldPath::KeyLabResultsText => &self.lab_results.key_lab_results_text,
            FieldPath::HasSupportSystem => &self.social_determinants.has_support_system,
            FieldPath::HousingSituation => &self.social_determinants.housing_situation,
        }
    }

    fn slot_mut(&mut self, field: FieldPath) -> &mut String {
        match field {
            FieldPath::Age => &mut self.demographics.age,
            FieldPath::Gender => &mut self.demographics.gender,
            FieldPath::DiagnosisCodes => &mut self.medical_history.diagnosis_codes,
            FieldPath::PreviousAdmissions => &mut self.medical_history.previous_admissions,
            FieldPath::LengthOfStayDays => &mut self.medical_history.length_of_stay_days,
            FieldPath::TreatmentSummary => &mut self.medical_history.treatment_summary,
            FieldPath::KeyLabResultsText => &mut self.lab_results.key_lab_results_text,
            FieldPath::HasSupportSystem => &mut self.social_determinants.has_support_system,
            FieldPath::HousingSituation => &mut self.social_determinants.housing_situation,
        }
    }

    /// Replaces the raw value held at `field`.
    pub fn set(&mut self, field: FieldPath, value: impl Into<String>) {
        *self.slot_mut(field) = value.into();
    }

    /// Writes a fill-command payload into the addressed field.
    ///
    /// Numeric payloads are stored in their text form.
    pub fn apply(&mut self, field: FieldPath, value: &FieldValue) {
        self.set(field, value.to_string());
    }

    /// Resets every field to empty.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// One patient row from a batch.
///
/// Immutable once constructed by the parser; a new upload replaces the whole batch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientRecord {
    id: String,
    data: PatientDataInput,
}

impl PatientRecord {
    pub fn new(id: impl Into<String>, data: PatientDataInput) -> Self {
        Self {
            id: id.into(),
            data,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn data(&self) -> &PatientDataInput {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_writes_each_field() {
        let mut input = PatientDataInput::default();
        for field in FieldPath::ALL {
            input.apply(field, &FieldValue::text(field.key()));
        }
        for field in FieldPath::ALL {
            assert_eq!(input.get(field), field.key());
        }
    }

    #[test]
    fn apply_renders_numbers_as_text() {
        let mut input = PatientDataInput::default();
        input.apply(FieldPath::Age, &FieldValue::Integer(72));
        input.apply(FieldPath::LengthOfStayDays, &FieldValue::Number(3.5));

        assert_eq!(input.demographics.age, "72");
        assert_eq!(input.medical_history.length_of_stay_days, "3.5");
    }

    #[test]
    fn clear_resets_every_section() {
        let mut input = PatientDataInput::default();
        input.apply(FieldPath::Gender, &FieldValue::text("Female"));
        input.apply(FieldPath::HousingSituation, &FieldValue::text("Stable"));
        input.clear();

        assert_eq!(input, PatientDataInput::default());
    }

    #[test]
    fn serialises_with_camel_case_sections() {
        let mut input = PatientDataInput::default();
        input.apply(FieldPath::KeyLabResultsText, &FieldValue::text("HbA1c 9.1%"));
        let json = serde_json::to_value(&input).expect("serialize");

        assert_eq!(json["labResults"]["keyLabResultsText"], "HbA1c 9.1%");
        assert_eq!(json["medicalHistory"]["lengthOfStayDays"], "");
    }
}
