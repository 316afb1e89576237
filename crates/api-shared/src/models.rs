//! JSON models exchanged over the REST API.
//!
//! Field names are camelCase on the wire. Each response model has a `From` conversion from the
//! core type it presents.

use readmit_core::{
    acknowledge, narrate_prediction, Batch, BatchReport, Command, FieldPath, FieldValue, Insights,
    PatientRecord, PredictionResult, RecordValidation, SkippedRow,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use utoipa::{IntoParams, ToSchema};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ErrorRes {
    pub message: String,
}

// ============================================================================
// Commands
// ============================================================================

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct InterpretReq {
    /// Raw recognition result; normalised before interpretation.
    pub transcript: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommandRes {
    /// Action name, for example `FILL_FIELD`.
    pub action: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub value: Option<serde_json::Value>,
    /// Sentence to speak back to the user.
    pub acknowledgement: String,
}

fn field_value_json(value: FieldValue) -> serde_json::Value {
    match value {
        FieldValue::Integer(n) => serde_json::Value::from(n),
        FieldValue::Number(n) => serde_json::Value::from(n),
        FieldValue::Text(s) => serde_json::Value::String(s),
    }
}

impl From<&Command> for CommandRes {
    fn from(command: &Command) -> Self {
        Self {
            action: command.action().as_str().to_string(),
            target: command.target().map(str::to_string),
            value: command.value().map(field_value_json),
            acknowledgement: acknowledge(command),
        }
    }
}

// ============================================================================
// Batches
// ============================================================================

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct CsvReq {
    /// Batch text: a header line followed by comma-separated data lines.
    pub csv: String,
}

/// One batch record, flattened to its column names.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PatientRecordRes {
    pub id: String,
    pub age: String,
    pub gender: String,
    pub diagnosis_codes: String,
    pub previous_admissions: String,
    pub length_of_stay_days: String,
    pub treatment_summary: String,
    pub key_lab_results_text: String,
    pub has_support_system: String,
    pub housing_situation: String,
}

impl From<&PatientRecord> for PatientRecordRes {
    fn from(record: &PatientRecord) -> Self {
        let field = |path: FieldPath| record.data().get(path).to_string();
        Self {
            id: record.id().to_string(),
            age: field(FieldPath::Age),
            gender: field(FieldPath::Gender),
            diagnosis_codes: field(FieldPath::DiagnosisCodes),
            previous_admissions: field(FieldPath::PreviousAdmissions),
            length_of_stay_days: field(FieldPath::LengthOfStayDays),
            treatment_summary: field(FieldPath::TreatmentSummary),
            key_lab_results_text: field(FieldPath::KeyLabResultsText),
            has_support_system: field(FieldPath::HasSupportSystem),
            housing_situation: field(FieldPath::HousingSituation),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SkippedRowRes {
    pub line: usize,
    pub expected_columns: usize,
    pub actual_columns: usize,
}

impl From<&SkippedRow> for SkippedRowRes {
    fn from(row: &SkippedRow) -> Self {
        Self {
            line: row.line,
            expected_columns: row.expected_columns,
            actual_columns: row.actual_columns,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BatchRes {
    pub records: Vec<PatientRecordRes>,
    pub skipped_rows: Vec<SkippedRowRes>,
}

impl From<&BatchReport> for BatchRes {
    fn from(report: &BatchReport) -> Self {
        Self {
            records: report.records.iter().map(PatientRecordRes::from).collect(),
            skipped_rows: report.skipped_rows.iter().map(SkippedRowRes::from).collect(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecordValidationRes {
    pub id: String,
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<&RecordValidation> for RecordValidationRes {
    fn from(validation: &RecordValidation) -> Self {
        Self {
            id: validation.id.clone(),
            valid: validation.is_valid(),
            error: validation.outcome.as_ref().err().map(ToString::to_string),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ValidationRes {
    pub results: Vec<RecordValidationRes>,
    pub skipped_rows: Vec<SkippedRowRes>,
}

// ============================================================================
// Predictions
// ============================================================================

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct PredictionParseReq {
    /// The model's raw reply, optionally wrapped in a Markdown code fence.
    pub text: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PredictionRes {
    pub risk_percentage: u8,
    pub key_risk_drivers: Vec<String>,
    pub proactive_recommendations: Vec<String>,
    /// Sentence to speak back to the user.
    pub narration: String,
}

impl From<&PredictionResult> for PredictionRes {
    fn from(result: &PredictionResult) -> Self {
        Self {
            risk_percentage: result.risk_percentage,
            key_risk_drivers: result.key_risk_drivers.clone(),
            proactive_recommendations: result.proactive_recommendations.clone(),
            narration: narrate_prediction(Some(result)),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PromptItemRes {
    pub id: String,
    pub prompt: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PromptRes {
    pub prompts: Vec<PromptItemRes>,
    pub skipped_rows: Vec<SkippedRowRes>,
}

/// A prediction as supplied by, or handed back to, the client.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PredictionBody {
    pub risk_percentage: u8,
    #[serde(default)]
    pub key_risk_drivers: Vec<String>,
    #[serde(default)]
    pub proactive_recommendations: Vec<String>,
}

impl From<&PredictionResult> for PredictionBody {
    fn from(result: &PredictionResult) -> Self {
        Self {
            risk_percentage: result.risk_percentage,
            key_risk_drivers: result.key_risk_drivers.clone(),
            proactive_recommendations: result.proactive_recommendations.clone(),
        }
    }
}

impl From<PredictionBody> for PredictionResult {
    fn from(body: PredictionBody) -> Self {
        Self {
            risk_percentage: body.risk_percentage.min(100),
            key_risk_drivers: body.key_risk_drivers,
            proactive_recommendations: body.proactive_recommendations,
        }
    }
}

// ============================================================================
// Insights and demo data
// ============================================================================

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct InsightsReq {
    /// Batch text, as for `/batches`.
    pub csv: String,
    /// Predictions keyed by record id. Records without one count as lower risk.
    #[serde(default)]
    pub predictions: HashMap<String, PredictionBody>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AgeBandRes {
    pub age_group: String,
    pub count: usize,
    pub high_risk: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosisCountRes {
    pub diagnosis: String,
    pub count: usize,
    pub high_risk: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InsightsRes {
    pub age_distribution: Vec<AgeBandRes>,
    pub diagnosis_distribution: Vec<DiagnosisCountRes>,
    pub average_stay_high_risk: f64,
    pub average_stay_lower_risk: f64,
    pub high_risk_rate: f64,
    pub skipped_rows: Vec<SkippedRowRes>,
}

impl InsightsRes {
    pub fn new(insights: &Insights, report: &BatchReport) -> Self {
        Self {
            age_distribution: insights
                .age_distribution
                .iter()
                .map(|band| AgeBandRes {
                    age_group: band.age_group.to_string(),
                    count: band.count,
                    high_risk: band.high_risk,
                })
                .collect(),
            diagnosis_distribution: insights
                .diagnosis_distribution
                .iter()
                .map(|d| DiagnosisCountRes {
                    diagnosis: d.diagnosis.clone(),
                    count: d.count,
                    high_risk: d.high_risk,
                })
                .collect(),
            average_stay_high_risk: insights.average_stay_high_risk,
            average_stay_lower_risk: insights.average_stay_lower_risk,
            high_risk_rate: insights.high_risk_rate,
            skipped_rows: report.skipped_rows.iter().map(SkippedRowRes::from).collect(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DemoParams {
    /// Number of records (default 10, at most 1000).
    pub count: Option<usize>,
    /// Generator seed; the same seed always yields the same batch.
    pub seed: Option<u64>,
}

/// Generated batch text plus a prediction per record, ready for `/insights`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DemoRes {
    pub csv: String,
    pub predictions: HashMap<String, PredictionBody>,
}

impl From<&[(PatientRecord, PredictionResult)]> for DemoRes {
    fn from(pairs: &[(PatientRecord, PredictionResult)]) -> Self {
        let records: Vec<PatientRecord> = pairs.iter().map(|(record, _)| record.clone()).collect();
        Self {
            csv: Batch::render(&records),
            predictions: pairs
                .iter()
                .map(|(record, prediction)| {
                    (record.id().to_string(), PredictionBody::from(prediction))
                })
                .collect(),
        }
    }
}

/// Converts request predictions into the core form [`readmit_core::summarise`] takes.
pub fn predictions_by_id(
    predictions: HashMap<String, PredictionBody>,
) -> HashMap<String, PredictionResult> {
    predictions
        .into_iter()
        .map(|(id, body)| (id, PredictionResult::from(body)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use readmit_core::interpret;

    #[test]
    fn fill_command_serialises_numeric_value() {
        let res = CommandRes::from(&interpret("set age to 72"));
        let json = serde_json::to_value(&res).expect("serialize");

        assert_eq!(json["action"], "FILL_FIELD");
        assert_eq!(json["target"], "demographics.age");
        assert_eq!(json["value"], 72);
        assert_eq!(json["acknowledgement"], "age set to 72.");
    }

    #[test]
    fn payload_free_command_omits_target_and_value() {
        let res = CommandRes::from(&interpret("submit form"));
        let json = serde_json::to_value(&res).expect("serialize");

        assert_eq!(json["action"], "SUBMIT_FORM");
        assert!(json.get("target").is_none());
        assert!(json.get("value").is_none());
    }

    #[test]
    fn record_is_flattened() {
        let mut data = readmit_core::PatientDataInput::default();
        data.set(FieldPath::HousingSituation, "Stable");
        let res = PatientRecordRes::from(&PatientRecord::new("P1", data));
        let json = serde_json::to_value(&res).expect("serialize");

        assert_eq!(json["id"], "P1");
        assert_eq!(json["housingSituation"], "Stable");
        assert_eq!(json["age"], "");
    }

    #[test]
    fn prediction_body_clamps_risk() {
        let body = PredictionBody {
            risk_percentage: 140,
            key_risk_drivers: Vec::new(),
            proactive_recommendations: Vec::new(),
        };
        assert_eq!(PredictionResult::from(body).risk_percentage, 100);
    }

    #[test]
    fn insights_request_defaults_missing_lists() {
        let req: InsightsReq = serde_json::from_value(serde_json::json!({
            "csv": "x",
            "predictions": { "P1": { "riskPercentage": 70 } }
        }))
        .expect("deserialize");
        assert_eq!(req.predictions["P1"].risk_percentage, 70);
        assert!(req.predictions["P1"].key_risk_drivers.is_empty());
    }
}
