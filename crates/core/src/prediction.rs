//! Readmission-risk prediction contract.
//!
//! The model call itself lives outside this crate. This module owns both ends of the exchange:
//! the prompt sent for a patient, and the parsing of the model's text reply into a
//! [`PredictionResult`].

use crate::command::FieldPath;
use crate::record::PatientDataInput;
use crate::{CoreError, CoreResult};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Marker the upstream model API puts in its error message for a rejected key.
const INVALID_KEY_MARKER: &str = "API_KEY_INVALID";

const PLACEHOLDER: &str = "N/A";

lazy_static! {
    static ref CODE_FENCE: Regex = Regex::new(r"(?s)^```(?:json)?\s*\n?(.*?)\n?\s*```$")
        .expect("code fence regex is valid");
}

/// Risk estimate returned by the prediction model.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionResult {
    /// Always within 0..=100.
    pub risk_percentage: u8,
    pub key_risk_drivers: Vec<String>,
    pub proactive_recommendations: Vec<String>,
}

fn or_placeholder<'a>(value: &'a str, placeholder: &'a str) -> &'a str {
    if value.trim().is_empty() {
        placeholder
    } else {
        value
    }
}

/// Renders the patient summary block of the prompt.
fn patient_summary(data: &PatientDataInput) -> String {
    let field = |path: FieldPath| or_placeholder(data.get(path), PLACEHOLDER);

    let mut summary = String::from("Patient Data:\n");
    summary.push_str(&format!(
        "- Demographics: Age {}, Gender {}\n",
        data.get(FieldPath::Age),
        field(FieldPath::Gender)
    ));
    summary.push_str(&format!(
        "- Medical History: Diagnosis Codes ({}), Previous Admissions {}, Length of Last Stay {} days. Summary: {}\n",
        field(FieldPath::DiagnosisCodes),
        or_placeholder(data.get(FieldPath::PreviousAdmissions), "0"),
        field(FieldPath::LengthOfStayDays),
        field(FieldPath::TreatmentSummary)
    ));
    summary.push_str(&format!(
        "- Key Lab Results: {}\n",
        field(FieldPath::KeyLabResultsText)
    ));
    summary.push_str(&format!(
        "- Social Determinants: Support System ({}), Housing ({})\n",
        field(FieldPath::HasSupportSystem),
        field(FieldPath::HousingSituation)
    ));
    summary
}

/// Builds the full prompt asking the model for a 30-day readmission estimate as JSON.
pub fn build_prompt(data: &PatientDataInput) -> String {
    format!(
        r#"{summary}
Analyze this patient's profile for 30-day hospital readmission risk.
Return your response STRICTLY as a JSON object matching this schema:
{{
  "riskPercentage": number (0-100, integer),
  "keyRiskDrivers": string[] (list of 2-4 concise factors),
  "proactiveRecommendations": string[] (list of 2-4 actionable recommendations)
}}

Example JSON output:
{{
  "riskPercentage": 65,
  "keyRiskDrivers": ["History of multiple readmissions", "Poorly controlled diabetes", "Lack of social support"],
  "proactiveRecommendations": ["Schedule follow-up with PCP within 3 days of discharge", "Medication reconciliation by pharmacist", "Arrange home health nurse visit"]
}}
"#,
        summary = patient_summary(data)
    )
}

/// Removes a surrounding Markdown code fence, if there is one.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    match CODE_FENCE.captures(trimmed).and_then(|c| c.get(1)) {
        Some(inner) if !inner.as_str().is_empty() => inner.as_str().trim(),
        _ => trimmed,
    }
}

fn string_list(body: &Value, key: &str) -> CoreResult<Vec<String>> {
    let items = body
        .get(key)
        .and_then(Value::as_array)
        .ok_or_else(|| CoreError::PredictionShape(format!("'{}' must be an array", key)))?;

    Ok(items
        .iter()
        .map(|item| match item {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .collect())
}

/// Parses the model's reply into a [`PredictionResult`].
///
/// The risk is rounded and clamped to 0..=100. Non-string list items are kept as their JSON text.
///
/// # Errors
///
/// - `CoreError::PredictionJson` if the (unfenced) reply is not JSON.
/// - `CoreError::PredictionShape` if `riskPercentage` is not a number or either list is not an
///   array.
pub fn parse_prediction_response(text: &str) -> CoreResult<PredictionResult> {
    let body: Value = serde_json::from_str(strip_code_fence(text)).map_err(CoreError::PredictionJson)?;

    let risk = body
        .get("riskPercentage")
        .and_then(Value::as_f64)
        .ok_or_else(|| CoreError::PredictionShape("'riskPercentage' must be a number".into()))?;

    Ok(PredictionResult {
        risk_percentage: risk.round().clamp(0.0, 100.0) as u8,
        key_risk_drivers: string_list(&body, "keyRiskDrivers")?,
        proactive_recommendations: string_list(&body, "proactiveRecommendations")?,
    })
}

/// Maps an upstream failure message to the error surfaced to the user.
pub fn classify_prediction_failure(message: &str) -> CoreError {
    tracing::error!("prediction request failed: {}", message);

    if message.contains(INVALID_KEY_MARKER) {
        CoreError::PredictionKeyInvalid
    } else {
        CoreError::PredictionFailed(message.to_string())
    }
}
