//! Dashboard aggregation over a predicted batch.
//!
//! A record counts as high risk when its prediction's risk is above [`HIGH_RISK_THRESHOLD`].
//! Records without a prediction count as lower risk. Predictions are matched to records by id.

use crate::command::FieldPath;
use crate::prediction::PredictionResult;
use crate::record::PatientRecord;
use serde::Serialize;
use std::collections::HashMap;

/// Risk percentages strictly above this are high risk.
pub const HIGH_RISK_THRESHOLD: u8 = 50;

const TOP_DIAGNOSES: usize = 5;

const UNKNOWN_DIAGNOSIS: &str = "Unknown";

/// Upper age bound (inclusive) and label of each band. The last band is open-ended.
const AGE_BANDS: [(f64, &str); 4] = [
    (18.0, "0-18"),
    (40.0, "19-40"),
    (65.0, "41-65"),
    (f64::INFINITY, "66+"),
];

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgeBandCount {
    pub age_group: &'static str,
    pub count: usize,
    pub high_risk: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosisCount {
    pub diagnosis: String,
    pub count: usize,
    pub high_risk: usize,
}

/// Summary figures shown on the insights tab.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Insights {
    /// Always four bands, in ascending age order.
    pub age_distribution: Vec<AgeBandCount>,
    /// At most five primary diagnoses, most frequent first.
    pub diagnosis_distribution: Vec<DiagnosisCount>,
    /// Mean length of stay in days, one decimal place.
    pub average_stay_high_risk: f64,
    pub average_stay_lower_risk: f64,
    /// Share of records that are high risk, as a percentage with one decimal place.
    pub high_risk_rate: f64,
}

#[derive(Default)]
struct StayTotals {
    days: f64,
    count: usize,
}

impl StayTotals {
    fn add(&mut self, days: Option<f64>) {
        if let Some(days) = days {
            self.days += days;
            self.count += 1;
        }
    }

    fn average(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            one_decimal(self.days / self.count as f64)
        }
    }
}

fn one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Empty cells read as zero; anything else that is not a finite number is `None`.
fn numeric_cell(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Some(0.0);
    }
    raw.parse::<f64>().ok().filter(|n| n.is_finite())
}

fn age_band(age: Option<f64>) -> usize {
    match age {
        Some(age) => AGE_BANDS
            .iter()
            .position(|(upper, _)| age <= *upper)
            .unwrap_or(AGE_BANDS.len() - 1),
        None => AGE_BANDS.len() - 1,
    }
}

fn primary_diagnosis(codes: &str) -> String {
    match codes.split(',').next().map(str::trim) {
        Some(code) if !code.is_empty() => code.to_string(),
        _ => UNKNOWN_DIAGNOSIS.to_string(),
    }
}

/// Aggregates a batch and its predictions for the insights tab.
pub fn summarise(
    records: &[PatientRecord],
    predictions: &HashMap<String, PredictionResult>,
) -> Insights {
    let mut age_distribution: Vec<AgeBandCount> = AGE_BANDS
        .iter()
        .map(|(_, label)| AgeBandCount {
            age_group: *label,
            count: 0,
            high_risk: 0,
        })
        .collect();
    let mut diagnoses: Vec<DiagnosisCount> = Vec::new();
    let mut high_stay = StayTotals::default();
    let mut lower_stay = StayTotals::default();
    let mut high_risk_records = 0usize;

    for record in records {
        let data = record.data();
        let high_risk = predictions
            .get(record.id())
            .is_some_and(|p| p.risk_percentage > HIGH_RISK_THRESHOLD);

        let band = &mut age_distribution[age_band(numeric_cell(data.get(FieldPath::Age)))];
        band.count += 1;

        let diagnosis = primary_diagnosis(data.get(FieldPath::DiagnosisCodes));
        let entry = match diagnoses.iter().position(|d| d.diagnosis == diagnosis) {
            Some(index) => &mut diagnoses[index],
            None => {
                diagnoses.push(DiagnosisCount {
                    diagnosis,
                    count: 0,
                    high_risk: 0,
                });
                let last = diagnoses.len() - 1;
                &mut diagnoses[last]
            }
        };
        entry.count += 1;

        let stay = numeric_cell(data.get(FieldPath::LengthOfStayDays));
        if high_risk {
            band.high_risk += 1;
            entry.high_risk += 1;
            high_stay.add(stay);
            high_risk_records += 1;
        } else {
            lower_stay.add(stay);
        }
    }

    // Stable sort: ties keep first-seen order.
    diagnoses.sort_by(|a, b| b.count.cmp(&a.count));
    diagnoses.truncate(TOP_DIAGNOSES);

    let high_risk_rate = if records.is_empty() {
        0.0
    } else {
        one_decimal(high_risk_records as f64 / records.len() as f64 * 100.0)
    };

    Insights {
        age_distribution,
        diagnosis_distribution: diagnoses,
        average_stay_high_risk: high_stay.average(),
        average_stay_lower_risk: lower_stay.average(),
        high_risk_rate,
    }
}
