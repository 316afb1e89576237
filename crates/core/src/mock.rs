//! Seeded demo data.
//!
//! Generates plausible patient records and predictions for exercising the prompt and insights
//! paths without real data. The same seed always yields the same sequence.
//!
//! Generated values never contain the batch delimiter or a newline, so a generated batch
//! survives [`crate::Batch::render`] and a re-parse unchanged.

use crate::command::FieldPath;
use crate::constants::MAX_DEMO_RECORDS;
use crate::prediction::PredictionResult;
use crate::record::{PatientDataInput, PatientRecord};
use crate::{CoreError, CoreResult};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

const DIAGNOSES: &[&str] = &["I10", "E11.9", "J45", "M54.5"];
const COMORBIDITIES: &[&str] = &["I25.1", "N18.3"];
const CONDITIONS: &[&str] = &["pneumonia", "CHF exacerbation", "COPD exacerbation"];
const CHRONIC: &[&str] = &["Diabetes", "Heart Failure", "COPD"];

pub struct MockGenerator {
    rng: StdRng,
    issued: usize,
}

impl MockGenerator {
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            issued: 0,
        }
    }

    fn pick(&mut self, options: &[&'static str]) -> &'static str {
        options.choose(&mut self.rng).copied().unwrap_or_default()
    }

    /// Next record, with id `MOCK_<n>` counting from 1.
    pub fn patient(&mut self) -> PatientRecord {
        self.issued += 1;

        let mut data = PatientDataInput::default();
        data.set(FieldPath::Age, self.rng.gen_range(20..80).to_string());
        let gender = if self.rng.gen_bool(0.5) { "Male" } else { "Female" };
        data.set(FieldPath::Gender, gender);

        // The secondary code goes in the summary: a comma in the codes cell would split the row.
        let primary = self.pick(DIAGNOSES);
        data.set(FieldPath::DiagnosisCodes, primary);
        let condition = self.pick(CONDITIONS);
        let history = if self.rng.gen_bool(0.5) {
            format!(" History of {}.", self.pick(COMORBIDITIES))
        } else {
            String::new()
        };
        data.set(
            FieldPath::TreatmentSummary,
            format!(
                "Patient treated for {}. Responded well to treatment. Discharged with follow-up instructions.{}",
                condition, history
            ),
        );
        data.set(
            FieldPath::PreviousAdmissions,
            self.rng.gen_range(0..3).to_string(),
        );
        data.set(
            FieldPath::LengthOfStayDays,
            self.rng.gen_range(3..13).to_string(),
        );
        data.set(
            FieldPath::KeyLabResultsText,
            format!(
                "HbA1c: {:.1}%; Creatinine: {:.1} mg/dL; BNP: {} pg/mL",
                self.rng.gen_range(5.0..10.0),
                self.rng.gen_range(0.5..1.5),
                self.rng.gen_range(100..600)
            ),
        );
        let support = if self.rng.gen_bool(0.7) { "Yes" } else { "No" };
        data.set(FieldPath::HasSupportSystem, support);
        let housing = if self.rng.gen_bool(0.5) { "Stable" } else { "Unstable" };
        data.set(FieldPath::HousingSituation, housing);

        PatientRecord::new(format!("MOCK_{}", self.issued), data)
    }

    /// Next prediction: risk between 10 and 89 with two or three drivers and recommendations.
    pub fn prediction(&mut self) -> PredictionResult {
        let risk: u8 = self.rng.gen_range(10..90);

        let mut drivers = vec![
            format!(
                "Previous hospitalizations ({})",
                self.rng.gen_range(0..3)
            ),
            format!("Chronic condition ({})", self.pick(CHRONIC)),
            if risk > 60 {
                "Limited social support".to_string()
            } else {
                "Medication non-adherence risk".to_string()
            },
        ];
        drivers.truncate(self.rng.gen_range(2..=3));

        let mut recommendations = vec![
            "Ensure follow-up appointment within 7 days post-discharge.".to_string(),
            "Medication reconciliation and patient education.".to_string(),
            if risk > 50 {
                "Consider home health referral.".to_string()
            } else {
                "Provide clear discharge instructions and teach-back.".to_string()
            },
            "Dietary counseling referral if applicable.".to_string(),
        ];
        recommendations.truncate(self.rng.gen_range(2..=3));

        PredictionResult {
            risk_percentage: risk,
            key_risk_drivers: drivers,
            proactive_recommendations: recommendations,
        }
    }

    /// `count` records, each paired with a prediction.
    pub fn batch(&mut self, count: usize) -> Vec<(PatientRecord, PredictionResult)> {
        (0..count)
            .map(|_| {
                let record = self.patient();
                let prediction = self.prediction();
                (record, prediction)
            })
            .collect()
    }
}

/// A seeded demo batch for the binaries.
///
/// # Errors
///
/// Returns `CoreError::InvalidInput` if `count` is above [`MAX_DEMO_RECORDS`].
pub fn demo_batch(
    count: usize,
    seed: u64,
) -> CoreResult<Vec<(PatientRecord, PredictionResult)>> {
    if count > MAX_DEMO_RECORDS {
        return Err(CoreError::InvalidInput(format!(
            "demo count must be at most {}, got {}",
            MAX_DEMO_RECORDS, count
        )));
    }
    tracing::debug!("generating {} demo record(s) from seed {}", count, seed);
    Ok(MockGenerator::seeded(seed).batch(count))
}
