//! Spoken feedback for recognised commands and prediction results.

use crate::command::Command;
use crate::constants::NO_PREDICTION_NARRATION;
use crate::prediction::PredictionResult;
use readmit_types::VoiceToggle;

/// Sentence read aloud for a prediction, or the fallback when none exists yet.
pub fn narrate_prediction(prediction: Option<&PredictionResult>) -> String {
    match prediction {
        Some(p) => format!(
            "The predicted readmission risk is {} percent. Key risk drivers are: {}. Proactive recommendations include: {}.",
            p.risk_percentage,
            p.key_risk_drivers.join(", "),
            p.proactive_recommendations.join(", ")
        ),
        None => NO_PREDICTION_NARRATION.to_string(),
    }
}

/// Short confirmation spoken after a command is recognised.
pub fn acknowledge(command: &Command) -> String {
    match command {
        Command::Navigate(tab) => format!("Navigating to {} tab.", tab),
        Command::FillField { field, value } => {
            format!("{} set to {}.", field.spoken_label(), value)
        }
        Command::SubmitForm => "Submitting form for prediction.".to_string(),
        Command::ClearForm => "Form cleared.".to_string(),
        Command::ToggleTheme => "Toggling theme.".to_string(),
        Command::ReadPrediction => "Reading the latest prediction.".to_string(),
        Command::ToggleVoiceAssistant(VoiceToggle::Enable) => {
            "Voice assistant enabled.".to_string()
        }
        Command::ToggleVoiceAssistant(VoiceToggle::Disable) => {
            "Voice assistant disabled.".to_string()
        }
        Command::Unknown(transcript) => format!(
            "Sorry, I didn't understand the command: {}. Please try again.",
            transcript
        ),
    }
}
