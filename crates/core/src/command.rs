//! Voice command model.
//!
//! Responsibilities:
//! - Define the typed [`Command`] produced by the interpreter
//! - Define the fillable form fields ([`FieldPath`]) and their payloads ([`FieldValue`])
//! - Provide the `{action, target, value}` wire shape consumed by the action dispatcher
//!
//! Notes:
//! - `target` and `value` presence is fixed by the action; the wire translation enforces it in
//!   both directions.

use crate::{CoreError, CoreResult};
use readmit_types::{AppTab, VoiceToggle};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Field paths and values
// ============================================================================

/// A form field addressable by a fill command, written `section.key` on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FieldPath {
    Age,
    Gender,
    DiagnosisCodes,
    PreviousAdmissions,
    LengthOfStayDays,
    TreatmentSummary,
    KeyLabResultsText,
    HasSupportSystem,
    HousingSituation,
}

impl FieldPath {
    pub const ALL: [FieldPath; 9] = [
        FieldPath::Age,
        FieldPath::Gender,
        FieldPath::DiagnosisCodes,
        FieldPath::PreviousAdmissions,
        FieldPath::LengthOfStayDays,
        FieldPath::TreatmentSummary,
        FieldPath::KeyLabResultsText,
        FieldPath::HasSupportSystem,
        FieldPath::HousingSituation,
    ];

    /// Dotted wire form, for example `medicalHistory.lengthOfStayDays`.
    pub fn as_str(self) -> &'static str {
        match self {
            FieldPath::Age => "demographics.age",
            FieldPath::Gender => "demographics.gender",
            FieldPath::DiagnosisCodes => "medicalHistory.diagnosisCodes",
            FieldPath::PreviousAdmissions => "medicalHistory.previousAdmissions",
            FieldPath::LengthOfStayDays => "medicalHistory.lengthOfStayDays",
            FieldPath::TreatmentSummary => "medicalHistory.treatmentSummary",
            FieldPath::KeyLabResultsText => "labResults.keyLabResultsText",
            FieldPath::HasSupportSystem => "socialDeterminants.hasSupportSystem",
            FieldPath::HousingSituation => "socialDeterminants.housingSituation",
        }
    }

    /// Section part of the dotted path.
    pub fn section(self) -> &'static str {
        self.split().0
    }

    /// Key part of the dotted path.
    pub fn key(self) -> &'static str {
        self.split().1
    }

    fn split(self) -> (&'static str, &'static str) {
        let path = self.as_str();
        path.split_once('.').unwrap_or((path, path))
    }

    /// Key split into lower-case words, for speaking back to the user.
    ///
    /// `lengthOfStayDays` becomes `length of stay days`.
    pub fn spoken_label(self) -> String {
        let mut label = String::new();
        for ch in self.key().chars() {
            if ch.is_ascii_uppercase() {
                label.push(' ');
                label.push(ch.to_ascii_lowercase());
            } else {
                label.push(ch);
            }
        }
        label
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldPath {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FieldPath::ALL
            .into_iter()
            .find(|path| path.as_str() == s)
            .ok_or_else(|| CoreError::UnknownFieldPath(s.to_string()))
    }
}

impl Serialize for FieldPath {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for FieldPath {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Payload of a fill command.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Integer(i64),
    Number(f64),
    Text(String),
}

impl FieldValue {
    pub fn text(value: impl Into<String>) -> Self {
        FieldValue::Text(value.into())
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Integer(n) => write!(f, "{}", n),
            FieldValue::Number(n) => write!(f, "{}", n),
            FieldValue::Text(s) => f.write_str(s),
        }
    }
}

// ============================================================================
// Commands
// ============================================================================

/// Action discriminant, as named on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommandAction {
    Navigate,
    FillField,
    SubmitForm,
    ClearForm,
    ToggleTheme,
    ReadPrediction,
    ToggleVoiceAssistant,
    Unknown,
}

impl CommandAction {
    pub fn as_str(self) -> &'static str {
        match self {
            CommandAction::Navigate => "NAVIGATE",
            CommandAction::FillField => "FILL_FIELD",
            CommandAction::SubmitForm => "SUBMIT_FORM",
            CommandAction::ClearForm => "CLEAR_FORM",
            CommandAction::ToggleTheme => "TOGGLE_THEME",
            CommandAction::ReadPrediction => "READ_PREDICTION",
            CommandAction::ToggleVoiceAssistant => "TOGGLE_VOICE_ASSISTANT",
            CommandAction::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for CommandAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A command recognised from a transcript.
///
/// Serialises to the `{action, target, value}` wire shape, for example
/// `{"action":"FILL_FIELD","target":"demographics.age","value":45}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(into = "CommandWire", try_from = "CommandWire")]
pub enum Command {
    Navigate(AppTab),
    FillField { field: FieldPath, value: FieldValue },
    SubmitForm,
    ClearForm,
    ToggleTheme,
    ReadPrediction,
    ToggleVoiceAssistant(VoiceToggle),
    /// No rule matched; carries the transcript as given.
    Unknown(String),
}

impl Command {
    pub fn action(&self) -> CommandAction {
        match self {
            Command::Navigate(_) => CommandAction::Navigate,
            Command::FillField { .. } => CommandAction::FillField,
            Command::SubmitForm => CommandAction::SubmitForm,
            Command::ClearForm => CommandAction::ClearForm,
            Command::ToggleTheme => CommandAction::ToggleTheme,
            Command::ReadPrediction => CommandAction::ReadPrediction,
            Command::ToggleVoiceAssistant(_) => CommandAction::ToggleVoiceAssistant,
            Command::Unknown(_) => CommandAction::Unknown,
        }
    }

    /// Tab name, dotted field path, or the raw transcript for `UNKNOWN`.
    pub fn target(&self) -> Option<&str> {
        match self {
            Command::Navigate(tab) => Some(tab.wire()),
            Command::FillField { field, .. } => Some(field.as_str()),
            Command::Unknown(transcript) => Some(transcript.as_str()),
            _ => None,
        }
    }

    pub fn value(&self) -> Option<FieldValue> {
        match self {
            Command::FillField { value, .. } => Some(value.clone()),
            Command::ToggleVoiceAssistant(toggle) => Some(FieldValue::text(toggle.wire())),
            _ => None,
        }
    }
}

fn unexpected(action: CommandAction, what: &str) -> CoreError {
    CoreError::InvalidInput(format!("{} command must not carry a {}", action, what))
}

fn no_payload(wire: &CommandWire, command: Command) -> CoreResult<Command> {
    if wire.target.is_some() {
        return Err(unexpected(wire.action, "target"));
    }
    if wire.value.is_some() {
        return Err(unexpected(wire.action, "value"));
    }
    Ok(command)
}

/// Strict wire model for [`Command`].
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct CommandWire {
    action: CommandAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    target: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    value: Option<FieldValue>,
}

impl From<Command> for CommandWire {
    fn from(command: Command) -> Self {
        CommandWire {
            action: command.action(),
            target: command.target().map(str::to_string),
            value: command.value(),
        }
    }
}

impl TryFrom<CommandWire> for Command {
    type Error = CoreError;

    fn try_from(wire: CommandWire) -> CoreResult<Self> {
        let action = wire.action;

        match action {
            CommandAction::Navigate => {
                let target = wire.target.as_deref().ok_or_else(|| {
                    CoreError::InvalidInput("NAVIGATE command requires a target".into())
                })?;
                let tab = AppTab::from_spoken(target).ok_or_else(|| {
                    CoreError::InvalidInput(format!("unknown navigation target '{}'", target))
                })?;
                if wire.value.is_some() {
                    return Err(unexpected(action, "value"));
                }
                Ok(Command::Navigate(tab))
            }
            CommandAction::FillField => {
                let (Some(target), Some(value)) = (wire.target.as_deref(), wire.value.clone())
                else {
                    return Err(CoreError::InvalidInput(
                        "FILL_FIELD command requires both target and value".into(),
                    ));
                };
                Ok(Command::FillField {
                    field: target.parse()?,
                    value,
                })
            }
            CommandAction::ToggleVoiceAssistant => {
                if wire.target.is_some() {
                    return Err(unexpected(action, "target"));
                }
                match &wire.value {
                    Some(FieldValue::Text(s)) => VoiceToggle::from_spoken(s)
                        .map(Command::ToggleVoiceAssistant)
                        .ok_or_else(|| {
                            CoreError::InvalidInput(format!("unknown voice toggle '{}'", s))
                        }),
                    _ => Err(CoreError::InvalidInput(
                        "TOGGLE_VOICE_ASSISTANT command requires value 'enable' or 'disable'"
                            .into(),
                    )),
                }
            }
            CommandAction::Unknown => {
                if wire.value.is_some() {
                    return Err(unexpected(action, "value"));
                }
                Ok(Command::Unknown(wire.target.unwrap_or_default()))
            }
            CommandAction::SubmitForm => no_payload(&wire, Command::SubmitForm),
            CommandAction::ClearForm => no_payload(&wire, Command::ClearForm),
            CommandAction::ToggleTheme => no_payload(&wire, Command::ToggleTheme),
            CommandAction::ReadPrediction => no_payload(&wire, Command::ReadPrediction),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn field_path_parses_every_dotted_form() {
        for path in FieldPath::ALL {
            assert_eq!(path.as_str().parse::<FieldPath>().expect("known path"), path);
        }
    }

    #[test]
    fn field_path_rejects_unknown() {
        let err = "demographics.ethnicity".parse::<FieldPath>().expect_err("unknown");
        assert!(matches!(err, CoreError::UnknownFieldPath(p) if p == "demographics.ethnicity"));
    }

    #[test]
    fn field_path_section_and_key() {
        assert_eq!(FieldPath::KeyLabResultsText.section(), "labResults");
        assert_eq!(FieldPath::KeyLabResultsText.key(), "keyLabResultsText");
    }

    #[test]
    fn field_path_spoken_label_splits_camel_case() {
        assert_eq!(FieldPath::LengthOfStayDays.spoken_label(), "length of stay days");
        assert_eq!(FieldPath::Age.spoken_label(), "age");
        assert_eq!(FieldPath::HasSupportSystem.spoken_label(), "has support system");
    }

    #[test]
    fn serialises_fill_field_to_wire_shape() {
        let command = Command::FillField {
            field: FieldPath::Age,
            value: FieldValue::Integer(45),
        };
        let value = serde_json::to_value(&command).expect("serialize");
        assert_eq!(
            value,
            json!({"action": "FILL_FIELD", "target": "demographics.age", "value": 45})
        );
    }

    #[test]
    fn serialises_payloadless_commands_without_target_or_value() {
        let value = serde_json::to_value(Command::SubmitForm).expect("serialize");
        assert_eq!(value, json!({"action": "SUBMIT_FORM"}));
    }

    #[test]
    fn serialises_voice_toggle_as_value_only() {
        let value =
            serde_json::to_value(Command::ToggleVoiceAssistant(VoiceToggle::Disable)).expect("ser");
        assert_eq!(value, json!({"action": "TOGGLE_VOICE_ASSISTANT", "value": "disable"}));
    }

    #[test]
    fn deserialises_wire_shape() {
        let command: Command =
            serde_json::from_value(json!({"action": "NAVIGATE", "target": "dashboard"}))
                .expect("deserialize");
        assert_eq!(command, Command::Navigate(AppTab::Dashboard));

        let command: Command = serde_json::from_value(json!({
            "action": "FILL_FIELD",
            "target": "medicalHistory.lengthOfStayDays",
            "value": 4.5
        }))
        .expect("deserialize");
        assert_eq!(
            command,
            Command::FillField {
                field: FieldPath::LengthOfStayDays,
                value: FieldValue::Number(4.5),
            }
        );
    }

    #[test]
    fn rejects_navigation_outside_fixed_tabs() {
        let result: Result<Command, _> =
            serde_json::from_value(json!({"action": "NAVIGATE", "target": "settings"}));
        let err = result.expect_err("should reject");
        assert!(err.to_string().contains("settings"));
    }

    #[test]
    fn rejects_fill_field_without_value() {
        let result: Result<Command, _> = serde_json::from_value(
            json!({"action": "FILL_FIELD", "target": "demographics.age"}),
        );
        assert!(result.is_err());
    }

    #[test]
    fn rejects_payload_on_payloadless_action() {
        let result: Result<Command, _> =
            serde_json::from_value(json!({"action": "CLEAR_FORM", "target": "single"}));
        assert!(result.is_err());
    }

    #[test]
    fn field_value_display() {
        assert_eq!(FieldValue::Integer(3).to_string(), "3");
        assert_eq!(FieldValue::Number(2.5).to_string(), "2.5");
        assert_eq!(FieldValue::Number(4.0).to_string(), "4");
        assert_eq!(FieldValue::text("Stable").to_string(), "Stable");
    }
}
