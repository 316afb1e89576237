//! Transcript to [`Command`] interpretation.
//!
//! The interpreter is an ordered list of rules evaluated top to bottom; the first rule that
//! produces a command wins. There is no scoring and no backtracking. Order is significant:
//!
//! 1. navigation phrases (substring match)
//! 2. field setters with a literal prefix and a validated value
//! 3. action phrases (substring match)
//! 4. the generic `set <phrase> to <value>` rule, limited to a fixed phrase table
//!
//! A transcript no rule accepts becomes [`Command::Unknown`]. A field setter whose value fails
//! validation does not match, so evaluation continues with the later rules.
//!
//! Input is expected to be trimmed and lower-cased already (see [`normalise_transcript`]).

use crate::command::{Command, FieldPath, FieldValue};
use lazy_static::lazy_static;
use readmit_types::{AppTab, Gender, HousingSituation, SupportSystem, VoiceToggle};
use regex::Regex;

lazy_static! {
    static ref GENERIC_SETTER: Regex =
        Regex::new(r"^set (.*?) to (.*)$").expect("generic setter pattern is valid");
    static ref LEADING_INTEGER: Regex =
        Regex::new(r"^[+-]?\d+").expect("integer prefix pattern is valid");
    static ref LEADING_DECIMAL: Regex = Regex::new(r"^[+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?")
        .expect("decimal prefix pattern is valid");
}

/// Phrases accepted by the generic setter. Fields absent here are only reachable through their
/// literal-prefix rule, if they have one.
const GENERIC_FIELDS: &[(&str, FieldPath)] = &[
    ("previous admissions", FieldPath::PreviousAdmissions),
    ("length of stay", FieldPath::LengthOfStayDays),
    ("treatment summary", FieldPath::TreatmentSummary),
    ("lab results", FieldPath::KeyLabResultsText),
    ("housing situation", FieldPath::HousingSituation),
];

struct Rule {
    name: &'static str,
    apply: fn(&str) -> Option<Command>,
}

const RULES: &[Rule] = &[
    Rule {
        name: "navigate-single",
        apply: navigate_single,
    },
    Rule {
        name: "navigate-batch",
        apply: navigate_batch,
    },
    Rule {
        name: "navigate-dashboard",
        apply: navigate_dashboard,
    },
    Rule {
        name: "set-age",
        apply: set_age,
    },
    Rule {
        name: "set-gender",
        apply: set_gender,
    },
    Rule {
        name: "set-diagnosis-codes",
        apply: set_diagnosis_codes,
    },
    Rule {
        name: "set-support-system",
        apply: set_support_system,
    },
    Rule {
        name: "submit-form",
        apply: submit_form,
    },
    Rule {
        name: "clear-form",
        apply: clear_form,
    },
    Rule {
        name: "toggle-theme",
        apply: toggle_theme,
    },
    Rule {
        name: "read-prediction",
        apply: read_prediction,
    },
    Rule {
        name: "enable-voice",
        apply: enable_voice,
    },
    Rule {
        name: "disable-voice",
        apply: disable_voice,
    },
    Rule {
        name: "set-generic-field",
        apply: set_generic_field,
    },
];

/// Trims and lower-cases a raw recognition result.
pub fn normalise_transcript(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Interprets a normalised transcript. Never fails.
pub fn interpret(transcript: &str) -> Command {
    for rule in RULES {
        if let Some(command) = (rule.apply)(transcript) {
            tracing::debug!("voice rule '{}' matched: {}", rule.name, command.action());
            return command;
        }
    }

    tracing::debug!("no voice rule matched transcript: {}", transcript);
    Command::Unknown(transcript.to_string())
}

fn contains_any(transcript: &str, phrases: &[&str]) -> bool {
    phrases.iter().any(|phrase| transcript.contains(phrase))
}

fn when(matched: bool, command: Command) -> Option<Command> {
    matched.then_some(command)
}

fn navigate_single(t: &str) -> Option<Command> {
    when(
        contains_any(t, &["navigate to single", "go to single"]),
        Command::Navigate(AppTab::Single),
    )
}

fn navigate_batch(t: &str) -> Option<Command> {
    when(
        contains_any(t, &["navigate to batch", "go to batch"]),
        Command::Navigate(AppTab::Batch),
    )
}

fn navigate_dashboard(t: &str) -> Option<Command> {
    when(
        contains_any(
            t,
            &[
                "navigate to dashboard",
                "go to dashboard",
                "show dashboard",
                "show insights",
            ],
        ),
        Command::Navigate(AppTab::Dashboard),
    )
}

/// Value following a literal setter prefix, trimmed.
fn setter_value<'a>(t: &'a str, prefix: &str) -> Option<&'a str> {
    t.strip_prefix(prefix).map(str::trim)
}

fn fill(field: FieldPath, value: FieldValue) -> Command {
    Command::FillField { field, value }
}

fn set_age(t: &str) -> Option<Command> {
    let value = setter_value(t, "set age to")?;
    let age = parse_leading_integer(value)?;
    Some(fill(FieldPath::Age, FieldValue::Integer(age)))
}

fn set_gender(t: &str) -> Option<Command> {
    let value = setter_value(t, "set gender to")?;
    let gender = Gender::from_spoken(value)?;
    Some(fill(FieldPath::Gender, FieldValue::text(gender.wire())))
}

fn set_diagnosis_codes(t: &str) -> Option<Command> {
    let value = setter_value(t, "set diagnosis codes to")?;
    Some(fill(FieldPath::DiagnosisCodes, FieldValue::text(value)))
}

fn set_support_system(t: &str) -> Option<Command> {
    let value = setter_value(t, "set support system to")?;
    let support = SupportSystem::from_spoken(value)?;
    Some(fill(
        FieldPath::HasSupportSystem,
        FieldValue::text(support.wire()),
    ))
}

fn submit_form(t: &str) -> Option<Command> {
    when(
        contains_any(t, &["submit form", "predict now", "get prediction"]),
        Command::SubmitForm,
    )
}

fn clear_form(t: &str) -> Option<Command> {
    when(
        contains_any(t, &["clear form", "reset form"]),
        Command::ClearForm,
    )
}

fn toggle_theme(t: &str) -> Option<Command> {
    when(
        contains_any(t, &["toggle theme", "change theme", "switch theme"]),
        Command::ToggleTheme,
    )
}

fn read_prediction(t: &str) -> Option<Command> {
    when(
        contains_any(
            t,
            &["read prediction", "what's the risk", "tell me the result"],
        ),
        Command::ReadPrediction,
    )
}

fn enable_voice(t: &str) -> Option<Command> {
    when(
        contains_any(t, &["enable voice", "turn on voice"]),
        Command::ToggleVoiceAssistant(VoiceToggle::Enable),
    )
}

fn disable_voice(t: &str) -> Option<Command> {
    when(
        contains_any(t, &["disable voice", "turn off voice"]),
        Command::ToggleVoiceAssistant(VoiceToggle::Disable),
    )
}

fn set_generic_field(t: &str) -> Option<Command> {
    let captures = GENERIC_SETTER.captures(t)?;
    let phrase = captures.get(1)?.as_str().to_lowercase();
    let raw = captures.get(2)?.as_str();

    let field = GENERIC_FIELDS
        .iter()
        .find(|(candidate, _)| *candidate == phrase)
        .map(|(_, field)| *field)?;

    let value = match field {
        FieldPath::PreviousAdmissions | FieldPath::LengthOfStayDays => {
            parse_leading_decimal(raw).map_or_else(|| FieldValue::text(raw), number_value)
        }
        FieldPath::HousingSituation => HousingSituation::from_spoken(&raw.to_lowercase())
            .map_or_else(|| FieldValue::text(raw), |h| FieldValue::text(h.wire())),
        _ => FieldValue::text(raw),
    };

    Some(fill(field, value))
}

/// Longest leading `[+-]digits` run, after leading whitespace. `"45 years"` yields 45.
///
/// Runs too long for `i64` saturate at the bound matching their sign.
fn parse_leading_integer(s: &str) -> Option<i64> {
    let digits = LEADING_INTEGER.find(s.trim_start())?.as_str();
    let saturated = if digits.starts_with('-') {
        i64::MIN
    } else {
        i64::MAX
    };
    Some(digits.parse().unwrap_or(saturated))
}

/// Longest leading decimal literal, after leading whitespace. `"3.5 days"` yields 3.5.
///
/// Literals that overflow to infinity are rejected.
fn parse_leading_decimal(s: &str) -> Option<f64> {
    LEADING_DECIMAL
        .find(s.trim_start())
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .filter(|n| n.is_finite())
}

/// Whole numbers are emitted as integers so they serialise without a fractional part.
fn number_value(n: f64) -> FieldValue {
    if n.fract() == 0.0 && n.abs() < 9.007_199_254_740_992e15 {
        FieldValue::Integer(n as i64)
    } else {
        FieldValue::Number(n)
    }
}
