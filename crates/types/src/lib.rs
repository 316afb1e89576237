//! Closed vocabularies shared by the command interpreter and record coercion.
//!
//! Each type has a lower-case *spoken* form (what arrives in a transcript or a batch cell) and a
//! title-case *wire* form (what the form and the prediction prompt carry). Parsing is
//! case-insensitive; rendering always produces the wire form.

use std::fmt;
use std::str::FromStr;

/// Errors that can occur when parsing a vocabulary value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VocabularyError {
    /// The input is not one of the accepted values for the named vocabulary.
    #[error("'{value}' is not a valid {vocabulary} (expected one of: {expected})")]
    Unrecognised {
        vocabulary: &'static str,
        value: String,
        expected: String,
    },
}

macro_rules! vocabulary {
    (
        $(#[$meta:meta])*
        $name:ident, $label:literal, {
            $($(#[$vmeta:meta])* $variant:ident => ($spoken:literal, $wire:literal)),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        pub enum $name {
            $(
                $(#[$vmeta])*
                #[serde(rename = $wire)]
                $variant,
            )+
        }

        impl $name {
            /// All values in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Lower-case form, as it appears in a normalised transcript.
            pub fn spoken(self) -> &'static str {
                match self {
                    $($name::$variant => $spoken,)+
                }
            }

            /// Title-case form used by the form state and the prediction prompt.
            pub fn wire(self) -> &'static str {
                match self {
                    $($name::$variant => $wire,)+
                }
            }

            /// Matches only the exact lower-case spoken form.
            pub fn from_spoken(s: &str) -> Option<Self> {
                match s {
                    $($spoken => Some($name::$variant),)+
                    _ => None,
                }
            }
        }

        impl FromStr for $name {
            type Err = VocabularyError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let lowered = s.trim().to_lowercase();
                Self::from_spoken(&lowered).ok_or_else(|| VocabularyError::Unrecognised {
                    vocabulary: $label,
                    value: s.to_string(),
                    expected: Self::ALL
                        .iter()
                        .map(|v| v.wire())
                        .collect::<Vec<_>>()
                        .join(", "),
                })
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.wire())
            }
        }
    };
}

vocabulary!(
    /// Top-level application tab a navigation command can target.
    ///
    /// Tabs are rendered lower-case on the wire.
    AppTab, "tab", {
        Single => ("single", "single"),
        Batch => ("batch", "batch"),
        Dashboard => ("dashboard", "dashboard"),
    }
);

vocabulary!(
    /// Patient gender as captured by the intake form.
    Gender, "gender", {
        Male => ("male", "Male"),
        Female => ("female", "Female"),
        Other => ("other", "Other"),
    }
);

vocabulary!(
    /// Whether the patient has a support system at home.
    SupportSystem, "support system", {
        Yes => ("yes", "Yes"),
        No => ("no", "No"),
    }
);

vocabulary!(
    /// Housing situation social determinant.
    HousingSituation, "housing situation", {
        Stable => ("stable", "Stable"),
        Unstable => ("unstable", "Unstable"),
        Homeless => ("homeless", "Homeless"),
    }
);

vocabulary!(
    /// Payload of a voice-assistant toggle command.
    VoiceToggle, "voice toggle", {
        Enable => ("enable", "enable"),
        Disable => ("disable", "disable"),
    }
);

impl SupportSystem {
    pub fn as_bool(self) -> bool {
        matches!(self, SupportSystem::Yes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spoken_form_maps_to_title_case_wire_form() {
        assert_eq!(Gender::from_spoken("female").map(Gender::wire), Some("Female"));
        assert_eq!(SupportSystem::from_spoken("no").map(SupportSystem::wire), Some("No"));
        assert_eq!(
            HousingSituation::from_spoken("homeless").map(HousingSituation::wire),
            Some("Homeless")
        );
    }

    #[test]
    fn from_spoken_is_exact() {
        assert_eq!(Gender::from_spoken("Male"), None);
        assert_eq!(Gender::from_spoken(" male"), None);
        assert_eq!(Gender::from_spoken("martian"), None);
    }

    #[test]
    fn from_str_is_case_insensitive_and_trims() {
        assert_eq!(" STABLE ".parse::<HousingSituation>(), Ok(HousingSituation::Stable));
        assert_eq!("Yes".parse::<SupportSystem>(), Ok(SupportSystem::Yes));
    }

    #[test]
    fn from_str_error_names_vocabulary_and_value() {
        let err = "maybe".parse::<SupportSystem>().expect_err("should reject");
        let msg = err.to_string();
        assert!(msg.contains("maybe"));
        assert!(msg.contains("support system"));
        assert!(msg.contains("Yes"));
    }

    #[test]
    fn app_tab_wire_form_is_lower_case() {
        assert_eq!(AppTab::Dashboard.to_string(), "dashboard");
        assert_eq!(AppTab::ALL.len(), 3);
    }

    #[test]
    fn serde_uses_wire_form() {
        let json = serde_json::to_string(&Gender::Other).expect("serialize");
        assert_eq!(json, "\"Other\"");
        let back: VoiceToggle = serde_json::from_str("\"disable\"").expect("deserialize");
        assert_eq!(back, VoiceToggle::Disable);
    }

    #[test]
    fn support_system_as_bool() {
        assert!(SupportSystem::Yes.as_bool());
        assert!(!SupportSystem::No.as_bool());
    }
}
