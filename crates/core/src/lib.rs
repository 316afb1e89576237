//! # Readmit Core
//!
//! Core logic for the readmission-risk assistant.
//!
//! This crate contains pure data operations:
//! - Voice transcript interpretation into typed commands
//! - Batch text parsing into patient records, and rendering back
//! - Coercion of raw record input into typed data
//! - The prediction prompt/response contract and the sentences spoken back to the user
//! - Dashboard insights over a predicted batch, and seeded demo data
//!
//! **No API concerns**: HTTP servers, request DTOs, and process setup belong in the binaries and
//! `api-shared`. Nothing here performs I/O beyond logging.

pub mod batch;
pub mod command;
pub mod config;
pub mod constants;
mod error;
pub mod insights;
pub mod interpreter;
pub mod mock;
pub mod narration;
pub mod prediction;
pub mod record;
pub mod service;
pub mod validation;

pub use batch::{Batch, BatchReport, SkippedRow};
pub use command::{Command, CommandAction, FieldPath, FieldValue};
pub use config::{core_config_from_env_values, CoreConfig};
pub use error::{CoreError, CoreResult};
pub use insights::{summarise, AgeBandCount, DiagnosisCount, Insights};
pub use interpreter::{interpret, normalise_transcript};
pub use mock::{demo_batch, MockGenerator};
pub use narration::{acknowledge, narrate_prediction};
pub use prediction::{
    build_prompt, classify_prediction_failure, parse_prediction_response, PredictionResult,
};
pub use record::{PatientDataInput, PatientRecord};
pub use service::BatchService;
pub use validation::{validate_batch, ProcessedPatientData, RecordValidation};
