//! Constants used throughout the core crate.

/// Column delimiter for batch text. Quoting is not supported.
pub const FIELD_DELIMITER: char = ',';

/// Headers every batch must carry, in the column order used when rendering a batch.
///
/// Matching against a file's header line is case-insensitive.
pub const CANONICAL_HEADERS: [&str; 10] = [
    "id",
    "age",
    "gender",
    "diagnosisCodes",
    "previousAdmissions",
    "lengthOfStayDays",
    "treatmentSummary",
    "keyLabResultsText",
    "hasSupportSystem",
    "housingSituation",
];

/// Upper bound on accepted batch text when no explicit limit is configured.
pub const DEFAULT_MAX_BATCH_BYTES: usize = 5 * 1024 * 1024;

/// Spoken when a prediction is requested before one exists.
pub const NO_PREDICTION_NARRATION: &str =
    "No prediction available to read. Please submit the form first.";

/// Largest demo batch the binaries will generate in one request.
pub const MAX_DEMO_RECORDS: usize = 1000;

/// Demo batch size when none is requested.
pub const DEFAULT_DEMO_RECORDS: usize = 10;
