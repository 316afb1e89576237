#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("File content is empty or unreadable.")]
    EmptyBatch,
    #[error("batch exceeds maximum size of {limit} bytes (got {actual})")]
    BatchTooLarge { limit: usize, actual: usize },
    #[error("CSV must have a header row and at least one data row.")]
    MissingHeaderOrData,
    #[error(
        "Missing required CSV header: '{missing}'. Please ensure your CSV file includes this header (case-insensitive). Detected headers from file (lowercase): [{detected}]. Required headers are: [{required}]"
    )]
    MissingHeader {
        missing: String,
        detected: String,
        required: String,
    },

    #[error("unknown field path: '{0}'")]
    UnknownFieldPath(String),
    #[error("invalid value for {field}: '{value}' ({reason})")]
    InvalidField {
        field: &'static str,
        value: String,
        reason: String,
    },

    #[error("Invalid prediction API key. Please check your configuration.")]
    PredictionKeyInvalid,
    #[error("Invalid JSON response structure from prediction model: {0}")]
    PredictionShape(String),
    #[error("failed to parse prediction response as JSON: {0}")]
    PredictionJson(serde_json::Error),
    #[error("Failed to get prediction from AI model. Details: {0}")]
    PredictionFailed(String),

    #[error("id error: {0}")]
    Id(#[from] readmit_ids::IdError),
}

pub type CoreResult<T> = std::result::Result<T, CoreError>;
