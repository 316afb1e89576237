//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into core services. Services
//! never read process-wide environment variables themselves; binaries read them and hand the raw
//! values to the `*_from_env_value` helpers below.

use crate::constants::DEFAULT_MAX_BATCH_BYTES;
use crate::{CoreError, CoreResult};
use readmit_ids::{validate_prefix, DEFAULT_ID_PREFIX};

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    id_prefix: String,
    max_batch_bytes: usize,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Id` if `id_prefix` is not a valid identifier prefix, or
    /// `CoreError::InvalidInput` if `max_batch_bytes` is zero.
    pub fn new(id_prefix: String, max_batch_bytes: usize) -> CoreResult<Self> {
        validate_prefix(&id_prefix)?;

        if max_batch_bytes == 0 {
            return Err(CoreError::InvalidInput(
                "max_batch_bytes must be greater than zero".into(),
            ));
        }

        Ok(Self {
            id_prefix,
            max_batch_bytes,
        })
    }

    pub fn id_prefix(&self) -> &str {
        &self.id_prefix
    }

    pub fn max_batch_bytes(&self) -> usize {
        self.max_batch_bytes
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            id_prefix: DEFAULT_ID_PREFIX.to_string(),
            max_batch_bytes: DEFAULT_MAX_BATCH_BYTES,
        }
    }
}

/// Resolve the identifier prefix from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns the default prefix.
pub fn id_prefix_from_env_value(value: Option<String>) -> CoreResult<String> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());

    match value {
        Some(prefix) => {
            validate_prefix(&prefix)?;
            Ok(prefix)
        }
        None => Ok(DEFAULT_ID_PREFIX.to_string()),
    }
}

/// Parse the maximum batch size in bytes from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns [`DEFAULT_MAX_BATCH_BYTES`].
pub fn max_batch_bytes_from_env_value(value: Option<String>) -> CoreResult<usize> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());

    let parsed = value
        .map(|v| {
            v.parse::<usize>().map_err(|e| {
                CoreError::InvalidInput(format!("invalid max batch bytes '{}': {}", v, e))
            })
        })
        .transpose()?;

    Ok(parsed.unwrap_or(DEFAULT_MAX_BATCH_BYTES))
}

/// Build a [`CoreConfig`] from raw environment values.
pub fn core_config_from_env_values(
    id_prefix: Option<String>,
    max_batch_bytes: Option<String>,
) -> CoreResult<CoreConfig> {
    CoreConfig::new(
        id_prefix_from_env_value(id_prefix)?,
        max_batch_bytes_from_env_value(max_batch_bytes)?,
    )
}
