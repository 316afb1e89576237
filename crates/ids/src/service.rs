//! Generator implementations.

use crate::{IdError, IdResult};
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

/// Prefix used when none is configured.
pub const DEFAULT_ID_PREFIX: &str = "patient";

const MAX_PREFIX_LEN: usize = 64;

/// Source of identifiers for batch rows that do not carry one.
pub trait RecordIdGenerator: Send + Sync {
    /// Returns a fresh identifier for the data row at `row` (1-based line index, header excluded).
    fn next_id(&self, row: usize) -> String;
}

/// Validates an identifier prefix.
///
/// # Errors
///
/// Returns [`IdError::InvalidPrefix`] if the prefix is empty, longer than 64 characters, or
/// contains anything other than ASCII alphanumerics, `.`, `-` or `_`.
pub fn validate_prefix(prefix: &str) -> IdResult<()> {
    if prefix.is_empty() {
        return Err(IdError::InvalidPrefix("prefix cannot be empty".into()));
    }

    if prefix.len() > MAX_PREFIX_LEN {
        return Err(IdError::InvalidPrefix(format!(
            "prefix exceeds maximum length of {} characters",
            MAX_PREFIX_LEN
        )));
    }

    let ok = prefix
        .bytes()
        .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'z' | b'A'..=b'Z' | b'.' | b'-' | b'_'));

    if !ok {
        return Err(IdError::InvalidPrefix(format!(
            "prefix '{}' contains invalid characters (only alphanumeric, '.', '-', '_' allowed)",
            prefix
        )));
    }

    Ok(())
}

/// Wall-clock identifiers: `<prefix>_<unix-millis>_<row>`.
///
/// # Monotonicity Guarantee
///
/// Each call uses `max(now, previous + 1ms)` for the millisecond component, so identifiers from
/// one generator never repeat even when the clock has not advanced between calls.
#[derive(Debug)]
pub struct TimestampIdGenerator {
    prefix: String,
    last_millis: AtomicI64,
    clock: fn() -> DateTime<Utc>,
}

impl TimestampIdGenerator {
    /// Creates a generator reading the system clock.
    ///
    /// # Errors
    ///
    /// Returns [`IdError::InvalidPrefix`] if `prefix` fails [`validate_prefix`].
    pub fn new(prefix: impl Into<String>) -> IdResult<Self> {
        Self::with_clock(prefix, Utc::now)
    }

    /// Creates a generator reading time from `clock`.
    pub fn with_clock(prefix: impl Into<String>, clock: fn() -> DateTime<Utc>) -> IdResult<Self> {
        let prefix = prefix.into();
        validate_prefix(&prefix)?;
        Ok(Self {
            prefix,
            last_millis: AtomicI64::new(i64::MIN),
            clock,
        })
    }

    fn next_millis(&self) -> i64 {
        let now = (self.clock)().timestamp_millis();
        let mut prev = self.last_millis.load(Ordering::Relaxed);
        loop {
            let candidate = if now <= prev { prev.saturating_add(1) } else { now };
            match self.last_millis.compare_exchange_weak(
                prev,
                candidate,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => return candidate,
                Err(actual) => prev = actual,
            }
        }
    }
}

impl Default for TimestampIdGenerator {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_ID_PREFIX.to_string(),
            last_millis: AtomicI64::new(i64::MIN),
            clock: Utc::now,
        }
    }
}

impl RecordIdGenerator for TimestampIdGenerator {
    fn next_id(&self, row: usize) -> String {
        format!("{}_{}_{}", self.prefix, self.next_millis(), row)
    }
}

/// Deterministic identifiers: `<prefix>_1`, `<prefix>_2`, ...
///
/// The row index is ignored; the counter advances once per call.
#[derive(Debug)]
pub struct SequentialIdGenerator {
    prefix: String,
    next: AtomicU64,
}

impl SequentialIdGenerator {
    pub fn new(prefix: impl Into<String>) -> IdResult<Self> {
        let prefix = prefix.into();
        validate_prefix(&prefix)?;
        Ok(Self {
            prefix,
            next: AtomicU64::new(1),
        })
    }
}

impl Default for SequentialIdGenerator {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_ID_PREFIX.to_string(),
            next: AtomicU64::new(1),
        }
    }
}

impl RecordIdGenerator for SequentialIdGenerator {
    fn next_id(&self, _row: usize) -> String {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        format!("{}_{}", self.prefix, n)
    }
}

/// Random identifiers: `<prefix>_<uuid>` with the UUID in simple (unhyphenated) form.
#[derive(Debug)]
pub struct UuidIdGenerator {
    prefix: String,
}

impl UuidIdGenerator {
    pub fn new(prefix: impl Into<String>) -> IdResult<Self> {
        let prefix = prefix.into();
        validate_prefix(&prefix)?;
        Ok(Self { prefix })
    }
}

impl Default for UuidIdGenerator {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_ID_PREFIX.to_string(),
        }
    }
}

impl RecordIdGenerator for UuidIdGenerator {
    fn next_id(&self, _row: usize) -> String {
        format!("{}_{}", self.prefix, uuid::Uuid::new_v4().simple())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    fn fixed_clock() -> DateTime<Utc> {
        DateTime::from_timestamp_millis(1_768_141_522_045).expect("valid timestamp")
    }

    #[test]
    fn test_validate_prefix_accepts_valid_prefixes() {
        assert!(validate_prefix("patient").is_ok());
        assert!(validate_prefix("ward-7.batch_2").is_ok());
        assert!(validate_prefix("p").is_ok());
    }

    #[test]
    fn test_validate_prefix_rejects_empty() {
        let err = validate_prefix("").expect_err("should reject empty");
        assert!(matches!(err, IdError::InvalidPrefix(msg) if msg.contains("cannot be empty")));
    }

    #[test]
    fn test_validate_prefix_rejects_too_long() {
        let err = validate_prefix(&"a".repeat(65)).expect_err("should reject too long");
        assert!(
            matches!(err, IdError::InvalidPrefix(msg) if msg.contains("exceeds maximum length"))
        );
    }

    #[test]
    fn test_validate_prefix_rejects_invalid_characters() {
        for bad in ["bad prefix", "bad/prefix", "bad,prefix", "pätient"] {
            let err = validate_prefix(bad).expect_err("should reject invalid chars");
            assert!(
                matches!(err, IdError::InvalidPrefix(msg) if msg.contains("invalid characters"))
            );
        }
    }

    #[test]
    fn test_timestamp_id_format() {
        let generator =
            TimestampIdGenerator::with_clock("patient", fixed_clock).expect("valid prefix");
        assert_eq!(generator.next_id(3), "patient_1768141522045_3");
    }

    #[test]
    fn test_timestamp_id_monotonic_same_instant() {
        let generator =
            TimestampIdGenerator::with_clock("patient", fixed_clock).expect("valid prefix");

        // The clock never advances, so the generator must increment on its own
        let first = generator.next_id(1);
        let second = generator.next_id(1);

        assert_eq!(first, "patient_1768141522045_1");
        assert_eq!(second, "patient_1768141522046_1");
    }

    #[test]
    fn test_timestamp_id_default_uses_default_prefix() {
        let id = TimestampIdGenerator::default().next_id(1);
        assert!(id.starts_with("patient_"));
        assert!(id.ends_with("_1"));
    }

    #[test]
    fn test_timestamp_id_rejects_bad_prefix() {
        assert!(TimestampIdGenerator::new("has space").is_err());
    }

    #[test]
    fn test_sequential_ids_are_deterministic() {
        let generator = SequentialIdGenerator::new("test").expect("valid prefix");
        assert_eq!(generator.next_id(9), "test_1");
        assert_eq!(generator.next_id(2), "test_2");
        assert_eq!(generator.next_id(2), "test_3");
    }

    #[test]
    fn test_uuid_id_format() {
        let id = UuidIdGenerator::default().next_id(1);
        let (prefix, hex) = id.split_once('_').expect("prefix separator");

        assert_eq!(prefix, "patient");
        assert_eq!(hex.len(), 32);
        assert!(hex.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')));
    }

    #[test]
    fn test_shared_generator_is_unique_across_threads() {
        let generator = Arc::new(
            TimestampIdGenerator::with_clock("patient", fixed_clock).expect("valid prefix"),
        );

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let generator = Arc::clone(&generator);
                std::thread::spawn(move || {
                    (0..50).map(|_| generator.next_id(1)).collect::<Vec<_>>()
                })
            })
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            for id in handle.join().expect("thread panicked") {
                assert!(seen.insert(id), "duplicate id generated");
            }
        }
        assert_eq!(seen.len(), 200);
    }
}
