//! Synthetic record identifiers.
//!
//! Batch rows that arrive without an `id` cell are given a generated identifier. The parser never
//! creates identifiers itself: a [`RecordIdGenerator`] is injected by the caller, which keeps
//! production ids time-based and test ids deterministic.
//!
//! ## Generators
//! - [`TimestampIdGenerator`]: `<prefix>_<unix-millis>_<row>`. The millisecond component is
//!   strictly increasing across calls on the same generator, so two batches parsed in the same
//!   millisecond still receive distinct ids.
//! - [`SequentialIdGenerator`]: `<prefix>_<n>` with `n` counting up from 1. Intended for tests.
//! - [`UuidIdGenerator`]: `<prefix>_<32 lowercase hex>`.
//!
//! All generators take `&self` and keep their state in atomics, so one generator can be shared
//! between threads behind an `Arc`.
//!
//! ## Prefix rules
//! - Length: 1 to 64
//! - Characters: ASCII alphanumerics, `.`, `-`, `_`

mod service;

pub use service::{
    validate_prefix, RecordIdGenerator, SequentialIdGenerator, TimestampIdGenerator,
    UuidIdGenerator, DEFAULT_ID_PREFIX,
};

/// Error type for identifier operations.
#[derive(Debug, thiserror::Error)]
pub enum IdError {
    /// The identifier prefix is empty, too long, or contains unsupported characters.
    #[error("invalid id prefix: {0}")]
    InvalidPrefix(String),
}

/// Result type for identifier operations.
pub type IdResult<T> = Result<T, IdError>;
