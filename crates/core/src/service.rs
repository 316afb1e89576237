//! Batch ingestion service.
//!
//! Wraps [`Batch::parse_with_report`] with the configured size limit and identifier generator so
//! the REST and CLI surfaces share one entry point.

use crate::batch::{Batch, BatchReport};
use crate::config::CoreConfig;
use crate::{CoreError, CoreResult};
use readmit_ids::{RecordIdGenerator, TimestampIdGenerator};
use std::sync::Arc;

#[derive(Clone)]
pub struct BatchService {
    cfg: Arc<CoreConfig>,
    ids: Arc<dyn RecordIdGenerator>,
}

impl BatchService {
    /// Creates a service that stamps missing ids with the timestamp generator.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Id` if the configured prefix is rejected.
    pub fn new(cfg: Arc<CoreConfig>) -> CoreResult<Self> {
        let ids = TimestampIdGenerator::new(cfg.id_prefix())?;
        Ok(Self::with_generator(cfg, Arc::new(ids)))
    }

    pub fn with_generator(cfg: Arc<CoreConfig>, ids: Arc<dyn RecordIdGenerator>) -> Self {
        Self { cfg, ids }
    }

    pub fn config(&self) -> &CoreConfig {
        &self.cfg
    }

    /// Parses uploaded batch text.
    ///
    /// # Errors
    ///
    /// - `CoreError::EmptyBatch` if the text is blank.
    /// - `CoreError::BatchTooLarge` if it exceeds the configured byte limit.
    /// - Any structural error from [`Batch::parse_with_report`].
    pub fn ingest(&self, text: &str) -> CoreResult<BatchReport> {
        if text.trim().is_empty() {
            return Err(CoreError::EmptyBatch);
        }

        let limit = self.cfg.max_batch_bytes();
        if text.len() > limit {
            return Err(CoreError::BatchTooLarge {
                limit,
                actual: text.len(),
            });
        }

        let report = Batch::parse_with_report(text, self.ids.as_ref())?;
        tracing::info!(
            "ingested batch: {} record(s), {} skipped row(s)",
            report.records.len(),
            report.skipped_rows.len()
        );
        Ok(report)
    }
}
