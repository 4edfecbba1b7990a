use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Mutex;
use tracing::info;

use crate::{
    config::indexer_processor_config::IndexerProcessorConfig, utils::errors::ProcessorError,
};

/// Position of the last committed batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchCheckpoint {
    pub first_block_height: i64,
    pub last_block_height: i64,
    pub last_block_timestamp: DateTime<Utc>,
    pub events_in_batch: usize,
}

#[async_trait]
pub trait ProcessorStatusSaver: Send + Sync {
    async fn save_processor_status(&self, checkpoint: &BatchCheckpoint) -> Result<(), ProcessorError>;
}

/// Get a simplified processor status saver that only logs block heights.
pub fn get_processor_status_saver(config: &IndexerProcessorConfig) -> LoggingProcessorStatusSaver {
    LoggingProcessorStatusSaver {
        processor_name: config.processor_config.name().to_string(),
        last_checkpoint: Mutex::new(None),
    }
}

pub struct LoggingProcessorStatusSaver {
    processor_name: String,
    last_checkpoint: Mutex<Option<BatchCheckpoint>>,
}

impl LoggingProcessorStatusSaver {
    pub fn last_checkpoint(&self) -> Option<BatchCheckpoint> {
        self.last_checkpoint
            .lock()
            .ok()
            .and_then(|checkpoint| checkpoint.clone())
    }
}

#[async_trait]
impl ProcessorStatusSaver for LoggingProcessorStatusSaver {
    async fn save_processor_status(&self, checkpoint: &BatchCheckpoint) -> Result<(), ProcessorError> {
        info!(
            "🔄 {} processed successfully up to block: {} (blocks {}-{}, {} events)",
            self.processor_name,
            checkpoint.last_block_height,
            checkpoint.first_block_height,
            checkpoint.last_block_height,
            checkpoint.events_in_batch
        );

        let mut last = self
            .last_checkpoint
            .lock()
            .map_err(|e| ProcessorError::ProcessError {
                message: format!("Checkpoint lock poisoned: {}", e),
            })?;
        *last = Some(checkpoint.clone());

        Ok(())
    }
}
