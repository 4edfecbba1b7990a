use crate::db::store::EntityKind;
use thiserror::Error;

pub type ProcessorResult<T> = Result<T, ProcessorError>;

#[derive(Debug, Error)]
pub enum ProcessorError {
    #[error("Processing error: {message}")]
    ProcessError { message: String },

    /// Malformed payload. The event is logged and skipped.
    #[error("Failed to decode {event_name} event in tx {tx_hash}: {message}")]
    DecodeError {
        event_name: String,
        tx_hash: String,
        message: String,
    },

    /// A dependent entity that address filtering guarantees is absent.
    #[error("Missing {kind} entity with id {id}")]
    MissingEntity { kind: EntityKind, id: String },

    #[error("Token metadata unavailable for {address}: {reason}")]
    TokenMetadataUnavailable { address: String, reason: String },

    #[error("Store error: {0}")]
    StoreError(#[from] anyhow::Error),
}

impl ProcessorError {
    pub fn missing(kind: EntityKind, id: impl Into<String>) -> Self {
        Self::MissingEntity {
            kind,
            id: id.into(),
        }
    }

    /// Errors that abort only the current event rather than the whole batch.
    pub fn is_event_scoped(&self) -> bool {
        matches!(
            self,
            Self::DecodeError { .. } | Self::TokenMetadataUnavailable { .. }
        )
    }
}
