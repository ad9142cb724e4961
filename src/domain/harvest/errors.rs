//! Harvest-specific error types.

use thiserror::Error;

use super::{HarvestEvent, HarvestPhase};
use crate::domain::foundation::{ErrorCode, ValidationError};

/// Errors raised while stepping a harvest lineage.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HarvestError {
    /// An event arrived that the current phase does not handle.
    #[error("Event {event:?} is not valid in phase {phase:?}")]
    UnexpectedEvent {
        phase: HarvestPhase,
        event: HarvestEvent,
    },

    /// The phase transition table rejected a move.
    #[error(transparent)]
    InvalidTransition(#[from] ValidationError),

    /// The cache could not be prepared for a run.
    #[error("Storage error: {0}")]
    Storage(String),
}

impl HarvestError {
    pub fn storage(message: impl Into<String>) -> Self {
        HarvestError::Storage(message.into())
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            HarvestError::UnexpectedEvent { .. } | HarvestError::InvalidTransition(_) => {
                ErrorCode::InvalidStateTransition
            }
            HarvestError::Storage(_) => ErrorCode::StorageError,
        }
    }
}
