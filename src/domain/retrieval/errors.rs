//! Retrieval-specific error types.

use chrono::{DateTime, Utc};

use crate::domain::cycle::Cycle;
use crate::domain::foundation::ErrorCode;

/// Errors raised while locating a cached item for a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetrievalError {
    /// The candidate cycle lies further in the future than the search limit allows.
    FutureBeyondLimit { cycle: Cycle, limit_hours: u32 },
    /// The search exhausted its window without finding a cached item.
    NotFound {
        target: DateTime<Utc>,
        limit_hours: u32,
    },
    /// The request itself could not be interpreted.
    InvalidRequest(String),
    /// The cache could not be read.
    Storage(String),
}

impl RetrievalError {
    pub fn not_found(target: DateTime<Utc>, limit_hours: u32) -> Self {
        RetrievalError::NotFound {
            target,
            limit_hours,
        }
    }
    pub fn invalid_request(message: impl Into<String>) -> Self {
        RetrievalError::InvalidRequest(message.into())
    }
    pub fn storage(message: impl Into<String>) -> Self {
        RetrievalError::Storage(message.into())
    }
    pub fn code(&self) -> ErrorCode {
        match self {
            RetrievalError::FutureBeyondLimit { .. } => ErrorCode::FutureBeyondLimit,
            RetrievalError::NotFound { .. } => ErrorCode::NoData,
            RetrievalError::InvalidRequest(_) => ErrorCode::InvalidRequest,
            RetrievalError::Storage(_) => ErrorCode::StorageError,
        }
    }
    pub fn message(&self) -> String {
        match self {
            RetrievalError::FutureBeyondLimit { cycle, limit_hours } => format!(
                "No current data available: cycle {} is more than {}h ahead",
                cycle, limit_hours
            ),
            RetrievalError::NotFound {
                target,
                limit_hours,
            } => format!(
                "No current data available within {}h of {}",
                limit_hours,
                target.to_rfc3339()
            ),
            RetrievalError::InvalidRequest(msg) => format!("Invalid request: {}", msg),
            RetrievalError::Storage(msg) => format!("Storage error: {}", msg),
        }
    }

    /// True for the "nothing cached for this request" family.
    pub fn is_no_data(&self) -> bool {
        matches!(
            self,
            RetrievalError::FutureBeyondLimit { .. } | RetrievalError::NotFound { .. }
        )
    }
}

impl std::fmt::Display for RetrievalError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for RetrievalError {}
