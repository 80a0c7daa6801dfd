use crate::errors::ErrorClass;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// Rejected input. Raised before any database work and never retried.
    #[error("validation error: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store lock poisoned")]
    Poisoned,

    #[error("blocking task failed: {0}")]
    Join(String),

    #[error("database write '{operation}' failed after {attempts} attempts: {cause}")]
    DatabaseWrite {
        operation: &'static str,
        attempts: u32,
        #[source]
        cause: Box<StoreError>,
    },

    #[error("database read '{operation}' failed after {attempts} attempts: {cause}")]
    DatabaseRead {
        operation: &'static str,
        attempts: u32,
        #[source]
        cause: Box<StoreError>,
    },
}

impl StoreError {
    /// Whether another attempt could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            StoreError::Validation(_)
                | StoreError::NotFound(_)
                | StoreError::DatabaseWrite { .. }
                | StoreError::DatabaseRead { .. }
        )
    }

    pub fn class(&self) -> ErrorClass {
        match self {
            StoreError::Validation(_) | StoreError::NotFound(_) => ErrorClass::Validation,
            _ => ErrorClass::TransientStorage,
        }
    }

    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        StoreError::Validation(msg.into())
    }
}
