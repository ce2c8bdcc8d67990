use std::time::Duration;
use thiserror::Error;
use crate::services::StoreError;

/// Errors surfaced by the lunch engine
#[derive(Debug, Error)]
pub enum LunchError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate conflict: {0}")]
    DuplicateConflict(String),

    #[error("Invalid lunch time: {0}")]
    ScheduleParse(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Deadline of {0:?} exceeded")]
    Timeout(Duration),
}

impl LunchError {
    /// Short machine-readable name, used in JSON error bodies
    pub fn kind(&self) -> &'static str {
        match self {
            LunchError::NotFound(_) => "not_found",
            LunchError::DuplicateConflict(_) => "duplicate_conflict",
            LunchError::ScheduleParse(_) => "schedule_parse_error",
            LunchError::Validation(_) => "validation_error",
            LunchError::Storage(_) => "storage_error",
            LunchError::Timeout(_) => "timeout",
        }
    }
}

impl From<StoreError> for LunchError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotFound(what) => LunchError::NotFound(what),
            StoreError::Duplicate(what) => LunchError::DuplicateConflict(what),
            other => LunchError::Storage(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, LunchError>;

/// Run a storage future under an optional deadline
pub(crate) async fn with_deadline<T, F>(deadline: Option<Duration>, fut: F) -> Result<T>
where
    F: std::future::Future<Output = Result<T>>,
{
    match deadline {
        Some(limit) => tokio::time::timeout(limit, fut)
            .await
            .map_err(|_| LunchError::Timeout(limit))?,
        None => fut.await,
    }
}
