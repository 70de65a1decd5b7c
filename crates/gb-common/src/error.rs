use std::time::Duration;

use thiserror::Error;

use crate::store::StoreError;

/// Error taxonomy surfaced by every marketplace operation.
#[derive(Debug, Error)]
pub enum MarketError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("authentication required")]
    Authentication,
    #[error("not authorized: {0}")]
    Authorization(String),
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("duplicate: {0}")]
    Duplicate(String),
    #[error("store call `{operation}` timed out after {elapsed:?}")]
    Timeout {
        operation: &'static str,
        elapsed: Duration,
    },
    #[error("dependency failure: {0}")]
    Dependency(String),
}

impl MarketError {
    pub fn validation(message: impl Into<String>) -> Self {
        MarketError::Validation(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        MarketError::Authorization(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        MarketError::Conflict(message.into())
    }

    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        MarketError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Timeouts and dependency failures may succeed when retried.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            MarketError::Timeout { .. } | MarketError::Dependency(_)
        )
    }
}

impl From<StoreError> for MarketError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::UniqueViolation(constraint) => {
                MarketError::Duplicate(format!("unique constraint {constraint} violated"))
            }
            StoreError::CheckViolation(constraint) => {
                MarketError::Validation(format!("check constraint {constraint} violated"))
            }
            other => MarketError::Dependency(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_violation_maps_to_duplicate() {
        let err = MarketError::from(StoreError::UniqueViolation("saved_jobs_user_project_key".into()));
        match err {
            MarketError::Duplicate(msg) => assert!(msg.contains("saved_jobs_user_project_key")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn unavailable_store_is_a_retryable_dependency_error() {
        let err = MarketError::from(StoreError::Unavailable("pool exhausted".into()));
        assert!(matches!(err, MarketError::Dependency(_)));
        assert!(err.is_retryable());
        assert!(!MarketError::Authentication.is_retryable());
    }
}
