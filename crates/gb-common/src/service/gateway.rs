use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;
use tracing::warn;

use crate::error::MarketError;
use crate::store::{MarketStore, StoreError};

pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(15);

/// Shared handle to the store with a per-call deadline.
///
/// Every store round-trip made by a service goes through [`Gateway::call`],
/// which turns an elapsed deadline into `MarketError::Timeout` and backend
/// failures into the service error taxonomy.
#[derive(Clone)]
pub struct Gateway {
    store: Arc<dyn MarketStore>,
    deadline: Duration,
}

impl Gateway {
    pub fn new(store: Arc<dyn MarketStore>, deadline: Duration) -> Self {
        Self { store, deadline }
    }

    pub fn with_default_deadline(store: Arc<dyn MarketStore>) -> Self {
        Self::new(store, DEFAULT_STORE_TIMEOUT)
    }

    pub fn store(&self) -> &dyn MarketStore {
        self.store.as_ref()
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    /// Run one store call, returning the raw `StoreError` so callers can
    /// refine constraint violations before mapping.
    pub async fn call_raw<T, F>(
        &self,
        operation: &'static str,
        fut: F,
    ) -> Result<Result<T, StoreError>, MarketError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        match timeout(self.deadline, fut).await {
            Ok(result) => Ok(result),
            Err(_) => {
                warn!(operation, deadline_ms = self.deadline.as_millis() as u64, "store_call_timed_out");
                Err(MarketError::Timeout {
                    operation,
                    elapsed: self.deadline,
                })
            }
        }
    }

    pub async fn call<T, F>(&self, operation: &'static str, fut: F) -> Result<T, MarketError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        self.call_raw(operation, fut).await?.map_err(MarketError::from)
    }
}
