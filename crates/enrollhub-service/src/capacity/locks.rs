//! Per-batch serialization of seat-moving operations.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::warn;

use enrollhub_core::error::AppError;
use enrollhub_core::result::AppResult;
use enrollhub_core::types::BatchId;
use enrollhub_database::store::EnrollmentStore;

/// One async mutex per batch. Operations on different batches never contend.
#[derive(Debug)]
pub struct BatchLocks {
    /// Lazily created lock per batch.
    locks: DashMap<BatchId, Arc<Mutex<()>>>,
    /// Upper bound on waiting for a lock.
    timeout: Duration,
}

impl BatchLocks {
    /// Creates a lock table with the given acquisition timeout.
    pub fn new(timeout: Duration) -> Self {
        Self {
            locks: DashMap::new(),
            timeout,
        }
    }

    /// Wait for exclusive access to a batch.
    ///
    /// Fails with `ServiceUnavailable` when the lock is not obtained within
    /// the configured timeout.
    pub async fn acquire(&self, batch_id: BatchId) -> AppResult<OwnedMutexGuard<()>> {
        let lock = self
            .locks
            .entry(batch_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        match tokio::time::timeout(self.timeout, lock.lock_owned()).await {
            Ok(guard) => Ok(guard),
            Err(_) => {
                warn!(
                    batch_id = %batch_id,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Timed out waiting for batch lock"
                );
                Err(AppError::service_unavailable(
                    "Batch is busy, please retry shortly",
                ))
            }
        }
    }

    /// Lock a batch only if it exists in `store`.
    ///
    /// Returns `None` for a missing batch without creating an entry.
    pub async fn acquire_existing(
        &self,
        store: &dyn EnrollmentStore,
        batch_id: BatchId,
    ) -> AppResult<Option<OwnedMutexGuard<()>>> {
        if store.find_batch(batch_id).await?.is_none() {
            return Ok(None);
        }
        self.acquire(batch_id).await.map(Some)
    }

    /// Release `guard`, dropping the entry if the batch was deleted meanwhile.
    pub async fn release(
        &self,
        store: &dyn EnrollmentStore,
        batch_id: BatchId,
        guard: OwnedMutexGuard<()>,
    ) {
        let gone = matches!(store.find_batch(batch_id).await, Ok(None));
        drop(guard);
        if gone {
            self.forget(batch_id);
        }
    }

    /// Drop the lock entry of a deleted batch.
    pub fn forget(&self, batch_id: BatchId) {
        self.locks.remove(&batch_id);
    }

    /// Number of batches with a lock entry.
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    /// Whether no lock entries exist.
    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}
