//! Enrollment reconciliation between batch rosters and bookings.
//!
//! Seat-holding bookings (active or completed) are the source of truth. A batch whose counter or
//! roster disagrees with them is rebuilt from them, unless the bookings
//! themselves exceed the seat ceiling, which needs a human decision.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info, warn};

use enrollhub_core::error::{AppError, ErrorKind};
use enrollhub_core::result::AppResult;
use enrollhub_core::types::{BatchId, StudentId};
use enrollhub_database::store::EnrollmentStore;
use enrollhub_entity::batch::{Batch, Enrollment};
use enrollhub_entity::booking::Booking;

use crate::capacity::{self, BatchLocks};

/// Drift found on one batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchDrift {
    /// Affected batch.
    pub batch_id: BatchId,
    /// Stored `current_enrollment` before repair.
    pub counter_before: i32,
    /// Stored roster length before repair.
    pub registry_before: usize,
    /// Seat-holding bookings found for the batch.
    pub seat_holders: usize,
    /// Whether the batch was rewritten.
    pub repaired: bool,
}

/// Outcome of a full reconciliation pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReconcileReport {
    /// Batches examined.
    pub batches_checked: usize,
    /// Batches found drifted and rewritten.
    pub repaired: Vec<BatchDrift>,
    /// Batches with more seat holders than seats. Left as they are.
    pub over_capacity: Vec<BatchDrift>,
}

impl ReconcileReport {
    /// True when no drift of any kind was found.
    pub fn is_clean(&self) -> bool {
        self.repaired.is_empty() && self.over_capacity.is_empty()
    }
}

/// Rebuilds batch rosters from seat-holding bookings.
#[derive(Debug, Clone)]
pub struct EnrollmentReconciler {
    /// Persistence.
    store: Arc<dyn EnrollmentStore>,
    /// Per-batch serialization, shared with the booking service.
    locks: Arc<BatchLocks>,
}

impl EnrollmentReconciler {
    /// Creates a new reconciler.
    pub fn new(store: Arc<dyn EnrollmentStore>, locks: Arc<BatchLocks>) -> Self {
        Self { store, locks }
    }

    /// Check one batch and repair it if needed.
    ///
    /// Returns `None` when the batch is consistent with its bookings.
    pub async fn reconcile_batch(&self, batch_id: BatchId) -> AppResult<Option<BatchDrift>> {
        let Some(guard) = self
            .locks
            .acquire_existing(self.store.as_ref(), batch_id)
            .await?
        else {
            return Err(AppError::not_found(format!("Batch {batch_id} not found")));
        };

        let Some(mut batch) = self.store.find_batch(batch_id).await? else {
            drop(guard);
            self.locks.forget(batch_id);
            return Err(AppError::not_found(format!("Batch {batch_id} not found")));
        };
        let holders = self.store.find_seat_holders_by_batch(batch_id).await?;

        if !has_drift(&batch, &holders) {
            return Ok(None);
        }

        let mut drift = BatchDrift {
            batch_id,
            counter_before: batch.current_enrollment,
            registry_before: batch.enrolled_students.len(),
            seat_holders: holders.len(),
            repaired: false,
        };
        warn!(
            batch_id = %batch_id,
            counter = drift.counter_before,
            registry = drift.registry_before,
            seat_holders = drift.seat_holders,
            "Enrollment drift detected, reconciling"
        );

        let roster = rebuild_roster(&batch, &holders);
        if let Err(e) = capacity::restore(&mut batch, roster) {
            if e.kind == ErrorKind::CapacityExceeded {
                error!(
                    batch_id = %batch_id,
                    seat_holders = drift.seat_holders,
                    max_students = batch.max_students,
                    "Batch is oversold, manual intervention required"
                );
                return Ok(Some(drift));
            }
            return Err(e);
        }

        self.store.save_batch(&batch).await?;
        drift.repaired = true;
        info!(
            batch_id = %batch_id,
            current_enrollment = batch.current_enrollment,
            "Batch reconciliation completed"
        );
        Ok(Some(drift))
    }

    /// Check every batch.
    ///
    /// A failure on one batch is logged and does not stop the pass.
    pub async fn reconcile_all(&self) -> AppResult<ReconcileReport> {
        let ids = self.store.list_batch_ids().await?;
        let mut report = ReconcileReport::default();

        for batch_id in ids {
            match self.reconcile_batch(batch_id).await {
                Ok(None) => {}
                Ok(Some(drift)) if drift.repaired => report.repaired.push(drift),
                Ok(Some(drift)) => report.over_capacity.push(drift),
                // Deleted since the id listing.
                Err(e) if e.kind == ErrorKind::NotFound => continue,
                Err(e) => {
                    error!(batch_id = %batch_id, error = %e, "Failed to reconcile batch");
                    continue;
                }
            }
            report.batches_checked += 1;
        }

        Ok(report)
    }

    /// Reconcile everything once at startup to recover from crashes.
    pub async fn startup_recovery(&self) -> AppResult<ReconcileReport> {
        info!("Running startup enrollment recovery");

        let report = self.reconcile_all().await?;

        if report.is_clean() {
            info!(
                batches = report.batches_checked,
                "Startup recovery: enrollments are consistent"
            );
        } else {
            info!(
                batches = report.batches_checked,
                repaired = report.repaired.len(),
                over_capacity = report.over_capacity.len(),
                "Startup recovery corrected enrollment drift"
            );
        }

        Ok(report)
    }
}

fn has_drift(batch: &Batch, holders: &[Booking]) -> bool {
    if batch.current_enrollment as usize != holders.len()
        || batch.enrolled_students.len() != holders.len()
    {
        return true;
    }
    let roster: HashSet<StudentId> = batch.roster().collect();
    roster.len() != holders.len() || holders.iter().any(|b| !roster.contains(&b.student_id))
}

/// One entry per seat-holding booking, keeping the original `enrolled_at` of
/// students already on the roster.
fn rebuild_roster(batch: &Batch, holders: &[Booking]) -> Vec<Enrollment> {
    let known: HashMap<StudentId, _> = batch
        .enrolled_students
        .iter()
        .map(|e| (e.student_id, e.enrolled_at))
        .collect();

    let mut seen = HashSet::new();
    holders
        .iter()
        .filter(|b| seen.insert(b.student_id))
        .map(|b| Enrollment {
            student_id: b.student_id,
            enrolled_at: known.get(&b.student_id).copied().unwrap_or(b.enrolled_at),
        })
        .collect()
}
