//! Seat accounting for batches.
//!
//! The ledger (counter) and the registry (roster) are two views of the
//! same fact, so callers outside this module only use [`admit`],
//! [`discharge`] and [`restore`], which always move both together.

pub mod ledger;
pub mod locks;
pub mod registry;

use chrono::{DateTime, Utc};
use tracing::warn;

use enrollhub_core::error::AppError;
use enrollhub_core::result::AppResult;
use enrollhub_core::types::StudentId;
use enrollhub_entity::batch::{Batch, Enrollment};

pub use locks::BatchLocks;

/// Take a seat for `student_id`: registry add plus ledger reserve.
///
/// The batch is left untouched on error.
pub fn admit(batch: &mut Batch, student_id: StudentId, at: DateTime<Utc>) -> AppResult<()> {
    if registry::contains(batch, student_id) {
        return Err(AppError::already_enrolled(format!(
            "Student {student_id} is already enrolled in batch {}",
            batch.id
        )));
    }
    ledger::reserve_seat(batch)?;
    registry::add(batch, student_id, at)
}

/// Give back the seat held by `student_id`: registry remove plus ledger release.
///
/// Returns whether a seat was released. A student missing from the roster
/// leaves the counter alone so the two views stay equal.
pub fn discharge(batch: &mut Batch, student_id: StudentId) -> bool {
    if registry::remove(batch, student_id) {
        ledger::release_seat(batch);
        true
    } else {
        warn!(
            batch_id = %batch.id,
            student_id = %student_id,
            "Student not on batch roster, no seat released"
        );
        false
    }
}

/// Replace the roster wholesale and set the counter to match.
///
/// Rejects a roster larger than `max_students` with `CapacityExceeded`
/// and leaves the batch untouched.
pub fn restore(batch: &mut Batch, mut roster: Vec<Enrollment>) -> AppResult<()> {
    let seats = i32::try_from(roster.len()).unwrap_or(i32::MAX);
    if seats > batch.max_students {
        return Err(AppError::capacity_exceeded(format!(
            "Batch {} has {seats} active enrollments for {} seats",
            batch.id, batch.max_students
        )));
    }
    roster.sort_by_key(|e| e.enrolled_at);
    batch.enrolled_students = roster;
    batch.current_enrollment = seats;
    Ok(())
}

#[cfg(test)]
mod tests {
    use enrollhub_core::error::ErrorKind;

    use super::*;
    use crate::testing::batch_with_capacity;

    #[test]
    fn test_admit_moves_counter_and_roster_together() {
        let mut batch = batch_with_capacity(2);
        let student = StudentId::new();
        admit(&mut batch, student, Utc::now()).unwrap();
        assert_eq!(batch.current_enrollment, 1);
        assert!(registry::contains(&batch, student));
        assert!(batch.is_consistent());
    }

    #[test]
    fn test_admit_full_batch_leaves_batch_untouched() {
        let mut batch = batch_with_capacity(1);
        admit(&mut batch, StudentId::new(), Utc::now()).unwrap();
        let err = admit(&mut batch, StudentId::new(), Utc::now()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::CapacityExceeded);
        assert_eq!(batch.current_enrollment, 1);
        assert_eq!(batch.enrolled_students.len(), 1);
    }

    #[test]
    fn test_admit_twice_is_already_enrolled() {
        let mut batch = batch_with_capacity(3);
        let student = StudentId::new();
        admit(&mut batch, student, Utc::now()).unwrap();
        let err = admit(&mut batch, student, Utc::now()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::AlreadyEnrolled);
        assert_eq!(batch.current_enrollment, 1);
    }

    #[test]
    fn test_discharge_restores_previous_state() {
        let mut batch = batch_with_capacity(2);
        let student = StudentId::new();
        admit(&mut batch, student, Utc::now()).unwrap();
        assert!(discharge(&mut batch, student));
        assert_eq!(batch.current_enrollment, 0);
        assert!(batch.enrolled_students.is_empty());
        assert!(!discharge(&mut batch, student));
        assert_eq!(batch.current_enrollment, 0);
    }

    #[test]
    fn test_restore_rebuilds_in_enrollment_order() {
        let mut batch = batch_with_capacity(2);
        batch.current_enrollment = 2;
        let early = Enrollment {
            student_id: StudentId::new(),
            enrolled_at: Utc::now() - chrono::Duration::hours(1),
        };
        let late = Enrollment {
            student_id: StudentId::new(),
            enrolled_at: Utc::now(),
        };
        restore(&mut batch, vec![late.clone(), early.clone()]).unwrap();
        assert_eq!(batch.enrolled_students, vec![early, late]);
        assert!(batch.is_consistent());
    }

    #[test]
    fn test_restore_rejects_oversized_roster() {
        let mut batch = batch_with_capacity(1);
        let roster = (0..2)
            .map(|_| Enrollment {
                student_id: StudentId::new(),
                enrolled_at: Utc::now(),
            })
            .collect();
        let err = restore(&mut batch, roster).unwrap_err();
        assert_eq!(err.kind, ErrorKind::CapacityExceeded);
        assert!(batch.enrolled_students.is_empty());
    }
}
