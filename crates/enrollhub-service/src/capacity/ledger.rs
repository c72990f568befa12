//! Capacity ledger: the seat counter against `max_students`.

use tracing::error;

use enrollhub_core::error::AppError;
use enrollhub_core::result::AppResult;
use enrollhub_entity::batch::Batch;

/// Whether at least one seat is free.
pub fn has_space(batch: &Batch) -> bool {
    batch.current_enrollment < batch.max_students
}

/// Whether every seat is taken.
pub fn is_full(batch: &Batch) -> bool {
    !has_space(batch)
}

/// Free seats, never negative.
pub fn remaining_seats(batch: &Batch) -> u32 {
    (batch.max_students - batch.current_enrollment).max(0) as u32
}

/// Count one more occupied seat.
///
/// Callers check [`has_space`] first and report `BatchFull`; reaching the
/// error here means that check was skipped.
pub(crate) fn reserve_seat(batch: &mut Batch) -> AppResult<()> {
    if is_full(batch) {
        error!(
            batch_id = %batch.id,
            current_enrollment = batch.current_enrollment,
            max_students = batch.max_students,
            "Seat reservation would exceed batch capacity"
        );
        return Err(AppError::capacity_exceeded(format!(
            "Batch {} has no seat to reserve",
            batch.id
        )));
    }
    batch.current_enrollment += 1;
    Ok(())
}

/// Count one fewer occupied seat, flooring at zero.
pub(crate) fn release_seat(batch: &mut Batch) {
    if batch.current_enrollment <= 0 {
        error!(
            batch_id = %batch.id,
            current_enrollment = batch.current_enrollment,
            "Seat release on an empty batch, clamping to zero"
        );
        batch.current_enrollment = 0;
        return;
    }
    batch.current_enrollment -= 1;
}
