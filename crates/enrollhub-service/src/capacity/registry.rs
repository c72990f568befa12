//! Enrollment registry: who holds a seat in a batch.

use chrono::{DateTime, Utc};

use enrollhub_core::error::AppError;
use enrollhub_core::result::AppResult;
use enrollhub_core::types::StudentId;
use enrollhub_entity::batch::{Batch, Enrollment};

/// Whether the student is on the roster.
pub fn contains(batch: &Batch, student_id: StudentId) -> bool {
    batch.enrolled_students.iter().any(|e| e.student_id == student_id)
}

/// Append the student to the roster.
pub(crate) fn add(batch: &mut Batch, student_id: StudentId, at: DateTime<Utc>) -> AppResult<()> {
    if contains(batch, student_id) {
        return Err(AppError::already_enrolled(format!(
            "Student {student_id} is already enrolled in batch {}",
            batch.id
        )));
    }
    batch.enrolled_students.push(Enrollment {
        student_id,
        enrolled_at: at,
    });
    Ok(())
}

/// Drop the student from the roster. Returns whether an entry was removed.
pub(crate) fn remove(batch: &mut Batch, student_id: StudentId) -> bool {
    let before = batch.enrolled_students.len();
    batch.enrolled_students.retain(|e| e.student_id != student_id);
    batch.enrolled_students.len() != before
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::batch_with_capacity;

    #[test]
    fn test_add_preserves_insertion_order() {
        let mut batch = batch_with_capacity(5);
        let first = StudentId::new();
        let second = StudentId::new();
        add(&mut batch, first, Utc::now()).unwrap();
        add(&mut batch, second, Utc::now()).unwrap();
        let roster: Vec<StudentId> = batch.roster().collect();
        assert_eq!(roster, vec![first, second]);
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let mut batch = batch_with_capacity(5);
        let student = StudentId::new();
        add(&mut batch, student, Utc::now()).unwrap();
        assert!(!remove(&mut batch, StudentId::new()));
        assert!(contains(&batch, student));
        assert!(remove(&mut batch, student));
        assert!(!contains(&batch, student));
    }
}
