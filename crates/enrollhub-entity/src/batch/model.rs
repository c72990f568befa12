//! Batch entity model.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use enrollhub_core::types::{BatchId, ProgramId, StudentId};

use super::schedule::Weekday;
use super::status::BatchStatus;

/// One roster entry in a batch's enrollment registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enrollment {
    /// The enrolled student.
    pub student_id: StudentId,
    /// When the seat was taken.
    pub enrolled_at: DateTime<Utc>,
}

/// A scheduled offering of a program with a seat ceiling.
///
/// `current_enrollment` is a denormalized count of `enrolled_students`.
/// Only the capacity module in `enrollhub-service` changes either field,
/// and always both in the same step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Batch {
    /// Unique batch identifier.
    pub id: BatchId,
    /// Owning program.
    pub program_id: ProgramId,
    /// Display name (e.g. "Weekend Batch").
    pub name: String,
    /// First day of the batch.
    pub start_date: NaiveDate,
    /// Last day of the batch.
    pub end_date: NaiveDate,
    /// Days of the week the batch meets.
    pub days: Vec<Weekday>,
    /// Session start time.
    pub start_time: NaiveTime,
    /// Session end time.
    pub end_time: NaiveTime,
    /// Seat ceiling.
    pub max_students: i32,
    /// Occupied seats.
    pub current_enrollment: i32,
    /// Scheduling status.
    pub status: BatchStatus,
    /// Enrollment registry, in insertion order.
    pub enrolled_students: Vec<Enrollment>,
    /// Persisted revision, bumped on every committed change.
    pub version: i64,
    /// When the batch was created.
    pub created_at: DateTime<Utc>,
    /// When the batch was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Batch {
    /// Build a fresh batch with an empty registry.
    pub fn new(input: CreateBatch, now: DateTime<Utc>) -> Self {
        Self {
            id: BatchId::new(),
            program_id: input.program_id,
            name: input.name,
            start_date: input.start_date,
            end_date: input.end_date,
            days: input.days,
            start_time: input.start_time,
            end_time: input.end_time,
            max_students: input.max_students,
            current_enrollment: 0,
            status: BatchStatus::Upcoming,
            enrolled_students: Vec::new(),
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether the counter agrees with the registry and the ceiling.
    pub fn is_consistent(&self) -> bool {
        self.current_enrollment >= 0
            && self.current_enrollment <= self.max_students
            && self.current_enrollment as usize == self.enrolled_students.len()
    }

    /// Student IDs currently on the roster.
    pub fn roster(&self) -> impl Iterator<Item = StudentId> + '_ {
        self.enrolled_students.iter().map(|e| e.student_id)
    }
}

/// Data required to create a new batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBatch {
    /// Owning program.
    pub program_id: ProgramId,
    /// Display name.
    pub name: String,
    /// First day.
    pub start_date: NaiveDate,
    /// Last day.
    pub end_date: NaiveDate,
    /// Meeting days.
    pub days: Vec<Weekday>,
    /// Session start time.
    pub start_time: NaiveTime,
    /// Session end time.
    pub end_time: NaiveTime,
    /// Seat ceiling.
    pub max_students: i32,
}
