//! Availability queries over batches and programs.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use enrollhub_core::error::AppError;
use enrollhub_core::result::AppResult;
use enrollhub_core::types::{BatchId, ProgramId, StudentId};
use enrollhub_database::store::EnrollmentStore;
use enrollhub_entity::batch::{Batch, BatchStatus};
use enrollhub_entity::catalog::Program;

use crate::capacity::ledger;

/// Whether a batch can take a booking right now.
pub fn batch_is_open(batch: &Batch) -> bool {
    batch.status.accepts_enrollment() && ledger::has_space(batch)
}

/// Seat summary of one batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchAvailability {
    /// Batch ID.
    pub batch_id: BatchId,
    /// Owning program.
    pub program_id: ProgramId,
    /// Batch display name.
    pub name: String,
    /// Scheduling status.
    pub status: BatchStatus,
    /// First day of the batch.
    pub start_date: NaiveDate,
    /// Whether a booking would currently be accepted.
    pub is_open: bool,
    /// Seat ceiling.
    pub max_students: i32,
    /// Occupied seats.
    pub current_enrollment: i32,
    /// Free seats.
    pub remaining_seats: u32,
}

impl From<&Batch> for BatchAvailability {
    fn from(batch: &Batch) -> Self {
        Self {
            batch_id: batch.id,
            program_id: batch.program_id,
            name: batch.name.clone(),
            status: batch.status,
            start_date: batch.start_date,
            is_open: batch_is_open(batch),
            max_students: batch.max_students,
            current_enrollment: batch.current_enrollment,
            remaining_seats: ledger::remaining_seats(batch),
        }
    }
}

/// Whether any batch of a program is open.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgramAvailability {
    /// Program ID.
    pub program_id: ProgramId,
    /// At least one batch is open.
    pub has_availability: bool,
    /// Number of open batches.
    pub open_batches: usize,
}

/// One roster entry with the student's name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosterEntry {
    /// Enrolled student.
    pub student_id: StudentId,
    /// Given name, absent if the student record is gone.
    pub first_name: Option<String>,
    /// Family name.
    pub last_name: Option<String>,
    /// When the seat was taken.
    pub enrolled_at: DateTime<Utc>,
}

/// A batch together with its program and named roster.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchDetail {
    /// The batch as stored.
    #[serde(flatten)]
    pub batch: Batch,
    /// Owning program.
    pub program: Program,
    /// Enrolled students in enrollment order.
    pub roster: Vec<RosterEntry>,
}

/// Read-only availability lookups.
#[derive(Debug, Clone)]
pub struct AvailabilityService {
    /// Persistence.
    store: Arc<dyn EnrollmentStore>,
}

impl AvailabilityService {
    /// Creates a new availability service.
    pub fn new(store: Arc<dyn EnrollmentStore>) -> Self {
        Self { store }
    }

    /// Seat summary of a batch.
    pub async fn batch_availability(&self, batch_id: BatchId) -> AppResult<BatchAvailability> {
        let batch = self.find_batch(batch_id).await?;
        Ok(BatchAvailability::from(&batch))
    }

    /// A batch with its program and the names on its roster.
    pub async fn get_batch(&self, batch_id: BatchId) -> AppResult<BatchDetail> {
        let batch = self.find_batch(batch_id).await?;
        let program = self
            .store
            .find_program(batch.program_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Program {} not found", batch.program_id)))?;

        let mut roster = Vec::with_capacity(batch.enrolled_students.len());
        for entry in &batch.enrolled_students {
            let student = self.store.find_student(entry.student_id).await?;
            roster.push(RosterEntry {
                student_id: entry.student_id,
                first_name: student.as_ref().map(|s| s.first_name.clone()),
                last_name: student.map(|s| s.last_name),
                enrolled_at: entry.enrolled_at,
            });
        }

        Ok(BatchDetail {
            batch,
            program,
            roster,
        })
    }

    /// Whether any batch of the program is open.
    pub async fn program_availability(&self, program_id: ProgramId) -> AppResult<ProgramAvailability> {
        self.require_program(program_id).await?;
        let batches = self.store.find_batches_by_program(program_id).await?;
        let open = batches.iter().filter(|b| batch_is_open(b)).count();
        Ok(ProgramAvailability {
            program_id,
            has_availability: open > 0,
            open_batches: open,
        })
    }

    /// Whether the program has at least one open batch.
    pub async fn program_has_availability(&self, program_id: ProgramId) -> AppResult<bool> {
        Ok(self.program_availability(program_id).await?.has_availability)
    }

    /// Upcoming and active batches of a program ordered by start date.
    ///
    /// Full batches are included; their summary reports zero remaining seats.
    pub async fn open_batches(&self, program_id: ProgramId) -> AppResult<Vec<BatchAvailability>> {
        self.require_program(program_id).await?;
        let mut batches = self.store.find_batches_by_program(program_id).await?;
        batches.retain(|b| b.status.accepts_enrollment());
        batches.sort_by_key(|b| (b.start_date, b.created_at));
        Ok(batches.iter().map(BatchAvailability::from).collect())
    }

    async fn find_batch(&self, batch_id: BatchId) -> AppResult<Batch> {
        self.store
            .find_batch(batch_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Batch {batch_id} not found")))
    }

    async fn require_program(&self, program_id: ProgramId) -> AppResult<()> {
        self.store
            .find_program(program_id)
            .await?
            .map(|_| ())
            .ok_or_else(|| AppError::not_found(format!("Program {program_id} not found")))
    }
}
