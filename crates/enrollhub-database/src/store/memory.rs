//! In-memory [`EnrollmentStore`] for single-node deployments and tests.
//!
//! All state sits behind one `RwLock`, so a commit is a single critical
//! section: the version check, the uniqueness check, and both writes
//! happen under the same write guard.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::debug;

use enrollhub_core::error::AppError;
use enrollhub_core::result::AppResult;
use enrollhub_core::types::{
    BatchId, BookingId, PageRequest, PageResponse, ProgramId, StudentId, UserId,
};
use enrollhub_entity::batch::Batch;
use enrollhub_entity::booking::Booking;
use enrollhub_entity::catalog::{Program, Student};

use super::{BookingFilter, BookingState, EnrollmentStore};

#[derive(Debug, Default)]
struct MemoryState {
    students: HashMap<StudentId, Student>,
    programs: HashMap<ProgramId, Program>,
    batches: HashMap<BatchId, Batch>,
    bookings: HashMap<BookingId, Booking>,
    /// One entry per active booking, keyed by (student, batch).
    active: HashMap<(StudentId, BatchId), BookingId>,
}

impl MemoryState {
    /// Reject `booking` if a different active booking holds its (student, batch) slot.
    fn check_unique(&self, booking: &Booking) -> AppResult<()> {
        if !booking.is_active() {
            return Ok(());
        }
        match self.active.get(&(booking.student_id, booking.batch_id)) {
            Some(existing) if *existing != booking.id => Err(AppError::already_enrolled(format!(
                "Student {} already has an active booking for batch {}",
                booking.student_id, booking.batch_id
            ))),
            _ => Ok(()),
        }
    }

    /// An existing booking in a terminal status is never rewritten by a commit.
    fn check_open(&self, booking: &Booking) -> AppResult<()> {
        match self.bookings.get(&booking.id) {
            Some(stored) if !stored.is_active() => Err(AppError::conflict(format!(
                "Booking {} already reached a terminal status",
                booking.id
            ))),
            _ => Ok(()),
        }
    }

    fn put_booking(&mut self, booking: &Booking) {
        let key = (booking.student_id, booking.batch_id);
        if booking.is_active() {
            self.active.insert(key, booking.id);
        } else if self.active.get(&key) == Some(&booking.id) {
            self.active.remove(&key);
        }
        self.bookings.insert(booking.id, booking.clone());
    }

    fn check_version(&self, batch: &Batch) -> AppResult<()> {
        let stored = self
            .batches
            .get(&batch.id)
            .ok_or_else(|| AppError::not_found(format!("Batch {} not found", batch.id)))?;
        if stored.version != batch.version {
            debug!(
                batch_id = %batch.id,
                expected = batch.version,
                actual = stored.version,
                "Batch version mismatch"
            );
            return Err(AppError::conflict(format!(
                "Batch {} was modified concurrently",
                batch.id
            )));
        }
        Ok(())
    }

    fn put_batch(&mut self, batch: &Batch) -> Batch {
        let mut stored = batch.clone();
        stored.version += 1;
        stored.updated_at = Utc::now();
        self.batches.insert(stored.id, stored.clone());
        stored
    }
}

/// Process-local store backed by hash maps.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<MemoryState>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EnrollmentStore for MemoryStore {
    async fn insert_student(&self, student: &Student) -> AppResult<()> {
        let mut state = self.state.write().await;
        state.students.insert(student.id, student.clone());
        Ok(())
    }

    async fn find_student(&self, id: StudentId) -> AppResult<Option<Student>> {
        Ok(self.state.read().await.students.get(&id).cloned())
    }

    async fn insert_program(&self, program: &Program) -> AppResult<()> {
        let mut state = self.state.write().await;
        state.programs.insert(program.id, program.clone());
        Ok(())
    }

    async fn find_program(&self, id: ProgramId) -> AppResult<Option<Program>> {
        Ok(self.state.read().await.programs.get(&id).cloned())
    }

    async fn find_programs_by_tutor(&self, tutor_id: UserId) -> AppResult<Vec<Program>> {
        let state = self.state.read().await;
        let mut programs: Vec<Program> = state
            .programs
            .values()
            .filter(|p| p.tutor_id == tutor_id)
            .cloned()
            .collect();
        programs.sort_by_key(|p| p.created_at);
        Ok(programs)
    }

    async fn delete_program(&self, id: ProgramId) -> AppResult<bool> {
        let mut state = self.state.write().await;
        if !state.programs.contains_key(&id) {
            return Ok(false);
        }
        if state.batches.values().any(|b| b.program_id == id) {
            return Err(AppError::conflict(format!("Program {id} still has batches")));
        }
        state.programs.remove(&id);
        Ok(true)
    }

    async fn insert_batch(&self, batch: &Batch) -> AppResult<()> {
        let mut state = self.state.write().await;
        if !state.programs.contains_key(&batch.program_id) {
            return Err(AppError::not_found(format!(
                "Program {} not found",
                batch.program_id
            )));
        }
        state.batches.insert(batch.id, batch.clone());
        Ok(())
    }

    async fn find_batch(&self, id: BatchId) -> AppResult<Option<Batch>> {
        Ok(self.state.read().await.batches.get(&id).cloned())
    }

    async fn find_batches_by_program(&self, program_id: ProgramId) -> AppResult<Vec<Batch>> {
        let state = self.state.read().await;
        let mut batches: Vec<Batch> = state
            .batches
            .values()
            .filter(|b| b.program_id == program_id)
            .cloned()
            .collect();
        batches.sort_by_key(|b| (b.start_date, b.created_at));
        Ok(batches)
    }

    async fn list_batch_ids(&self) -> AppResult<Vec<BatchId>> {
        let mut ids: Vec<BatchId> = self.state.read().await.batches.keys().copied().collect();
        ids.sort();
        Ok(ids)
    }

    async fn save_batch(&self, batch: &Batch) -> AppResult<Batch> {
        let mut state = self.state.write().await;
        state.check_version(batch)?;
        Ok(state.put_batch(batch))
    }

    async fn delete_batch(&self, batch: &Batch) -> AppResult<bool> {
        let mut state = self.state.write().await;
        if !state.batches.contains_key(&batch.id) {
            return Ok(false);
        }
        state.check_version(batch)?;
        state.batches.remove(&batch.id);
        Ok(true)
    }

    async fn find_booking(&self, id: BookingId) -> AppResult<Option<Booking>> {
        Ok(self.state.read().await.bookings.get(&id).cloned())
    }

    async fn find_active_booking(
        &self,
        student_id: StudentId,
        batch_id: BatchId,
    ) -> AppResult<Option<Booking>> {
        let state = self.state.read().await;
        Ok(state
            .active
            .get(&(student_id, batch_id))
            .and_then(|id| state.bookings.get(id))
            .cloned())
    }

    async fn find_active_bookings_by_batch(&self, batch_id: BatchId) -> AppResult<Vec<Booking>> {
        let state = self.state.read().await;
        let mut bookings: Vec<Booking> = state
            .bookings
            .values()
            .filter(|b| b.batch_id == batch_id && b.is_active())
            .cloned()
            .collect();
        bookings.sort_by_key(|b| (b.enrolled_at, b.id));
        Ok(bookings)
    }

    async fn find_seat_holders_by_batch(&self, batch_id: BatchId) -> AppResult<Vec<Booking>> {
        let state = self.state.read().await;
        let mut bookings: Vec<Booking> = state
            .bookings
            .values()
            .filter(|b| b.batch_id == batch_id && b.holds_seat())
            .cloned()
            .collect();
        bookings.sort_by_key(|b| (b.enrolled_at, b.id));
        Ok(bookings)
    }

    async fn list_bookings(
        &self,
        filter: &BookingFilter,
        page: &PageRequest,
    ) -> AppResult<PageResponse<Booking>> {
        let state = self.state.read().await;
        let mut bookings: Vec<Booking> = state
            .bookings
            .values()
            .filter(|b| filter.matches(b))
            .cloned()
            .collect();
        bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(PageResponse::from_vec(bookings, page))
    }

    async fn update_booking(&self, booking: &Booking, expected: BookingState) -> AppResult<()> {
        let mut state = self.state.write().await;
        let stored = state
            .bookings
            .get(&booking.id)
            .ok_or_else(|| AppError::not_found(format!("Booking {} not found", booking.id)))?;
        if BookingState::of(stored) != expected {
            return Err(AppError::conflict(format!(
                "Booking {} was modified concurrently",
                booking.id
            )));
        }
        state.check_unique(booking)?;
        state.put_booking(booking);
        Ok(())
    }

    async fn commit_enrollment(&self, batch: &Batch, booking: &Booking) -> AppResult<Batch> {
        let mut state = self.state.write().await;
        state.check_version(batch)?;
        state.check_open(booking)?;
        state.check_unique(booking)?;
        state.put_booking(booking);
        Ok(state.put_batch(batch))
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }
}
