//! Shared fixtures for service tests.

use std::sync::Arc;

use chrono::{Duration, NaiveDate, NaiveTime, Utc};

use enrollhub_core::config::BookingConfig;
use enrollhub_core::result::AppResult;
use enrollhub_core::types::{BatchId, ProgramId, StudentId, UserId};
use enrollhub_database::store::{EnrollmentStore, MemoryStore};
use enrollhub_entity::actor::ActorRole;
use enrollhub_entity::batch::{Batch, BatchStatus, CreateBatch, Weekday};
use enrollhub_entity::booking::{Booking, NewBooking};
use enrollhub_entity::catalog::{Program, Student};

use crate::batch::{BatchService, UpdateBatchRequest};
use crate::booking::{BookingService, CreateBookingRequest};
use crate::capacity::BatchLocks;
use crate::catalog::CatalogService;
use crate::context::RequestContext;

pub(crate) fn create_batch_input(program_id: ProgramId, max_students: i32) -> CreateBatch {
    let start_date = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
    CreateBatch {
        program_id,
        name: "Weekend Batch".to_string(),
        start_date,
        end_date: start_date + Duration::days(60),
        days: vec![Weekday::Saturday, Weekday::Sunday],
        start_time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
        end_time: NaiveTime::from_hms_opt(11, 30, 0).unwrap(),
        max_students,
    }
}

/// An upcoming, empty batch in a throwaway program.
pub(crate) fn batch_with_capacity(max_students: i32) -> Batch {
    Batch::new(create_batch_input(ProgramId::new(), max_students), Utc::now())
}

/// A pending booking not tied to any stored rows.
pub(crate) fn pending_booking(amount_cents: i64) -> Booking {
    Booking::pending(
        NewBooking {
            parent_id: UserId::new(),
            student_id: StudentId::new(),
            program_id: ProgramId::new(),
            batch_id: BatchId::new(),
            amount_cents,
            parent_notes: None,
        },
        Utc::now(),
    )
}

/// One parent, one tutor, one program with one batch, over a memory store.
pub(crate) struct Fixture {
    pub store: Arc<dyn EnrollmentStore>,
    pub locks: Arc<BatchLocks>,
    pub bookings: Arc<BookingService>,
    pub batches: Arc<BatchService>,
    pub catalog: CatalogService,
    pub parent: UserId,
    pub tutor: UserId,
    pub program_id: ProgramId,
    pub batch_id: BatchId,
}

impl Fixture {
    pub async fn new(max_students: i32) -> Self {
        let store: Arc<dyn EnrollmentStore> = Arc::new(MemoryStore::new());
        let config = BookingConfig::default();
        let locks = Arc::new(BatchLocks::new(config.lock_timeout()));
        let bookings = Arc::new(BookingService::new(
            Arc::clone(&store),
            Arc::clone(&locks),
            config,
        ));
        let batches = Arc::new(BatchService::new(
            Arc::clone(&store),
            Arc::clone(&locks),
            Arc::clone(&bookings),
        ));
        let catalog = CatalogService::new(Arc::clone(&store), Arc::clone(&batches));

        let parent = UserId::new();
        let tutor = UserId::new();
        let program = Program {
            id: ProgramId::new(),
            tutor_id: tutor,
            title: "Junior Robotics".to_string(),
            created_at: Utc::now(),
        };
        store.insert_program(&program).await.unwrap();

        let batch = Batch::new(create_batch_input(program.id, max_students), Utc::now());
        store.insert_batch(&batch).await.unwrap();

        Self {
            store,
            locks,
            bookings,
            batches,
            catalog,
            parent,
            tutor,
            program_id: program.id,
            batch_id: batch.id,
        }
    }

    pub fn parent_ctx(&self) -> RequestContext {
        RequestContext::new(self.parent, ActorRole::Parent)
    }

    pub fn tutor_ctx(&self) -> RequestContext {
        RequestContext::new(self.tutor, ActorRole::Tutor)
    }

    pub fn admin_ctx(&self) -> RequestContext {
        RequestContext::new(UserId::new(), ActorRole::Admin)
    }

    /// Register a new child of the fixture parent.
    pub async fn student(&self) -> StudentId {
        let student = Student {
            id: StudentId::new(),
            parent_id: self.parent,
            first_name: "Kid".to_string(),
            last_name: "Tester".to_string(),
            created_at: Utc::now(),
        };
        self.store.insert_student(&student).await.unwrap();
        student.id
    }

    pub fn request(&self, student_id: StudentId) -> CreateBookingRequest {
        CreateBookingRequest {
            student_id,
            program_id: self.program_id,
            batch_id: self.batch_id,
            amount_cents: 12_000,
            parent_notes: None,
        }
    }

    /// Book the fixture batch as the fixture parent.
    pub async fn book(&self, student_id: StudentId) -> AppResult<Booking> {
        self.bookings
            .create_booking(&self.parent_ctx(), self.request(student_id))
            .await
    }

    pub async fn batch(&self) -> Batch {
        self.store.find_batch(self.batch_id).await.unwrap().unwrap()
    }

    /// A second program owned by the same tutor.
    pub async fn other_program(&self) -> ProgramId {
        let program = Program {
            id: ProgramId::new(),
            tutor_id: self.tutor,
            title: "Clay Modelling".to_string(),
            created_at: Utc::now(),
        };
        self.store.insert_program(&program).await.unwrap();
        program.id
    }

    pub async fn set_batch_status(&self, status: BatchStatus) {
        self.batches
            .update_batch(
                &self.admin_ctx(),
                self.batch_id,
                UpdateBatchRequest {
                    status: Some(status),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
    }
}
