//! Registration of students and programs, and program deletion.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use enrollhub_core::error::AppError;
use enrollhub_core::result::AppResult;
use enrollhub_core::types::{ProgramId, StudentId};
use enrollhub_database::store::EnrollmentStore;
use enrollhub_entity::actor::ActorRole;
use enrollhub_entity::catalog::{Program, Student};

use crate::access;
use crate::batch::BatchService;
use crate::booking::should_retry;
use crate::context::RequestContext;

/// Register a child under the calling parent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterStudentRequest {
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
}

/// Register a program owned by the calling tutor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterProgramRequest {
    /// Program title.
    pub title: String,
}

/// Manages students and programs.
#[derive(Debug, Clone)]
pub struct CatalogService {
    store: Arc<dyn EnrollmentStore>,
    batches: Arc<BatchService>,
}

impl CatalogService {
    /// Creates a new catalog service.
    pub fn new(store: Arc<dyn EnrollmentStore>, batches: Arc<BatchService>) -> Self {
        Self { store, batches }
    }

    /// Register a student for the calling parent.
    pub async fn register_student(
        &self,
        ctx: &RequestContext,
        req: RegisterStudentRequest,
    ) -> AppResult<Student> {
        access::require_role(ctx, &[ActorRole::Parent], "register students")?;
        let first_name = req.first_name.trim();
        let last_name = req.last_name.trim();
        if first_name.is_empty() || last_name.is_empty() {
            return Err(AppError::validation("Student first and last name are required"));
        }

        let student = Student {
            id: StudentId::new(),
            parent_id: ctx.actor_id,
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            created_at: Utc::now(),
        };
        self.store.insert_student(&student).await?;
        info!(student_id = %student.id, parent_id = %ctx.actor_id, "Student registered");
        Ok(student)
    }

    /// Register a program owned by the calling tutor.
    pub async fn register_program(
        &self,
        ctx: &RequestContext,
        req: RegisterProgramRequest,
    ) -> AppResult<Program> {
        access::require_role(ctx, &[ActorRole::Tutor], "register programs")?;
        let title = req.title.trim();
        if title.is_empty() {
            return Err(AppError::validation("Program title cannot be empty"));
        }

        let program = Program {
            id: ProgramId::new(),
            tutor_id: ctx.actor_id,
            title: title.to_string(),
            created_at: Utc::now(),
        };
        self.store.insert_program(&program).await?;
        info!(program_id = %program.id, tutor_id = %ctx.actor_id, "Program registered");
        Ok(program)
    }

    /// Fetch a program.
    pub async fn get_program(&self, program_id: ProgramId) -> AppResult<Program> {
        self.store
            .find_program(program_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Program {program_id} not found")))
    }

    /// Delete a program and every batch in it.
    ///
    /// Each batch is removed through the batch deletion path, so its active
    /// bookings are cancelled first. The store refuses to drop a program
    /// that still has batches; a batch created while the cascade runs is
    /// picked up by the next round. Returns the number of bookings cancelled.
    pub async fn delete_program(&self, ctx: &RequestContext, program_id: ProgramId) -> AppResult<usize> {
        let program = self.get_program(program_id).await?;
        access::require_program_manager(ctx, &program)?;

        let mut cancelled = 0;
        let mut deleted_batches = 0;
        let mut attempt = 0;
        loop {
            let batches = self.store.find_batches_by_program(program_id).await?;
            for batch in &batches {
                cancelled += self.batches.delete_cascade(batch.id).await?;
            }
            deleted_batches += batches.len();
            match self.store.delete_program(program_id).await {
                Ok(_) => break,
                Err(e) if should_retry(&e, attempt, self.batches.max_commit_retries()) => {
                    attempt += 1;
                    debug!(program_id = %program_id, attempt, "Program gained batches, retrying");
                }
                Err(e) => return Err(e),
            }
        }

        info!(
            program_id = %program_id,
            batches = deleted_batches,
            cancelled_bookings = cancelled,
            actor_id = %ctx.actor_id,
            "Program deleted"
        );
        Ok(cancelled)
    }
}
