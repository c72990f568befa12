//! Student and program repository implementation.

use sqlx::PgPool;

use enrollhub_core::error::{AppError, ErrorKind};
use enrollhub_core::result::AppResult;
use enrollhub_core::types::{ProgramId, StudentId, UserId};
use enrollhub_entity::catalog::{Program, Student};

use super::map_write_error;

/// Repository for the catalog records bookings reference.
#[derive(Debug, Clone)]
pub struct CatalogRepository {
    pool: PgPool,
}

impl CatalogRepository {
    /// Create a new catalog repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new student.
    pub async fn insert_student(&self, student: &Student) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO students (id, parent_id, first_name, last_name, created_at) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(student.id)
        .bind(student.parent_id)
        .bind(&student.first_name)
        .bind(&student.last_name)
        .bind(student.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_write_error("Failed to insert student", e))?;
        Ok(())
    }

    /// Find a student by ID.
    pub async fn find_student(&self, id: StudentId) -> AppResult<Option<Student>> {
        sqlx::query_as::<_, Student>("SELECT * FROM students WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find student", e))
    }

    /// Insert a new program.
    pub async fn insert_program(&self, program: &Program) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO programs (id, tutor_id, title, created_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(program.id)
        .bind(program.tutor_id)
        .bind(&program.title)
        .bind(program.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_write_error("Failed to insert program", e))?;
        Ok(())
    }

    /// Find a program by ID.
    pub async fn find_program(&self, id: ProgramId) -> AppResult<Option<Program>> {
        sqlx::query_as::<_, Program>("SELECT * FROM programs WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find program", e))
    }

    /// List programs owned by a tutor.
    pub async fn find_programs_by_tutor(&self, tutor_id: UserId) -> AppResult<Vec<Program>> {
        sqlx::query_as::<_, Program>(
            "SELECT * FROM programs WHERE tutor_id = $1 ORDER BY created_at",
        )
        .bind(tutor_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to list tutor programs", e)
        })
    }

    /// Delete a program. The `batches` foreign key refuses while any batch
    /// of the program exists, including one inserted concurrently.
    pub async fn delete_program(&self, id: ProgramId) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM programs WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await;
        match result {
            Ok(done) => Ok(done.rows_affected() > 0),
            Err(sqlx::Error::Database(db)) if db.is_foreign_key_violation() => Err(
                AppError::conflict(format!("Program {id} still has batches")),
            ),
            Err(e) => Err(AppError::with_source(
                ErrorKind::Database,
                "Failed to delete program",
                e,
            )),
        }
    }
}
