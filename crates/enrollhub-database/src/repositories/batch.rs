//! Batch repository implementation.
//!
//! A batch is stored across two tables: `batches` holds the schedule,
//! capacity counter, and version; `batch_enrollments` holds the registry
//! with an explicit position to preserve insertion order.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sqlx::{FromRow, PgConnection, PgPool, Postgres, Transaction};
use uuid::Uuid;

use enrollhub_core::error::{AppError, ErrorKind};
use enrollhub_core::result::AppResult;
use enrollhub_core::types::{BatchId, ProgramId, StudentId};
use enrollhub_entity::batch::{Batch, BatchStatus, Enrollment, Weekday};

use super::map_write_error;

#[derive(Debug, FromRow)]
struct BatchRow {
    id: BatchId,
    program_id: ProgramId,
    name: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
    days: Vec<String>,
    start_time: NaiveTime,
    end_time: NaiveTime,
    max_students: i32,
    current_enrollment: i32,
    status: BatchStatus,
    version: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl BatchRow {
    fn into_batch(self, enrolled_students: Vec<Enrollment>) -> AppResult<Batch> {
        let days = self
            .days
            .iter()
            .map(|d| d.parse::<Weekday>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| {
                AppError::internal(format!("Batch {} has a corrupt schedule: {}", self.id, e.message))
            })?;
        Ok(Batch {
            id: self.id,
            program_id: self.program_id,
            name: self.name,
            start_date: self.start_date,
            end_date: self.end_date,
            days,
            start_time: self.start_time,
            end_time: self.end_time,
            max_students: self.max_students,
            current_enrollment: self.current_enrollment,
            status: self.status,
            enrolled_students,
            version: self.version,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct EnrollmentRow {
    batch_id: BatchId,
    student_id: StudentId,
    enrolled_at: DateTime<Utc>,
}

fn day_names(batch: &Batch) -> Vec<String> {
    batch.days.iter().map(|d| d.as_str().to_string()).collect()
}

/// Repository for batches and their enrollment registries.
#[derive(Debug, Clone)]
pub struct BatchRepository {
    pool: PgPool,
}

impl BatchRepository {
    /// Create a new batch repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a batch by ID, registry included.
    ///
    /// Row and registry come from one snapshot.
    pub async fn find_by_id(&self, id: BatchId) -> AppResult<Option<Batch>> {
        let mut tx = self.snapshot().await?;
        let row = sqlx::query_as::<_, BatchRow>("SELECT * FROM batches WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find batch", e))?;

        let Some(row) = row else {
            return Ok(None);
        };
        let enrolled = Self::load_enrollments(&mut *tx, &[row.id])
            .await?
            .remove(&row.id);
        finish(tx).await?;
        row.into_batch(enrolled.unwrap_or_default()).map(Some)
    }

    /// List the batches of a program ordered by start date.
    pub async fn find_by_program(&self, program_id: ProgramId) -> AppResult<Vec<Batch>> {
        let mut tx = self.snapshot().await?;
        let rows = sqlx::query_as::<_, BatchRow>(
            "SELECT * FROM batches WHERE program_id = $1 ORDER BY start_date, created_at",
        )
        .bind(program_id)
        .fetch_all(&mut *tx)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to list program batches", e)
        })?;

        let ids: Vec<BatchId> = rows.iter().map(|r| r.id).collect();
        let mut enrollments = Self::load_enrollments(&mut *tx, &ids).await?;
        finish(tx).await?;
        rows.into_iter()
            .map(|row| {
                let enrolled = enrollments.remove(&row.id).unwrap_or_default();
                row.into_batch(enrolled)
            })
            .collect()
    }

    /// IDs of every batch.
    pub async fn list_ids(&self) -> AppResult<Vec<BatchId>> {
        sqlx::query_scalar::<_, BatchId>("SELECT id FROM batches ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list batches", e))
    }

    /// Insert a new batch and its (normally empty) registry.
    pub async fn insert(&self, batch: &Batch) -> AppResult<()> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })?;

        sqlx::query(
            "INSERT INTO batches (id, program_id, name, start_date, end_date, days, start_time, \
             end_time, max_students, current_enrollment, status, version, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)",
        )
        .bind(batch.id)
        .bind(batch.program_id)
        .bind(&batch.name)
        .bind(batch.start_date)
        .bind(batch.end_date)
        .bind(day_names(batch))
        .bind(batch.start_time)
        .bind(batch.end_time)
        .bind(batch.max_students)
        .bind(batch.current_enrollment)
        .bind(batch.status)
        .bind(batch.version)
        .bind(batch.created_at)
        .bind(batch.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_write_error("Failed to insert batch", e))?;

        Self::replace_enrollments(&mut *tx, batch).await?;

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit batch insert", e)
        })
    }

    /// Write a batch only if its stored version equals `batch.version`.
    ///
    /// Returns the new version and update time, or `None` when the row is
    /// missing or was changed by someone else.
    pub async fn update_versioned(
        conn: &mut PgConnection,
        batch: &Batch,
    ) -> AppResult<Option<(i64, DateTime<Utc>)>> {
        sqlx::query_as::<_, (i64, DateTime<Utc>)>(
            "UPDATE batches SET name = $3, start_date = $4, end_date = $5, days = $6, \
             start_time = $7, end_time = $8, max_students = $9, current_enrollment = $10, \
             status = $11, version = version + 1, updated_at = NOW() \
             WHERE id = $1 AND version = $2 \
             RETURNING version, updated_at",
        )
        .bind(batch.id)
        .bind(batch.version)
        .bind(&batch.name)
        .bind(batch.start_date)
        .bind(batch.end_date)
        .bind(day_names(batch))
        .bind(batch.start_time)
        .bind(batch.end_time)
        .bind(batch.max_students)
        .bind(batch.current_enrollment)
        .bind(batch.status)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| map_write_error("Failed to update batch", e))
    }

    /// Whether a batch row exists.
    pub async fn exists(conn: &mut PgConnection, id: BatchId) -> AppResult<bool> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM batches WHERE id = $1)")
            .bind(id)
            .fetch_one(&mut *conn)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to check batch", e))
    }

    /// Replace the stored registry of a batch with `batch.enrolled_students`.
    pub async fn replace_enrollments(conn: &mut PgConnection, batch: &Batch) -> AppResult<()> {
        sqlx::query("DELETE FROM batch_enrollments WHERE batch_id = $1")
            .bind(batch.id)
            .execute(&mut *conn)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to clear enrollments", e)
            })?;

        if batch.enrolled_students.is_empty() {
            return Ok(());
        }

        let students: Vec<Uuid> = batch
            .enrolled_students
            .iter()
            .map(|e| e.student_id.into_uuid())
            .collect();
        let positions: Vec<i32> = (0..batch.enrolled_students.len() as i32).collect();
        let enrolled_at: Vec<DateTime<Utc>> = batch
            .enrolled_students
            .iter()
            .map(|e| e.enrolled_at)
            .collect();

        sqlx::query(
            "INSERT INTO batch_enrollments (batch_id, student_id, position, enrolled_at) \
             SELECT $1, s, p, t FROM UNNEST($2::uuid[], $3::int4[], $4::timestamptz[]) AS u(s, p, t)",
        )
        .bind(batch.id)
        .bind(students)
        .bind(positions)
        .bind(enrolled_at)
        .execute(&mut *conn)
        .await
        .map_err(|e| map_write_error("Failed to write enrollments", e))?;
        Ok(())
    }

    /// Delete a batch at `batch.version`. Its registry goes with it via
    /// `ON DELETE CASCADE`.
    ///
    /// Fails with `Conflict` when the row exists at another version.
    pub async fn delete(&self, batch: &Batch) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM batches WHERE id = $1 AND version = $2")
            .bind(batch.id)
            .bind(batch.version)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to delete batch", e))?;
        if result.rows_affected() > 0 {
            return Ok(true);
        }

        let mut conn = self.pool.acquire().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to acquire connection", e)
        })?;
        if Self::exists(&mut *conn, batch.id).await? {
            return Err(AppError::conflict(format!(
                "Batch {} was modified concurrently",
                batch.id
            )));
        }
        Ok(false)
    }

    /// Open a read-only `REPEATABLE READ` transaction.
    async fn snapshot(&self) -> AppResult<Transaction<'static, Postgres>> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to open read snapshot", e)
            })?;
        Ok(tx)
    }

    async fn load_enrollments(
        conn: &mut PgConnection,
        ids: &[BatchId],
    ) -> AppResult<HashMap<BatchId, Vec<Enrollment>>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let uuids: Vec<Uuid> = ids.iter().map(|id| id.into_uuid()).collect();
        let rows = sqlx::query_as::<_, EnrollmentRow>(
            "SELECT batch_id, student_id, enrolled_at FROM batch_enrollments \
             WHERE batch_id = ANY($1) ORDER BY batch_id, position",
        )
        .bind(uuids)
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to load enrollments", e))?;

        let mut grouped: HashMap<BatchId, Vec<Enrollment>> = HashMap::new();
        for row in rows {
            grouped.entry(row.batch_id).or_default().push(Enrollment {
                student_id: row.student_id,
                enrolled_at: row.enrolled_at,
            });
        }
        Ok(grouped)
    }
}

async fn finish(tx: Transaction<'static, Postgres>) -> AppResult<()> {
    tx.commit()
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to close read snapshot", e))
}
