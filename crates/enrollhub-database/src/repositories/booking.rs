//! Booking repository implementation.

use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use enrollhub_core::error::{AppError, ErrorKind};
use enrollhub_core::result::AppResult;
use enrollhub_core::types::{BatchId, BookingId, PageRequest, PageResponse, StudentId};
use enrollhub_entity::booking::Booking;

use super::map_write_error;
use crate::store::{BookingFilter, BookingState};

/// Repository for booking queries and writes.
#[derive(Debug, Clone)]
pub struct BookingRepository {
    pool: PgPool,
}

impl BookingRepository {
    /// Create a new booking repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a booking by ID.
    pub async fn find_by_id(&self, id: BookingId) -> AppResult<Option<Booking>> {
        sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find booking", e))
    }

    /// Find the active booking of a student in a batch.
    pub async fn find_active(
        &self,
        student_id: StudentId,
        batch_id: BatchId,
    ) -> AppResult<Option<Booking>> {
        sqlx::query_as::<_, Booking>(
            "SELECT * FROM bookings WHERE student_id = $1 AND batch_id = $2 AND status IN ('pending', 'confirmed', 'active')",
        )
        .bind(student_id)
        .bind(batch_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to find active booking", e)
        })
    }

    /// Active bookings referencing a batch, oldest first.
    pub async fn find_active_by_batch(&self, batch_id: BatchId) -> AppResult<Vec<Booking>> {
        sqlx::query_as::<_, Booking>(
            "SELECT * FROM bookings WHERE batch_id = $1 AND status IN ('pending', 'confirmed', 'active') \
             ORDER BY enrolled_at, id",
        )
        .bind(batch_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to list batch bookings", e)
        })
    }

    /// Bookings that still occupy a seat in a batch.
    pub async fn find_seat_holders_by_batch(&self, batch_id: BatchId) -> AppResult<Vec<Booking>> {
        sqlx::query_as::<_, Booking>(
            "SELECT * FROM bookings WHERE batch_id = $1 AND status <> 'cancelled' \
             ORDER BY enrolled_at, id",
        )
        .bind(batch_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to list batch seat holders", e)
        })
    }

    /// List bookings matching a filter, newest first.
    pub async fn list(
        &self,
        filter: &BookingFilter,
        page: &PageRequest,
    ) -> AppResult<PageResponse<Booking>> {
        let mut count_query = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM bookings WHERE TRUE");
        push_filter(&mut count_query, filter);
        let total: i64 = count_query
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to count bookings", e)
            })?;

        let mut query = QueryBuilder::<Postgres>::new("SELECT * FROM bookings WHERE TRUE");
        push_filter(&mut query, filter);
        query
            .push(" ORDER BY created_at DESC, id DESC LIMIT ")
            .push_bind(page.limit() as i64)
            .push(" OFFSET ")
            .push_bind(page.offset() as i64);
        let items = query
            .build_query_as::<Booking>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to list bookings", e)
            })?;

        Ok(PageResponse::new(
            items,
            page.page,
            page.page_size,
            total.max(0) as u64,
        ))
    }

    /// Update the mutable fields of a booking still in the `expected` state.
    pub async fn update(&self, booking: &Booking, expected: BookingState) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE bookings SET payment_status = $2, payment_method = $3, payment_id = $4, \
             paid_at = $5, status = $6, cancelled_at = $7, cancellation_reason = $8, \
             refund_amount_cents = $9, refunded_at = $10, refund_reason = $11, \
             parent_notes = $12, updated_at = $13 \
             WHERE id = $1 AND status = $14 AND payment_status = $15",
        )
        .bind(booking.id)
        .bind(booking.payment_status)
        .bind(booking.payment_method)
        .bind(&booking.payment_id)
        .bind(booking.paid_at)
        .bind(booking.status)
        .bind(booking.cancelled_at)
        .bind(&booking.cancellation_reason)
        .bind(booking.refund_amount_cents)
        .bind(booking.refunded_at)
        .bind(&booking.refund_reason)
        .bind(&booking.parent_notes)
        .bind(booking.updated_at)
        .bind(expected.status)
        .bind(expected.payment_status)
        .execute(&self.pool)
        .await
        .map_err(|e| map_write_error("Failed to update booking", e))?;

        if result.rows_affected() == 0 {
            return match self.find_by_id(booking.id).await? {
                Some(_) => Err(AppError::conflict(format!(
                    "Booking {} was modified concurrently",
                    booking.id
                ))),
                None => Err(AppError::not_found(format!(
                    "Booking {} not found",
                    booking.id
                ))),
            };
        }
        Ok(())
    }

    /// Insert a booking, or write its status and cancellation fields if it exists.
    ///
    /// Payment fields of an existing row are left alone; they only change
    /// through [`update`](Self::update). An existing row that already reached
    /// a terminal status is not touched and the call fails with `Conflict`.
    pub async fn upsert(conn: &mut PgConnection, booking: &Booking) -> AppResult<()> {
        let result = sqlx::query(
            "INSERT INTO bookings (id, parent_id, student_id, program_id, batch_id, amount_cents, \
             payment_status, payment_method, payment_id, paid_at, status, enrolled_at, \
             cancelled_at, cancellation_reason, refund_amount_cents, refunded_at, refund_reason, \
             parent_notes, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, \
             $18, $19, $20) \
             ON CONFLICT (id) DO UPDATE SET \
             status = EXCLUDED.status, cancelled_at = EXCLUDED.cancelled_at, \
             cancellation_reason = EXCLUDED.cancellation_reason, updated_at = EXCLUDED.updated_at \
             WHERE bookings.status IN ('pending', 'confirmed', 'active')",
        )
        .bind(booking.id)
        .bind(booking.parent_id)
        .bind(booking.student_id)
        .bind(booking.program_id)
        .bind(booking.batch_id)
        .bind(booking.amount_cents)
        .bind(booking.payment_status)
        .bind(booking.payment_method)
        .bind(&booking.payment_id)
        .bind(booking.paid_at)
        .bind(booking.status)
        .bind(booking.enrolled_at)
        .bind(booking.cancelled_at)
        .bind(&booking.cancellation_reason)
        .bind(booking.refund_amount_cents)
        .bind(booking.refunded_at)
        .bind(&booking.refund_reason)
        .bind(&booking.parent_notes)
        .bind(booking.created_at)
        .bind(booking.updated_at)
        .execute(&mut *conn)
        .await
        .map_err(|e| map_write_error("Failed to write booking", e))?;

        if result.rows_affected() == 0 {
            return Err(AppError::conflict(format!(
                "Booking {} already reached a terminal status",
                booking.id
            )));
        }
        Ok(())
    }
}

fn push_filter(query: &mut QueryBuilder<'_, Postgres>, filter: &BookingFilter) {
    if let Some(parent_id) = filter.parent_id {
        query.push(" AND parent_id = ").push_bind(parent_id);
    }
    if let Some(program_ids) = &filter.program_ids {
        let ids: Vec<Uuid> = program_ids.iter().map(|id| id.into_uuid()).collect();
        query.push(" AND program_id = ANY(").push_bind(ids).push(")");
    }
    if let Some(batch_id) = filter.batch_id {
        query.push(" AND batch_id = ").push_bind(batch_id);
    }
    if let Some(status) = filter.status {
        query.push(" AND status = ").push_bind(status);
    }
}
