//! Booking handlers.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use validator::Validate;

use enrollhub_core::types::{BookingId, PageResponse};
use enrollhub_entity::booking::Booking;

use crate::dto::request::{
    CancelBookingBody, CreateBookingBody, ListBookingsParams, RecordPaymentBody, UpdateStatusBody,
};
use crate::dto::response::ApiResponse;
use crate::error::ApiError;
use crate::extractors::{Actor, PaginationParams, parse_id};
use crate::state::AppState;

/// POST /api/bookings
pub async fn create_booking(
    State(state): State<AppState>,
    actor: Actor,
    Json(body): Json<CreateBookingBody>,
) -> Result<(StatusCode, Json<ApiResponse<Booking>>), ApiError> {
    body.validate()?;
    let booking = state
        .booking_service
        .create_booking(&actor, body.into())
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(booking))))
}

/// GET /api/bookings
pub async fn list_bookings(
    State(state): State<AppState>,
    actor: Actor,
    Query(params): Query<ListBookingsParams>,
    Query(page): Query<PaginationParams>,
) -> Result<Json<ApiResponse<PageResponse<Booking>>>, ApiError> {
    let result = state
        .booking_service
        .list_bookings(&actor, params.into(), page.into_page_request())
        .await?;
    Ok(Json(ApiResponse::ok(result)))
}

/// GET /api/bookings/{id}
pub async fn get_booking(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Booking>>, ApiError> {
    let id: BookingId = parse_id(&id)?;
    let booking = state.booking_service.get_booking(&actor, id).await?;
    Ok(Json(ApiResponse::ok(booking)))
}

/// POST /api/bookings/{id}/cancel
pub async fn cancel_booking(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<String>,
    body: Option<Json<CancelBookingBody>>,
) -> Result<Json<ApiResponse<Booking>>, ApiError> {
    let id: BookingId = parse_id(&id)?;
    let body = body.map(|Json(b)| b).unwrap_or_default();
    body.validate()?;
    let booking = state
        .booking_service
        .cancel_booking(&actor, id, body.reason)
        .await?;
    Ok(Json(ApiResponse::ok(booking)))
}

/// PUT /api/bookings/{id}/status
pub async fn update_status(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<String>,
    Json(body): Json<UpdateStatusBody>,
) -> Result<Json<ApiResponse<Booking>>, ApiError> {
    let id: BookingId = parse_id(&id)?;
    let booking = state
        .booking_service
        .update_status(&actor, id, body.status)
        .await?;
    Ok(Json(ApiResponse::ok(booking)))
}

/// POST /api/bookings/{id}/payment
pub async fn record_payment(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<String>,
    Json(body): Json<RecordPaymentBody>,
) -> Result<Json<ApiResponse<Booking>>, ApiError> {
    let id: BookingId = parse_id(&id)?;
    body.validate()?;
    let booking = state
        .booking_service
        .record_payment(&actor, id, body.into())
        .await?;
    Ok(Json(ApiResponse::ok(booking)))
}
