//! Batch administration and availability handlers.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use validator::Validate;

use enrollhub_core::types::BatchId;
use enrollhub_entity::batch::Batch;
use enrollhub_service::{BatchAvailability, BatchDetail};

use crate::dto::request::{CreateBatchBody, UpdateBatchBody};
use crate::dto::response::{ApiResponse, DeletedResponse};
use crate::error::ApiError;
use crate::extractors::{Actor, parse_id};
use crate::state::AppState;

/// POST /api/batches
pub async fn create_batch(
    State(state): State<AppState>,
    actor: Actor,
    Json(body): Json<CreateBatchBody>,
) -> Result<(StatusCode, Json<ApiResponse<Batch>>), ApiError> {
    body.validate()?;
    let batch = state.batch_service.create_batch(&actor, body.into()).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(batch))))
}

/// GET /api/batches/{id}
pub async fn get_batch(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<BatchDetail>>, ApiError> {
    let id: BatchId = parse_id(&id)?;
    let detail = state.availability_service.get_batch(id).await?;
    Ok(Json(ApiResponse::ok(detail)))
}

/// PUT /api/batches/{id}
pub async fn update_batch(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<String>,
    Json(body): Json<UpdateBatchBody>,
) -> Result<Json<ApiResponse<Batch>>, ApiError> {
    let id: BatchId = parse_id(&id)?;
    body.validate()?;
    let batch = state
        .batch_service
        .update_batch(&actor, id, body.into())
        .await?;
    Ok(Json(ApiResponse::ok(batch)))
}

/// DELETE /api/batches/{id}
pub async fn delete_batch(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<DeletedResponse>>, ApiError> {
    let id: BatchId = parse_id(&id)?;
    let cancelled_bookings = state.batch_service.delete_batch(&actor, id).await?;
    Ok(Json(ApiResponse::ok(DeletedResponse { cancelled_bookings })))
}

/// GET /api/batches/{id}/availability
pub async fn batch_availability(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<BatchAvailability>>, ApiError> {
    let id: BatchId = parse_id(&id)?;
    let availability = state.availability_service.batch_availability(id).await?;
    Ok(Json(ApiResponse::ok(availability)))
}
