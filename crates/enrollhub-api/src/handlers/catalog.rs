//! Program and student handlers.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use validator::Validate;

use enrollhub_core::types::ProgramId;
use enrollhub_entity::catalog::{Program, Student};
use enrollhub_service::{BatchAvailability, ProgramAvailability};

use crate::dto::request::{RegisterProgramBody, RegisterStudentBody};
use crate::dto::response::{ApiResponse, DeletedResponse};
use crate::error::ApiError;
use crate::extractors::{Actor, parse_id};
use crate::state::AppState;

/// POST /api/students
pub async fn register_student(
    State(state): State<AppState>,
    actor: Actor,
    Json(body): Json<RegisterStudentBody>,
) -> Result<(StatusCode, Json<ApiResponse<Student>>), ApiError> {
    body.validate()?;
    let student = state
        .catalog_service
        .register_student(&actor, body.into())
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(student))))
}

/// POST /api/programs
pub async fn register_program(
    State(state): State<AppState>,
    actor: Actor,
    Json(body): Json<RegisterProgramBody>,
) -> Result<(StatusCode, Json<ApiResponse<Program>>), ApiError> {
    body.validate()?;
    let program = state
        .catalog_service
        .register_program(&actor, body.into())
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(program))))
}

/// DELETE /api/programs/{id}
pub async fn delete_program(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<DeletedResponse>>, ApiError> {
    let id: ProgramId = parse_id(&id)?;
    let cancelled_bookings = state.catalog_service.delete_program(&actor, id).await?;
    Ok(Json(ApiResponse::ok(DeletedResponse { cancelled_bookings })))
}

/// GET /api/programs/{id}/availability
pub async fn program_availability(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<ProgramAvailability>>, ApiError> {
    let id: ProgramId = parse_id(&id)?;
    let availability = state.availability_service.program_availability(id).await?;
    Ok(Json(ApiResponse::ok(availability)))
}

/// GET /api/programs/{id}/batches
pub async fn open_batches(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Vec<BatchAvailability>>>, ApiError> {
    let id: ProgramId = parse_id(&id)?;
    let batches = state.availability_service.open_batches(id).await?;
    Ok(Json(ApiResponse::ok(batches)))
}
