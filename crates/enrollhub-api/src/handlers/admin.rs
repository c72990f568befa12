//! Admin maintenance handlers.

use axum::Json;
use axum::extract::State;

use enrollhub_entity::actor::ActorRole;
use enrollhub_service::ReconcileReport;
use enrollhub_service::access::require_role;

use crate::dto::response::ApiResponse;
use crate::error::ApiError;
use crate::extractors::Actor;
use crate::state::AppState;

/// POST /api/admin/reconcile
pub async fn reconcile(
    State(state): State<AppState>,
    actor: Actor,
) -> Result<Json<ApiResponse<ReconcileReport>>, ApiError> {
    require_role(&actor, &[ActorRole::Admin], "run reconciliation")?;
    let report = state.reconciler.reconcile_all().await?;
    Ok(Json(ApiResponse::ok(report)))
}
