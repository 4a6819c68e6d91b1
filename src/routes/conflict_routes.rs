use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;

use crate::controllers::ConflictController;
use crate::dto::common::{ApiResponse, ReasonRequest};
use crate::dto::conflict_dto::{ChangeTimeRequest, ReassignRequest};
use crate::middleware::Actor;
use crate::models::ReservationConflict;
use crate::state::AppState;
use crate::utils::errors::AppError;

type ConflictResponse = Result<Json<ApiResponse<ReservationConflict>>, AppError>;

pub fn create_conflict_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_pending))
        .route("/:id", get(get_conflict))
        .route("/:id/reassign", post(resolve_reassign))
        .route("/:id/change-time", post(resolve_change_time))
        .route("/:id/cancel", post(resolve_cancel))
        .route("/:id/force-assign", post(force_assign))
}

async fn list_pending(
    State(state): State<AppState>,
    _actor: Actor,
) -> Result<Json<ApiResponse<Vec<ReservationConflict>>>, AppError> {
    let controller = ConflictController::new(&state);
    Ok(Json(controller.list_pending().await?))
}

async fn get_conflict(State(state): State<AppState>, _actor: Actor, Path(id): Path<Uuid>) -> ConflictResponse {
    let controller = ConflictController::new(&state);
    Ok(Json(controller.get(id).await?))
}

async fn resolve_reassign(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
    Json(request): Json<ReassignRequest>,
) -> ConflictResponse {
    let controller = ConflictController::new(&state);
    Ok(Json(controller.reassign(actor, id, request).await?))
}

async fn resolve_change_time(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
    Json(request): Json<ChangeTimeRequest>,
) -> ConflictResponse {
    let controller = ConflictController::new(&state);
    Ok(Json(controller.change_time(actor, id, request).await?))
}

async fn resolve_cancel(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
    request: Option<Json<ReasonRequest>>,
) -> ConflictResponse {
    let Json(request) = request.unwrap_or_default();
    let controller = ConflictController::new(&state);
    Ok(Json(controller.cancel(actor, id, &request.reason).await?))
}

async fn force_assign(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
    request: Option<Json<ReasonRequest>>,
) -> ConflictResponse {
    let Json(request) = request.unwrap_or_default();
    let controller = ConflictController::new(&state);
    Ok(Json(controller.force_assign(actor, id, &request.reason).await?))
}
