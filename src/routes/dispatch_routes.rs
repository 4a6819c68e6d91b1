use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;

use crate::controllers::DispatchController;
use crate::dto::common::{ApiResponse, ReasonRequest};
use crate::dto::dispatch_dto::{
    AssignRequest, CreateDispatchRequest, DispatchListQuery, EtaQuery, QuickBoardRequest,
    StatusUpdateRequest,
};
use crate::middleware::Actor;
use crate::models::Dispatch;
use crate::services::eta_service::VehicleEta;
use crate::state::AppState;
use crate::utils::errors::AppError;

type DispatchResponse = Result<Json<ApiResponse<Dispatch>>, AppError>;

pub fn create_dispatch_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_dispatch).get(list_dispatches))
        .route("/quick-board", post(quick_board))
        .route("/current", get(current_trip))
        .route("/eta", get(estimate_eta))
        .route("/:id", get(get_dispatch))
        .route("/:id/assign", post(assign_dispatch))
        .route("/:id/status", post(update_status))
        .route("/:id/cancel", post(cancel_dispatch))
}

async fn create_dispatch(
    State(state): State<AppState>,
    actor: Actor,
    Json(request): Json<CreateDispatchRequest>,
) -> DispatchResponse {
    let controller = DispatchController::new(&state);
    Ok(Json(controller.create(actor, request).await?))
}

async fn list_dispatches(
    State(state): State<AppState>,
    _actor: Actor,
    Query(query): Query<DispatchListQuery>,
) -> Result<Json<ApiResponse<Vec<Dispatch>>>, AppError> {
    let controller = DispatchController::new(&state);
    Ok(Json(controller.list(query).await?))
}

async fn get_dispatch(State(state): State<AppState>, _actor: Actor, Path(id): Path<Uuid>) -> DispatchResponse {
    let controller = DispatchController::new(&state);
    Ok(Json(controller.get(id).await?))
}

async fn assign_dispatch(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
    Json(request): Json<AssignRequest>,
) -> DispatchResponse {
    let controller = DispatchController::new(&state);
    Ok(Json(controller.assign(actor, id, request.vehicle_id).await?))
}

async fn update_status(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
    Json(request): Json<StatusUpdateRequest>,
) -> DispatchResponse {
    let controller = DispatchController::new(&state);
    Ok(Json(controller.update_status(actor, id, request.status).await?))
}

async fn cancel_dispatch(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
    request: Option<Json<ReasonRequest>>,
) -> DispatchResponse {
    let Json(request) = request.unwrap_or_default();
    let controller = DispatchController::new(&state);
    Ok(Json(controller.cancel(actor, id, &request.reason).await?))
}

async fn quick_board(
    State(state): State<AppState>,
    actor: Actor,
    Json(request): Json<QuickBoardRequest>,
) -> DispatchResponse {
    let controller = DispatchController::new(&state);
    Ok(Json(controller.quick_board(actor, request).await?))
}

async fn current_trip(
    State(state): State<AppState>,
    actor: Actor,
) -> Result<Json<ApiResponse<Option<Dispatch>>>, AppError> {
    let controller = DispatchController::new(&state);
    Ok(Json(controller.current(actor).await?))
}

async fn estimate_eta(
    State(state): State<AppState>,
    _actor: Actor,
    Query(query): Query<EtaQuery>,
) -> Result<Json<ApiResponse<Vec<VehicleEta>>>, AppError> {
    let controller = DispatchController::new(&state);
    Ok(Json(controller.eta(query).await?))
}
