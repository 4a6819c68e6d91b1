use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;

use crate::controllers::ReservationController;
use crate::dto::common::{ApiResponse, ReasonRequest};
use crate::dto::reservation_dto::{
    AvailabilityQuery, CreateReservationRequest, TimelineQuery, UpdateReservationRequest,
};
use crate::middleware::Actor;
use crate::models::{Reservation, ReservationFilter};
use crate::services::reservation_service::ReservationCreated;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_reservation_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_reservation).get(list_reservations))
        .route("/availability", get(check_availability))
        .route("/timeline/:vehicle_id", get(vehicle_timeline))
        .route("/:id", get(get_reservation).put(update_reservation))
        .route("/:id/cancel", post(cancel_reservation))
}

async fn create_reservation(
    State(state): State<AppState>,
    actor: Actor,
    Json(request): Json<CreateReservationRequest>,
) -> Result<Json<ApiResponse<ReservationCreated>>, AppError> {
    let controller = ReservationController::new(&state);
    Ok(Json(controller.create(actor, request).await?))
}

async fn list_reservations(
    State(state): State<AppState>,
    _actor: Actor,
    Query(filter): Query<ReservationFilter>,
) -> Result<Json<ApiResponse<Vec<Reservation>>>, AppError> {
    let controller = ReservationController::new(&state);
    Ok(Json(controller.list(filter).await?))
}

async fn get_reservation(
    State(state): State<AppState>,
    _actor: Actor,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Reservation>>, AppError> {
    let controller = ReservationController::new(&state);
    Ok(Json(controller.get(id).await?))
}

async fn update_reservation(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateReservationRequest>,
) -> Result<Json<ApiResponse<Reservation>>, AppError> {
    let controller = ReservationController::new(&state);
    Ok(Json(controller.update(actor, id, request).await?))
}

async fn cancel_reservation(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
    request: Option<Json<ReasonRequest>>,
) -> Result<Json<ApiResponse<Reservation>>, AppError> {
    let Json(request) = request.unwrap_or_default();
    let controller = ReservationController::new(&state);
    Ok(Json(controller.cancel(actor, id, &request.reason).await?))
}

async fn check_availability(
    State(state): State<AppState>,
    _actor: Actor,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<ApiResponse<Vec<Reservation>>>, AppError> {
    let controller = ReservationController::new(&state);
    Ok(Json(controller.availability(query).await?))
}

async fn vehicle_timeline(
    State(state): State<AppState>,
    _actor: Actor,
    Path(vehicle_id): Path<Uuid>,
    Query(query): Query<TimelineQuery>,
) -> Result<Json<ApiResponse<Vec<Reservation>>>, AppError> {
    let controller = ReservationController::new(&state);
    Ok(Json(controller.timeline(vehicle_id, query).await?))
}
