use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;

use crate::controllers::BookingController;
use crate::dto::booking_dto::CreateBookingRequest;
use crate::dto::common::{ApiResponse, ReasonRequest};
use crate::middleware::Actor;
use crate::models::Reservation;
use crate::services::booking_service::BookingOutcome;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_booking_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_booking))
        .route("/pending", get(pending_for_driver))
        .route("/reservations/:id/accept", post(driver_accept))
        .route("/reservations/:id/decline", post(driver_decline))
}

async fn create_booking(
    State(state): State<AppState>,
    actor: Actor,
    Json(request): Json<CreateBookingRequest>,
) -> Result<Json<ApiResponse<BookingOutcome>>, AppError> {
    let controller = BookingController::new(&state);
    Ok(Json(controller.create(actor, request).await?))
}

async fn driver_accept(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Reservation>>, AppError> {
    let controller = BookingController::new(&state);
    Ok(Json(controller.accept(actor, id).await?))
}

async fn driver_decline(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
    request: Option<Json<ReasonRequest>>,
) -> Result<Json<ApiResponse<Reservation>>, AppError> {
    let Json(request) = request.unwrap_or_default();
    let controller = BookingController::new(&state);
    Ok(Json(controller.decline(actor, id, &request.reason).await?))
}

async fn pending_for_driver(
    State(state): State<AppState>,
    actor: Actor,
) -> Result<Json<ApiResponse<Vec<Reservation>>>, AppError> {
    let controller = BookingController::new(&state);
    Ok(Json(controller.pending(actor).await?))
}
