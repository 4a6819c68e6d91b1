use std::sync::Arc;

use uuid::Uuid;
use validator::Validate;

use crate::dto::booking_dto::CreateBookingRequest;
use crate::dto::common::ApiResponse;
use crate::middleware::Actor;
use crate::models::Reservation;
use crate::services::booking_service::{BookingOutcome, BookingService};
use crate::state::AppState;
use crate::utils::errors::AppError;

pub struct BookingController {
    service: Arc<BookingService>,
}

impl BookingController {
    pub fn new(state: &AppState) -> Self {
        Self {
            service: state.bookings.clone(),
        }
    }

    pub async fn create(
        &self,
        actor: Actor,
        request: CreateBookingRequest,
    ) -> Result<ApiResponse<BookingOutcome>, AppError> {
        request.validate()?;
        log::info!(
            "📝 Nueva reserva ({:?}, ahora={}) de {}",
            request.mode,
            request.is_now,
            actor.id
        );

        let outcome = self
            .service
            .create_booking(request.into(), actor.id, actor.priority_level)
            .await?;

        let message = match &outcome {
            BookingOutcome::Dispatch(_) => "Dispatch creado exitosamente",
            BookingOutcome::Reservation(_) => "Reserva creada, pendiente del conductor",
        };
        Ok(ApiResponse::success_with_message(outcome, message))
    }

    pub async fn accept(&self, actor: Actor, reservation_id: Uuid) -> Result<ApiResponse<Reservation>, AppError> {
        log::info!("✅ Conductor {} acepta reserva {}", actor.id, reservation_id);
        let reservation = self.service.driver_accept(reservation_id, actor.id).await?;
        Ok(ApiResponse::success(reservation))
    }

    pub async fn decline(
        &self,
        actor: Actor,
        reservation_id: Uuid,
        reason: &str,
    ) -> Result<ApiResponse<Reservation>, AppError> {
        log::info!("❌ Conductor {} rechaza reserva {}", actor.id, reservation_id);
        let reservation = self.service.driver_decline(reservation_id, actor.id, reason).await?;
        Ok(ApiResponse::success(reservation))
    }

    pub async fn pending(&self, actor: Actor) -> Result<ApiResponse<Vec<Reservation>>, AppError> {
        let reservations = self.service.pending_for_driver(actor.id).await?;
        Ok(ApiResponse::success(reservations))
    }
}
