use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::dto::common::ApiResponse;
use crate::dto::reservation_dto::{
    AvailabilityQuery, CreateReservationRequest, TimelineQuery, UpdateReservationRequest,
};
use crate::middleware::Actor;
use crate::models::{Reservation, ReservationFilter};
use crate::services::reservation_service::{ReservationCreated, ReservationService};
use crate::state::AppState;
use crate::utils::errors::AppError;

pub struct ReservationController {
    service: Arc<ReservationService>,
}

impl ReservationController {
    pub fn new(state: &AppState) -> Self {
        Self {
            service: state.reservations.clone(),
        }
    }

    pub async fn create(
        &self,
        actor: Actor,
        request: CreateReservationRequest,
    ) -> Result<ApiResponse<ReservationCreated>, AppError> {
        request.validate()?;
        log::info!(
            "📅 Reserva para vehículo {} (prioridad {})",
            request.vehicle_id,
            actor.priority_level
        );

        let created = self
            .service
            .create(request.into(), actor.id, actor.priority_level)
            .await?;

        if created.conflicts.is_empty() {
            Ok(ApiResponse::success_with_message(created, "Reserva confirmada"))
        } else {
            log::warn!(
                "⚠️ Reserva {} en conflicto con {} reserva(s)",
                created.reservation.id,
                created.conflicts.len()
            );
            Ok(ApiResponse::success_with_message(created, "Reserva en conflicto"))
        }
    }

    pub async fn get(&self, id: Uuid) -> Result<ApiResponse<Reservation>, AppError> {
        Ok(ApiResponse::success(self.service.get(id).await?))
    }

    pub async fn list(&self, filter: ReservationFilter) -> Result<ApiResponse<Vec<Reservation>>, AppError> {
        Ok(ApiResponse::success(self.service.list(&filter).await?))
    }

    pub async fn update(
        &self,
        actor: Actor,
        id: Uuid,
        request: UpdateReservationRequest,
    ) -> Result<ApiResponse<Reservation>, AppError> {
        request.validate()?;
        let updated = self.service.update(id, request.into(), actor.id).await?;
        Ok(ApiResponse::success_with_message(updated, "Reserva actualizada"))
    }

    pub async fn cancel(&self, actor: Actor, id: Uuid, reason: &str) -> Result<ApiResponse<Reservation>, AppError> {
        log::info!("🚫 Cancelando reserva {}", id);
        let cancelled = self.service.cancel(id, actor.id, reason).await?;
        Ok(ApiResponse::success_with_message(cancelled, "Reserva cancelada"))
    }

    pub async fn availability(&self, query: AvailabilityQuery) -> Result<ApiResponse<Vec<Reservation>>, AppError> {
        let overlapping = self
            .service
            .check_availability(query.vehicle_id, query.start_time, query.end_time)
            .await?;
        Ok(ApiResponse::success(overlapping))
    }

    pub async fn timeline(
        &self,
        vehicle_id: Uuid,
        query: TimelineQuery,
    ) -> Result<ApiResponse<Vec<Reservation>>, AppError> {
        let date = query.date.unwrap_or_else(|| Utc::now().date_naive());
        Ok(ApiResponse::success(self.service.vehicle_timeline(vehicle_id, date).await?))
    }
}
