use std::sync::Arc;

use uuid::Uuid;

use crate::dto::common::ApiResponse;
use crate::dto::conflict_dto::{ChangeTimeRequest, ReassignRequest};
use crate::middleware::Actor;
use crate::models::ReservationConflict;
use crate::services::conflict_service::ConflictService;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub struct ConflictController {
    service: Arc<ConflictService>,
}

impl ConflictController {
    pub fn new(state: &AppState) -> Self {
        Self {
            service: state.conflicts.clone(),
        }
    }

    pub async fn list_pending(&self) -> Result<ApiResponse<Vec<ReservationConflict>>, AppError> {
        Ok(ApiResponse::success(self.service.list_pending().await?))
    }

    pub async fn get(&self, id: Uuid) -> Result<ApiResponse<ReservationConflict>, AppError> {
        Ok(ApiResponse::success(self.service.get(id).await?))
    }

    pub async fn reassign(
        &self,
        actor: Actor,
        id: Uuid,
        request: ReassignRequest,
    ) -> Result<ApiResponse<ReservationConflict>, AppError> {
        log::info!("🔀 Conflicto {}: reasignar a {}", id, request.new_vehicle_id);
        let conflict = self
            .service
            .resolve_reassign(id, request.new_vehicle_id, actor.id, &request.reason)
            .await?;
        Ok(ApiResponse::success_with_message(conflict, "Conflicto resuelto"))
    }

    pub async fn change_time(
        &self,
        actor: Actor,
        id: Uuid,
        request: ChangeTimeRequest,
    ) -> Result<ApiResponse<ReservationConflict>, AppError> {
        log::info!("🕒 Conflicto {}: cambio de horario", id);
        let (changes, reason) = request.into_parts();
        let conflict = self
            .service
            .resolve_change_time(id, changes, actor.id, &reason)
            .await?;
        Ok(ApiResponse::success_with_message(conflict, "Conflicto resuelto"))
    }

    pub async fn cancel(&self, actor: Actor, id: Uuid, reason: &str) -> Result<ApiResponse<ReservationConflict>, AppError> {
        log::info!("🚫 Conflicto {}: cancelar perdedora", id);
        let conflict = self.service.resolve_cancel(id, actor.id, reason).await?;
        Ok(ApiResponse::success_with_message(conflict, "Conflicto resuelto"))
    }

    pub async fn force_assign(
        &self,
        actor: Actor,
        id: Uuid,
        reason: &str,
    ) -> Result<ApiResponse<ReservationConflict>, AppError> {
        log::warn!("⚡ Conflicto {}: asignación forzada por {}", id, actor.id);
        let conflict = self.service.force_assign(id, actor.id, reason).await?;
        Ok(ApiResponse::success_with_message(conflict, "Asignación forzada aplicada"))
    }
}
