use std::sync::Arc;

use uuid::Uuid;
use validator::Validate;

use crate::dto::common::ApiResponse;
use crate::dto::dispatch_dto::{
    CreateDispatchRequest, DispatchListQuery, EtaQuery, QuickBoardRequest,
};
use crate::middleware::Actor;
use crate::models::{Dispatch, DispatchStatus, GeoPoint};
use crate::services::dispatch_service::DispatchService;
use crate::services::eta_service::{EtaEstimator, VehicleEta};
use crate::state::AppState;
use crate::utils::errors::AppError;

pub struct DispatchController {
    service: Arc<DispatchService>,
    eta: Arc<EtaEstimator>,
}

impl DispatchController {
    pub fn new(state: &AppState) -> Self {
        Self {
            service: state.dispatches.clone(),
            eta: state.eta.clone(),
        }
    }

    pub async fn create(&self, actor: Actor, request: CreateDispatchRequest) -> Result<ApiResponse<Dispatch>, AppError> {
        request.validate()?;
        log::info!("🚕 Nuevo dispatch de {}", actor.id);
        let dispatch = self.service.create(request.into(), actor.id).await?;
        Ok(ApiResponse::success_with_message(dispatch, "Dispatch creado exitosamente"))
    }

    pub async fn get(&self, id: Uuid) -> Result<ApiResponse<Dispatch>, AppError> {
        Ok(ApiResponse::success(self.service.get(id).await?))
    }

    pub async fn list(&self, query: DispatchListQuery) -> Result<ApiResponse<Vec<Dispatch>>, AppError> {
        let dispatches = self.service.list(query.status, query.limit, query.offset).await?;
        Ok(ApiResponse::success(dispatches))
    }

    pub async fn assign(&self, actor: Actor, id: Uuid, vehicle_id: Uuid) -> Result<ApiResponse<Dispatch>, AppError> {
        log::info!("🚕 Asignando dispatch {} al vehículo {}", id, vehicle_id);
        let dispatch = self.service.assign(id, vehicle_id, actor.id).await?;
        Ok(ApiResponse::success_with_message(dispatch, "Dispatch asignado"))
    }

    pub async fn update_status(
        &self,
        actor: Actor,
        id: Uuid,
        status: DispatchStatus,
    ) -> Result<ApiResponse<Dispatch>, AppError> {
        log::info!("🔄 Dispatch {} -> {:?}", id, status);
        let dispatch = self.service.update_status(id, status, actor.id).await?;
        Ok(ApiResponse::success(dispatch))
    }

    pub async fn cancel(&self, actor: Actor, id: Uuid, reason: &str) -> Result<ApiResponse<Dispatch>, AppError> {
        log::info!("🚫 Cancelando dispatch {}", id);
        let dispatch = self.service.cancel(id, reason, actor.id).await?;
        Ok(ApiResponse::success_with_message(dispatch, "Dispatch cancelado"))
    }

    pub async fn quick_board(&self, actor: Actor, request: QuickBoardRequest) -> Result<ApiResponse<Dispatch>, AppError> {
        request.validate()?;
        log::info!("🚀 Quick board en vehículo {}", request.vehicle_id);
        let dispatch = self.service.quick_board(request.into(), actor.id).await?;
        Ok(ApiResponse::success_with_message(dispatch, "Pasajero a bordo"))
    }

    pub async fn current(&self, actor: Actor) -> Result<ApiResponse<Option<Dispatch>>, AppError> {
        Ok(ApiResponse::success(self.service.current_trip_for_driver(actor.id).await?))
    }

    pub async fn eta(&self, query: EtaQuery) -> Result<ApiResponse<Vec<VehicleEta>>, AppError> {
        query.validate()?;
        let etas = self.eta.estimate_all(GeoPoint::new(query.lat, query.lng)).await?;
        Ok(ApiResponse::success(etas))
    }
}
