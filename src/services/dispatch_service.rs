//! Servicio de dispatches (viajes inmediatos)
//!
//! `pending → assigned → accepted → en_route → arrived → completed`,
//! más `cancelled` desde cualquier estado no terminal.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::models::{AuditEntry, Dispatch, DispatchStatus, NewDispatch, QuickBoard};
use crate::repositories::{DispatchStore, VehicleStore};
use crate::services::audit_service::AuditLog;
use crate::services::notification_service::{Notification, Notifier};
use crate::services::vehicle_locks::VehicleLocks;
use crate::utils::errors::{invalid_state_error, not_found_error, validation_error, AppError, AppResult};

/// Roles avisados de cada dispatch nuevo
const DISPATCH_ROLES: [&str; 2] = ["admin", "dispatcher"];

pub struct DispatchService {
    dispatches: Arc<dyn DispatchStore>,
    vehicles: Arc<dyn VehicleStore>,
    audit: Arc<dyn AuditLog>,
    notifier: Arc<dyn Notifier>,
    locks: Arc<VehicleLocks>,
}

impl DispatchService {
    pub fn new(
        dispatches: Arc<dyn DispatchStore>,
        vehicles: Arc<dyn VehicleStore>,
        audit: Arc<dyn AuditLog>,
        notifier: Arc<dyn Notifier>,
        locks: Arc<VehicleLocks>,
    ) -> Self {
        Self {
            dispatches,
            vehicles,
            audit,
            notifier,
            locks,
        }
    }

    pub async fn create(&self, request: NewDispatch, requester_id: Uuid) -> AppResult<Dispatch> {
        let dispatch = request.into_dispatch(requester_id);
        self.dispatches.create_dispatch(&dispatch).await?;

        info!(dispatch = %dispatch.id, "🚕 Dispatch creado");
        self.audit.log(
            AuditEntry::new(requester_id, "dispatch.create", "dispatch", dispatch.id).after(&dispatch),
        );
        self.notifier.notify_role(
            &DISPATCH_ROLES,
            Notification::new(
                "New Dispatch Request",
                &format!("{} - {}", dispatch.purpose, dispatch.pickup_address),
            )
            .with("type", "dispatch_created")
            .with("dispatch_id", dispatch.id),
        );
        Ok(dispatch)
    }

    /// Asigna un vehículo a un dispatch `pending`
    pub async fn assign(&self, id: Uuid, vehicle_id: Uuid, dispatcher_id: Uuid) -> AppResult<Dispatch> {
        let before = self.get(id).await?;
        if before.status != DispatchStatus::Pending {
            return Err(invalid_state_error("dispatch is not in pending status"));
        }
        self.vehicles
            .get_vehicle(vehicle_id)
            .await?
            .ok_or_else(|| not_found_error("Vehicle", vehicle_id))?;

        if !self.dispatches.assign_dispatch(id, vehicle_id, dispatcher_id).await? {
            return Err(invalid_state_error("dispatch is not in pending status"));
        }
        let after = self.get(id).await?;

        info!(dispatch = %id, vehicle = %vehicle_id, "🚕 Dispatch asignado");
        self.audit.log(
            AuditEntry::new(dispatcher_id, "dispatch.assign", "dispatch", id)
                .before(&before)
                .after(&after),
        );
        self.notifier.notify_vehicle_driver(
            vehicle_id,
            Notification::new("Trip Assigned", &format!("Pickup: {}", after.pickup_address))
            .with("type", "dispatch_assigned")
            .with("dispatch_id", id),
        );
        Ok(after)
    }

    /// Avanza el viaje. No se valida el orden, sólo que el destino sea
    /// `accepted`, `en_route`, `arrived` o `completed`.
    pub async fn update_status(&self, id: Uuid, status: DispatchStatus, actor_id: Uuid) -> AppResult<Dispatch> {
        if !status.is_progress() {
            return Err(validation_error(
                "status must be one of accepted, en_route, arrived, completed",
            ));
        }
        let before = self.get(id).await?;
        if before.status.is_terminal() {
            return Err(invalid_state_error("dispatch is already completed or cancelled"));
        }

        self.dispatches.update_dispatch_status(id, status).await?;
        let after = self.get(id).await?;

        self.audit.log(
            AuditEntry::new(actor_id, "dispatch.status_update", "dispatch", id)
                .before(&before)
                .after(&after),
        );
        Ok(after)
    }

    pub async fn cancel(&self, id: Uuid, reason: &str, actor_id: Uuid) -> AppResult<Dispatch> {
        let before = self.get(id).await?;
        if before.status.is_terminal() || !self.dispatches.cancel_dispatch(id, reason).await? {
            return Err(invalid_state_error("dispatch is already completed or cancelled"));
        }
        let after = self.get(id).await?;

        info!(dispatch = %id, "🚫 Dispatch cancelado");
        self.audit.log(
            AuditEntry::new(actor_id, "dispatch.cancel", "dispatch", id)
                .before(&before)
                .after(&after)
                .reason(reason),
        );
        Ok(after)
    }

    /// Crea, asigna y deja en `en_route` un viaje para un pasajero que ya
    /// está en el vehículo
    pub async fn quick_board(&self, order: QuickBoard, dispatcher_id: Uuid) -> AppResult<Dispatch> {
        let vehicle_id = order.vehicle_id;
        let vehicle = self
            .vehicles
            .get_vehicle(vehicle_id)
            .await?
            .ok_or_else(|| not_found_error("Vehicle", vehicle_id))?;

        let _guard = self.locks.acquire(vehicle.id).await;
        if self.dispatches.get_active_dispatch_for_vehicle(vehicle.id).await?.is_some() {
            return Err(AppError::VehicleBusy(format!(
                "vehicle {} already has an active trip",
                vehicle.name
            )));
        }

        let dispatch = order.into_new_dispatch(Utc::now()).into_dispatch(dispatcher_id);
        self.dispatches.create_dispatch(&dispatch).await?;

        if !self.dispatches.assign_dispatch(dispatch.id, vehicle.id, dispatcher_id).await? {
            return Err(invalid_state_error("dispatch is not in pending status"));
        }
        for status in [DispatchStatus::Accepted, DispatchStatus::EnRoute] {
            self.dispatches.update_dispatch_status(dispatch.id, status).await?;
        }
        let result = self.get(dispatch.id).await?;

        info!(dispatch = %result.id, vehicle = %vehicle.name, "🚀 Quick board");
        self.audit.log(
            AuditEntry::new(dispatcher_id, "dispatch.quick_board", "dispatch", result.id).after(&result),
        );
        Ok(result)
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Dispatch> {
        self.dispatches
            .get_dispatch(id)
            .await?
            .ok_or_else(|| not_found_error("Dispatch", id))
    }

    pub async fn list(&self, status: Option<DispatchStatus>, limit: i64, offset: i64) -> AppResult<Vec<Dispatch>> {
        let limit = if limit > 0 { limit.min(100) } else { 50 };
        self.dispatches.list_dispatches(status, limit, offset.max(0)).await
    }

    /// Viaje activo del vehículo del conductor, si lo hay
    pub async fn current_trip_for_driver(&self, driver_id: Uuid) -> AppResult<Option<Dispatch>> {
        self.dispatches.get_active_dispatch_for_driver(driver_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Vehicle;
    use crate::repositories::MemoryStore;
    use crate::services::audit_service::MemoryAuditLog;
    use crate::services::notification_service::{MemoryNotifier, NotificationTarget};

    struct Fixture {
        audit: Arc<MemoryAuditLog>,
        notifier: Arc<MemoryNotifier>,
        vehicle: Vehicle,
        service: DispatchService,
    }

    async fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let audit = Arc::new(MemoryAuditLog::new());
        let notifier = Arc::new(MemoryNotifier::new());
        let vehicle = Vehicle {
            id: Uuid::new_v4(),
            name: "Alphard".into(),
            license_plate: "NAB-1234".into(),
            driver_id: Uuid::new_v4(),
            is_maintenance: false,
            latitude: None,
            longitude: None,
            location_at: None,
        };
        store.upsert_vehicle(vehicle.clone()).await;

        let service = DispatchService::new(
            store.clone(),
            store,
            audit.clone(),
            notifier.clone(),
            Arc::new(VehicleLocks::new()),
        );
        Fixture {
            audit,
            notifier,
            vehicle,
            service,
        }
    }

    fn new_dispatch() -> NewDispatch {
        NewDispatch {
            purpose: "Airport run".into(),
            pickup_address: "Main lobby".into(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_notifies_dispatch_roles() {
        let f = fixture().await;
        let dispatch = f.service.create(new_dispatch(), Uuid::new_v4()).await.unwrap();

        assert_eq!(dispatch.status, DispatchStatus::Pending);
        let sent = f.notifier.sent();
        assert_eq!(
            sent[0].target,
            NotificationTarget::Roles(vec!["admin".into(), "dispatcher".into()])
        );
    }

    #[tokio::test]
    async fn test_full_lifecycle_stamps_each_step() {
        let f = fixture().await;
        let actor = Uuid::new_v4();
        let dispatch = f.service.create(new_dispatch(), actor).await.unwrap();

        let assigned = f.service.assign(dispatch.id, f.vehicle.id, actor).await.unwrap();
        assert_eq!(assigned.status, DispatchStatus::Assigned);
        assert!(assigned.assigned_at.is_some());

        for status in [
            DispatchStatus::Accepted,
            DispatchStatus::EnRoute,
            DispatchStatus::Arrived,
            DispatchStatus::Completed,
        ] {
            f.service.update_status(dispatch.id, status, actor).await.unwrap();
        }
        let done = f.service.get(dispatch.id).await.unwrap();
        assert_eq!(done.status, DispatchStatus::Completed);
        assert!(done.accepted_at.is_some() && done.arrived_at.is_some() && done.completed_at.is_some());
        assert!(f.service.current_trip_for_driver(f.vehicle.driver_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_assign_twice_is_invalid_state() {
        let f = fixture().await;
        let dispatch = f.service.create(new_dispatch(), Uuid::new_v4()).await.unwrap();
        f.service.assign(dispatch.id, f.vehicle.id, Uuid::new_v4()).await.unwrap();

        let err = f.service.assign(dispatch.id, f.vehicle.id, Uuid::new_v4()).await.unwrap_err();
        assert_eq!(err.code(), "INVALID_STATE");
    }

    #[tokio::test]
    async fn test_update_status_rejects_non_progress_target() {
        let f = fixture().await;
        let dispatch = f.service.create(new_dispatch(), Uuid::new_v4()).await.unwrap();

        let err = f
            .service
            .update_status(dispatch.id, DispatchStatus::Cancelled, Uuid::new_v4())
            .await
            .unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_cancel_completed_is_rejected() {
        let f = fixture().await;
        let actor = Uuid::new_v4();
        let dispatch = f.service.create(new_dispatch(), actor).await.unwrap();
        f.service.assign(dispatch.id, f.vehicle.id, actor).await.unwrap();
        f.service.update_status(dispatch.id, DispatchStatus::Completed, actor).await.unwrap();

        let err = f.service.cancel(dispatch.id, "too late", actor).await.unwrap_err();
        assert_eq!(err.code(), "INVALID_STATE");
        assert_eq!(f.service.get(dispatch.id).await.unwrap().status, DispatchStatus::Completed);
    }

    #[tokio::test]
    async fn test_cancel_pending_records_reason() {
        let f = fixture().await;
        let actor = Uuid::new_v4();
        let dispatch = f.service.create(new_dispatch(), actor).await.unwrap();

        let cancelled = f.service.cancel(dispatch.id, "guest no-show", actor).await.unwrap();
        assert_eq!(cancelled.status, DispatchStatus::Cancelled);
        assert_eq!(cancelled.cancel_reason.as_deref(), Some("guest no-show"));
        assert!(cancelled.cancelled_at.is_some());
        assert_eq!(f.audit.actions(), vec!["dispatch.create", "dispatch.cancel"]);
    }

    #[tokio::test]
    async fn test_quick_board_goes_straight_to_en_route() {
        let f = fixture().await;
        let dispatcher = Uuid::new_v4();
        let trip = f
            .service
            .quick_board(
                QuickBoard {
                    vehicle_id: f.vehicle.id,
                    passenger_name: Some("Ms. Reyes".into()),
                    ..Default::default()
                },
                dispatcher,
            )
            .await
            .unwrap();

        assert_eq!(trip.status, DispatchStatus::EnRoute);
        assert_eq!(trip.vehicle_id, Some(f.vehicle.id));
        assert_eq!(trip.passenger_count, 1);
        assert!(trip.assigned_at.is_some() && trip.accepted_at.is_some() && trip.en_route_at.is_some());

        let current = f.service.current_trip_for_driver(f.vehicle.driver_id).await.unwrap();
        assert_eq!(current.map(|d| d.id), Some(trip.id));
    }

    #[tokio::test]
    async fn test_quick_board_busy_and_missing_vehicle() {
        let f = fixture().await;
        let order = || QuickBoard {
            vehicle_id: f.vehicle.id,
            ..Default::default()
        };
        f.service.quick_board(order(), Uuid::new_v4()).await.unwrap();

        let err = f.service.quick_board(order(), Uuid::new_v4()).await.unwrap_err();
        assert_eq!(err.code(), "VEHICLE_BUSY");

        let err = f
            .service
            .quick_board(
                QuickBoard {
                    vehicle_id: Uuid::new_v4(),
                    ..Default::default()
                },
                Uuid::new_v4(),
            )
            .await
            .unwrap_err();
        assert_eq!(err.code(), "NOT_FOUND");
    }
}
