//! Almacén en memoria
//!
//! Implementa los cuatro traits de `store` sobre mapas protegidos por un
//! único `RwLock`. Lo usan los tests y el modo `STORE=memory` en desarrollo.
//! Mantiene el mismo orden determinista que PostgreSQL (vehículos por nombre).

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::{
    ConflictStatus, Dispatch, DispatchStatus, Reservation, ReservationConflict,
    ReservationFilter, ReservationStatus, TimeWindow, Vehicle,
};
use crate::repositories::store::{ConflictStore, DispatchStore, ReservationStore, VehicleStore};
use crate::utils::errors::AppResult;

#[derive(Default)]
struct Tables {
    vehicles: HashMap<Uuid, Vehicle>,
    reservations: HashMap<Uuid, Reservation>,
    conflicts: HashMap<Uuid, ReservationConflict>,
    dispatches: HashMap<Uuid, Dispatch>,
}

impl Tables {
    fn vehicles_by_name(&self) -> Vec<&Vehicle> {
        let mut vehicles: Vec<&Vehicle> = self.vehicles.values().collect();
        vehicles.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        vehicles
    }

    fn has_active_dispatch(&self, vehicle_id: Uuid) -> bool {
        self.dispatches
            .values()
            .any(|d| d.vehicle_id == Some(vehicle_id) && d.status.is_active())
    }

    fn newest_active_dispatch(&self, vehicle_id: Uuid) -> Option<Dispatch> {
        self.dispatches
            .values()
            .filter(|d| d.vehicle_id == Some(vehicle_id) && d.status.is_active())
            .max_by_key(|d| d.created_at)
            .cloned()
    }
}

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Alta o reemplazo de un vehículo (la flota se administra fuera del motor)
    pub async fn upsert_vehicle(&self, vehicle: Vehicle) {
        self.tables.write().await.vehicles.insert(vehicle.id, vehicle);
    }

    pub async fn set_maintenance(&self, vehicle_id: Uuid, maintenance: bool) {
        if let Some(vehicle) = self.tables.write().await.vehicles.get_mut(&vehicle_id) {
            vehicle.is_maintenance = maintenance;
        }
    }
}

#[async_trait]
impl VehicleStore for MemoryStore {
    async fn get_vehicle(&self, id: Uuid) -> AppResult<Option<Vehicle>> {
        Ok(self.tables.read().await.vehicles.get(&id).cloned())
    }

    async fn get_vehicle_by_driver(&self, driver_id: Uuid) -> AppResult<Option<Vehicle>> {
        let tables = self.tables.read().await;
        Ok(tables
            .vehicles_by_name()
            .into_iter()
            .find(|v| v.driver_id == driver_id)
            .cloned())
    }

    async fn list_vehicles(&self) -> AppResult<Vec<Vehicle>> {
        let tables = self.tables.read().await;
        Ok(tables.vehicles_by_name().into_iter().cloned().collect())
    }

    async fn find_available_vehicles(
        &self,
        window: TimeWindow,
        exclude: &[Uuid],
    ) -> AppResult<Vec<Uuid>> {
        let tables = self.tables.read().await;

        let ids = tables
            .vehicles_by_name()
            .into_iter()
            .filter(|v| !v.is_maintenance && !exclude.contains(&v.id))
            .filter(|v| {
                !tables.reservations.values().any(|r| {
                    r.vehicle_id == v.id
                        && ReservationStatus::BLOCKING.contains(&r.status)
                        && r.window().overlaps(&window)
                })
            })
            .filter(|v| !tables.has_active_dispatch(v.id))
            .map(|v| v.id)
            .collect();

        Ok(ids)
    }
}

#[async_trait]
impl ReservationStore for MemoryStore {
    async fn create_reservation(&self, reservation: &Reservation) -> AppResult<()> {
        self.tables
            .write()
            .await
            .reservations
            .insert(reservation.id, reservation.clone());
        Ok(())
    }

    async fn create_reservation_with_conflicts(
        &self,
        reservation: &Reservation,
        conflicts: &[ReservationConflict],
        demote: &[Uuid],
    ) -> AppResult<()> {
        let mut tables = self.tables.write().await;
        tables.reservations.insert(reservation.id, reservation.clone());
        for conflict in conflicts {
            tables.conflicts.insert(conflict.id, conflict.clone());
        }
        let now = Utc::now();
        for id in demote {
            if let Some(stored) = tables.reservations.get_mut(id) {
                stored.status = ReservationStatus::PendingConflict;
                stored.updated_at = now;
            }
        }
        Ok(())
    }

    async fn get_reservation(&self, id: Uuid) -> AppResult<Option<Reservation>> {
        Ok(self.tables.read().await.reservations.get(&id).cloned())
    }

    async fn update_reservation(&self, reservation: &Reservation) -> AppResult<()> {
        let mut tables = self.tables.write().await;
        if let Some(stored) = tables.reservations.get_mut(&reservation.id) {
            stored.vehicle_id = reservation.vehicle_id;
            stored.start_time = reservation.start_time;
            stored.end_time = reservation.end_time;
            stored.purpose = reservation.purpose.clone();
            stored.destinations = reservation.destinations.clone();
            stored.notes = reservation.notes.clone();
            stored.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn update_reservation_status(&self, id: Uuid, status: ReservationStatus) -> AppResult<()> {
        let mut tables = self.tables.write().await;
        if let Some(stored) = tables.reservations.get_mut(&id) {
            stored.status = status;
            stored.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn update_reservation_status_if(
        &self,
        id: Uuid,
        expected: &[ReservationStatus],
        status: ReservationStatus,
    ) -> AppResult<bool> {
        let mut tables = self.tables.write().await;
        match tables.reservations.get_mut(&id) {
            Some(stored) if expected.contains(&stored.status) => {
                stored.status = status;
                stored.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn update_reservation_vehicle(&self, id: Uuid, vehicle_id: Uuid) -> AppResult<()> {
        let mut tables = self.tables.write().await;
        if let Some(stored) = tables.reservations.get_mut(&id) {
            stored.vehicle_id = vehicle_id;
            stored.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn cancel_reservation(&self, id: Uuid, cancelled_by: Uuid, reason: &str) -> AppResult<()> {
        let mut tables = self.tables.write().await;
        if let Some(stored) = tables.reservations.get_mut(&id) {
            stored.status = ReservationStatus::Cancelled;
            stored.cancelled_by = Some(cancelled_by);
            stored.cancel_reason = Some(reason.to_string());
            stored.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn add_declined_vehicle(&self, id: Uuid, vehicle_id: Uuid) -> AppResult<()> {
        let mut tables = self.tables.write().await;
        if let Some(stored) = tables.reservations.get_mut(&id) {
            stored.declined_vehicle_ids.insert(vehicle_id);
            stored.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn find_overlapping(
        &self,
        vehicle_id: Uuid,
        window: TimeWindow,
        exclude_id: Option<Uuid>,
    ) -> AppResult<Vec<Reservation>> {
        let tables = self.tables.read().await;
        let mut overlaps: Vec<Reservation> = tables
            .reservations
            .values()
            .filter(|r| r.vehicle_id == vehicle_id)
            .filter(|r| Some(r.id) != exclude_id)
            .filter(|r| r.status.is_occupying() && r.window().overlaps(&window))
            .cloned()
            .collect();
        overlaps.sort_by_key(|r| (r.start_time, r.created_at));
        Ok(overlaps)
    }

    async fn list_reservations(&self, filter: &ReservationFilter) -> AppResult<Vec<Reservation>> {
        let tables = self.tables.read().await;
        let mut reservations: Vec<Reservation> = tables
            .reservations
            .values()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();
        reservations.sort_by_key(|r| (r.start_time, r.created_at));

        Ok(reservations
            .into_iter()
            .skip(filter.effective_offset() as usize)
            .take(filter.effective_limit() as usize)
            .collect())
    }
}

#[async_trait]
impl ConflictStore for MemoryStore {
    async fn get_conflict(&self, id: Uuid) -> AppResult<Option<ReservationConflict>> {
        Ok(self.tables.read().await.conflicts.get(&id).cloned())
    }

    async fn list_pending_conflicts(&self) -> AppResult<Vec<ReservationConflict>> {
        let tables = self.tables.read().await;
        let mut pending: Vec<ReservationConflict> = tables
            .conflicts
            .values()
            .filter(|c| c.status == ConflictStatus::Pending)
            .cloned()
            .collect();
        pending.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(pending)
    }

    async fn resolve_conflict(
        &self,
        id: Uuid,
        resolved_by: Uuid,
        reason: &str,
        status: ConflictStatus,
    ) -> AppResult<bool> {
        let mut tables = self.tables.write().await;
        match tables.conflicts.get_mut(&id) {
            Some(conflict) if conflict.status == ConflictStatus::Pending => {
                conflict.status = status;
                conflict.resolved_by = Some(resolved_by);
                conflict.resolution_reason = Some(reason.to_string());
                conflict.resolved_at = Some(Utc::now());
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[async_trait]
impl DispatchStore for MemoryStore {
    async fn create_dispatch(&self, dispatch: &Dispatch) -> AppResult<()> {
        self.tables
            .write()
            .await
            .dispatches
            .insert(dispatch.id, dispatch.clone());
        Ok(())
    }

    async fn get_dispatch(&self, id: Uuid) -> AppResult<Option<Dispatch>> {
        Ok(self.tables.read().await.dispatches.get(&id).cloned())
    }

    async fn list_dispatches(
        &self,
        status: Option<DispatchStatus>,
        limit: i64,
        offset: i64,
    ) -> AppResult<Vec<Dispatch>> {
        let tables = self.tables.read().await;
        let mut dispatches: Vec<Dispatch> = tables
            .dispatches
            .values()
            .filter(|d| status.map_or(true, |s| d.status == s))
            .cloned()
            .collect();
        dispatches.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(dispatches
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn assign_dispatch(&self, id: Uuid, vehicle_id: Uuid, dispatcher_id: Uuid) -> AppResult<bool> {
        let mut tables = self.tables.write().await;
        match tables.dispatches.get_mut(&id) {
            Some(dispatch) if dispatch.status == DispatchStatus::Pending => {
                dispatch.vehicle_id = Some(vehicle_id);
                dispatch.dispatcher_id = Some(dispatcher_id);
                dispatch.stamp(DispatchStatus::Assigned, Utc::now());
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn update_dispatch_status(&self, id: Uuid, status: DispatchStatus) -> AppResult<()> {
        let mut tables = self.tables.write().await;
        if let Some(dispatch) = tables.dispatches.get_mut(&id) {
            dispatch.stamp(status, Utc::now());
        }
        Ok(())
    }

    async fn cancel_dispatch(&self, id: Uuid, reason: &str) -> AppResult<bool> {
        let mut tables = self.tables.write().await;
        match tables.dispatches.get_mut(&id) {
            Some(dispatch) if !dispatch.status.is_terminal() => {
                dispatch.stamp(DispatchStatus::Cancelled, Utc::now());
                dispatch.cancel_reason = Some(reason.to_string());
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn get_active_dispatch_for_vehicle(&self, vehicle_id: Uuid) -> AppResult<Option<Dispatch>> {
        Ok(self.tables.read().await.newest_active_dispatch(vehicle_id))
    }

    async fn get_active_dispatch_for_driver(&self, driver_id: Uuid) -> AppResult<Option<Dispatch>> {
        let tables = self.tables.read().await;
        let vehicle_ids: Vec<Uuid> = tables
            .vehicles
            .values()
            .filter(|v| v.driver_id == driver_id)
            .map(|v| v.id)
            .collect();

        Ok(vehicle_ids
            .into_iter()
            .filter_map(|id| tables.newest_active_dispatch(id))
            .max_by_key(|d| d.created_at))
    }
}
