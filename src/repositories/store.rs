//! Interfaces del almacén de entidades
//!
//! Un trait por rol. Los servicios reciben `Arc<dyn …>` en su constructor,
//! así PostgreSQL y el almacén en memoria son intercambiables.

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{
    ConflictStatus, Dispatch, DispatchStatus, Reservation, ReservationConflict,
    ReservationFilter, ReservationStatus, TimeWindow, Vehicle,
};
use crate::utils::errors::AppResult;

#[async_trait]
pub trait VehicleStore: Send + Sync {
    async fn get_vehicle(&self, id: Uuid) -> AppResult<Option<Vehicle>>;

    async fn get_vehicle_by_driver(&self, driver_id: Uuid) -> AppResult<Option<Vehicle>>;

    /// Todos los vehículos, ordenados por nombre
    async fn list_vehicles(&self) -> AppResult<Vec<Vehicle>>;

    /// Vehículos libres durante `window`, ordenados por nombre.
    ///
    /// Libre = sin mantenimiento, sin reserva `confirmed`/`pending_driver`
    /// solapada y sin dispatch activo. Los ids de `exclude` nunca aparecen.
    async fn find_available_vehicles(
        &self,
        window: TimeWindow,
        exclude: &[Uuid],
    ) -> AppResult<Vec<Uuid>>;
}

#[async_trait]
pub trait ReservationStore: Send + Sync {
    async fn create_reservation(&self, reservation: &Reservation) -> AppResult<()>;

    /// Alta todo-o-nada: inserta la reserva y sus conflictos y pasa las
    /// reservas de `demote` a `pending_conflict`
    async fn create_reservation_with_conflicts(
        &self,
        reservation: &Reservation,
        conflicts: &[ReservationConflict],
        demote: &[Uuid],
    ) -> AppResult<()>;

    async fn get_reservation(&self, id: Uuid) -> AppResult<Option<Reservation>>;

    /// Persiste vehículo, ventana, propósito, destinos y notas
    async fn update_reservation(&self, reservation: &Reservation) -> AppResult<()>;

    async fn update_reservation_status(&self, id: Uuid, status: ReservationStatus) -> AppResult<()>;

    /// Cambia el estado sólo si el actual está en `expected`; devuelve si se aplicó
    async fn update_reservation_status_if(
        &self,
        id: Uuid,
        expected: &[ReservationStatus],
        status: ReservationStatus,
    ) -> AppResult<bool>;

    async fn update_reservation_vehicle(&self, id: Uuid, vehicle_id: Uuid) -> AppResult<()>;

    async fn cancel_reservation(&self, id: Uuid, cancelled_by: Uuid, reason: &str) -> AppResult<()>;

    async fn add_declined_vehicle(&self, id: Uuid, vehicle_id: Uuid) -> AppResult<()>;

    /// Reservas `confirmed`/`pending_conflict`/`pending_driver` del vehículo
    /// que se solapan con `window`
    async fn find_overlapping(
        &self,
        vehicle_id: Uuid,
        window: TimeWindow,
        exclude_id: Option<Uuid>,
    ) -> AppResult<Vec<Reservation>>;

    /// Ordenadas por hora de inicio
    async fn list_reservations(&self, filter: &ReservationFilter) -> AppResult<Vec<Reservation>>;
}

#[async_trait]
pub trait ConflictStore: Send + Sync {
    async fn get_conflict(&self, id: Uuid) -> AppResult<Option<ReservationConflict>>;

    /// Conflictos `pending`, más recientes primero
    async fn list_pending_conflicts(&self) -> AppResult<Vec<ReservationConflict>>;

    /// Cierra el conflicto sólo si sigue `pending`; devuelve si se aplicó
    async fn resolve_conflict(
        &self,
        id: Uuid,
        resolved_by: Uuid,
        reason: &str,
        status: ConflictStatus,
    ) -> AppResult<bool>;
}

#[async_trait]
pub trait DispatchStore: Send + Sync {
    async fn create_dispatch(&self, dispatch: &Dispatch) -> AppResult<()>;

    async fn get_dispatch(&self, id: Uuid) -> AppResult<Option<Dispatch>>;

    /// Más recientes primero
    async fn list_dispatches(
        &self,
        status: Option<DispatchStatus>,
        limit: i64,
        offset: i64,
    ) -> AppResult<Vec<Dispatch>>;

    /// Compare-and-swap: sólo asigna si el dispatch sigue `pending`
    async fn assign_dispatch(&self, id: Uuid, vehicle_id: Uuid, dispatcher_id: Uuid) -> AppResult<bool>;

    /// Cambia el estado y marca su timestamp
    async fn update_dispatch_status(&self, id: Uuid, status: DispatchStatus) -> AppResult<()>;

    /// Sólo cancela si no está `completed`/`cancelled`; devuelve si se aplicó
    async fn cancel_dispatch(&self, id: Uuid, reason: &str) -> AppResult<bool>;

    async fn get_active_dispatch_for_vehicle(&self, vehicle_id: Uuid) -> AppResult<Option<Dispatch>>;

    async fn get_active_dispatch_for_driver(&self, driver_id: Uuid) -> AppResult<Option<Dispatch>>;
}
