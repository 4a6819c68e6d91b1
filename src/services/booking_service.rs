//! Orquestador de reservas
//!
//! Punto de entrada único: un viaje "ahora" se convierte en dispatch y uno
//! futuro en reserva `pending_driver` que el conductor acepta o rechaza.
//! Al rechazar se reasigna sola al siguiente vehículo libre; el conjunto de
//! vehículos excluidos sólo crece, así que la cascada siempre termina.
//!
//! Elegir un vehículo libre y escribir la reserva ocurre con el lock del
//! vehículo tomado, igual que el alta directa de reservas.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::OwnedMutexGuard;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::{
    AuditEntry, Dispatch, NewDispatch, NewReservation, Reservation, ReservationFilter,
    ReservationStatus, TimeWindow, Vehicle,
};
use crate::repositories::{ReservationStore, VehicleStore};
use crate::services::audit_service::AuditLog;
use crate::services::dispatch_service::DispatchService;
use crate::services::notification_service::{Notification, Notifier};
use crate::services::vehicle_locks::VehicleLocks;
use crate::utils::errors::{
    invalid_state_error, not_found_error, permission_denied_error, validation_error, AppError,
    AppResult,
};
use crate::utils::validation::validate_not_in_past;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingMode {
    /// Vehículo elegido por quien reserva
    Specific,
    /// Cualquier vehículo libre
    Any,
}

#[derive(Debug, Clone)]
pub struct BookingRequest {
    pub mode: BookingMode,
    pub is_now: bool,
    pub vehicle_id: Option<Uuid>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub purpose: String,
    pub passenger_name: Option<String>,
    pub pickup_address: String,
    pub pickup_lat: Option<f64>,
    pub pickup_lng: Option<f64>,
    pub destinations: Vec<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum BookingOutcome {
    Dispatch(Dispatch),
    Reservation(Reservation),
}

pub struct BookingService {
    dispatches: Arc<DispatchService>,
    vehicles: Arc<dyn VehicleStore>,
    reservations: Arc<dyn ReservationStore>,
    audit: Arc<dyn AuditLog>,
    notifier: Arc<dyn Notifier>,
    locks: Arc<VehicleLocks>,
}

impl BookingService {
    pub fn new(
        dispatches: Arc<DispatchService>,
        vehicles: Arc<dyn VehicleStore>,
        reservations: Arc<dyn ReservationStore>,
        audit: Arc<dyn AuditLog>,
        notifier: Arc<dyn Notifier>,
        locks: Arc<VehicleLocks>,
    ) -> Self {
        Self {
            dispatches,
            vehicles,
            reservations,
            audit,
            notifier,
            locks,
        }
    }

    pub async fn create_booking(
        &self,
        request: BookingRequest,
        requester_id: Uuid,
        priority_level: i32,
    ) -> AppResult<BookingOutcome> {
        if request.mode == BookingMode::Specific && request.vehicle_id.is_none() {
            return Err(validation_error("vehicle_id is required when mode is specific"));
        }

        if request.is_now {
            self.create_now(request, requester_id).await.map(BookingOutcome::Dispatch)
        } else {
            self.create_future(request, requester_id, priority_level)
                .await
                .map(BookingOutcome::Reservation)
        }
    }

    async fn create_now(&self, request: BookingRequest, requester_id: Uuid) -> AppResult<Dispatch> {
        // El primer destino hace de punto de bajada
        let new = NewDispatch {
            purpose: request.purpose,
            passenger_name: request.passenger_name,
            passenger_count: 1,
            notes: request.notes,
            pickup_address: request.pickup_address,
            pickup_lat: request.pickup_lat,
            pickup_lng: request.pickup_lng,
            dropoff_address: request.destinations.into_iter().next(),
            ..Default::default()
        };
        let dispatch = self.dispatches.create(new, requester_id).await?;

        match (request.mode, request.vehicle_id) {
            (BookingMode::Specific, Some(vehicle_id)) => {
                self.dispatches.assign(dispatch.id, vehicle_id, requester_id).await
            }
            _ => Ok(dispatch),
        }
    }

    async fn create_future(
        &self,
        request: BookingRequest,
        requester_id: Uuid,
        priority_level: i32,
    ) -> AppResult<Reservation> {
        let (Some(start), Some(end)) = (request.start_time, request.end_time) else {
            return Err(validation_error(
                "start_time and end_time are required for future bookings",
            ));
        };
        let window = TimeWindow::new(start, end)?;
        validate_not_in_past(window.start, Utc::now())?;

        let (vehicle_id, _guard) = match (request.mode, request.vehicle_id) {
            (BookingMode::Specific, Some(vehicle_id)) => {
                self.vehicle(vehicle_id).await?;
                (vehicle_id, None)
            }
            _ => {
                let (vehicle_id, guard) = self.claim_available(window, &[]).await?.ok_or_else(|| {
                    AppError::ResourceUnavailable("no vehicles available for this time slot".into())
                })?;
                (vehicle_id, Some(guard))
            }
        };

        let reservation = NewReservation {
            vehicle_id,
            start_time: window.start,
            end_time: window.end,
            purpose: request.purpose,
            destinations: request.destinations,
            notes: request.notes,
            passenger_name: request.passenger_name,
            pickup_address: Some(request.pickup_address),
            pickup_lat: request.pickup_lat,
            pickup_lng: request.pickup_lng,
        }
        .into_reservation(requester_id, priority_level, ReservationStatus::PendingDriver);
        self.reservations.create_reservation(&reservation).await?;

        info!(reservation = %reservation.id, vehicle = %vehicle_id, "📅 Reserva pendiente de conductor");
        self.audit.log(
            AuditEntry::new(requester_id, "reservation.create", "reservation", reservation.id)
                .after(&reservation),
        );
        self.notify_pending(vehicle_id, &reservation);
        Ok(reservation)
    }

    pub async fn driver_accept(&self, reservation_id: Uuid, driver_id: Uuid) -> AppResult<Reservation> {
        let (reservation, _) = self.pending_for_vehicle_of(reservation_id, driver_id, "accept").await?;

        self.reservations
            .update_reservation_status(reservation_id, ReservationStatus::Confirmed)
            .await?;
        let accepted = self.reservation(reservation_id).await?;

        info!(reservation = %reservation_id, "✅ Conductor aceptó la reserva");
        self.audit.log(
            AuditEntry::new(driver_id, "reservation.driver_accept", "reservation", reservation_id)
                .before(&reservation)
                .after(&accepted),
        );
        self.notifier.notify_user(
            reservation.requester_id,
            Notification::new("Reservation Confirmed", &reservation.purpose)
            .with("type", "reservation_confirmed")
            .with("reservation_id", reservation_id),
        );
        Ok(accepted)
    }

    /// Rechazo del conductor y reasignación automática
    pub async fn driver_decline(
        &self,
        reservation_id: Uuid,
        driver_id: Uuid,
        reason: &str,
    ) -> AppResult<Reservation> {
        let (reservation, vehicle) = self.pending_for_vehicle_of(reservation_id, driver_id, "decline").await?;

        self.reservations.add_declined_vehicle(reservation_id, vehicle.id).await?;
        self.audit.log(
            AuditEntry::new(driver_id, "reservation.driver_decline", "reservation", reservation_id)
                .before(&reservation)
                .reason(reason),
        );

        let mut declined = reservation.declined_vehicle_ids.clone();
        declined.insert(vehicle.id);
        let exclude = declined.exclusion_set(reservation.vehicle_id);

        match self.claim_available(reservation.window(), &exclude).await? {
            None => {
                warn!(reservation = %reservation_id, declined = declined.len(), "⚠️ Sin vehículos para reasignar");
                self.reservations
                    .update_reservation_status(reservation_id, ReservationStatus::DriverDeclined)
                    .await?;
            }
            Some((next, _guard)) => {
                info!(reservation = %reservation_id, vehicle = %next, "🔁 Reserva reasignada");
                self.reservations.update_reservation_vehicle(reservation_id, next).await?;
                self.reservations
                    .update_reservation_status(reservation_id, ReservationStatus::PendingDriver)
                    .await?;
                self.notify_pending(next, &reservation);
            }
        }

        self.reservation(reservation_id).await
    }

    /// Reservas `pending_driver` del vehículo del conductor
    pub async fn pending_for_driver(&self, driver_id: Uuid) -> AppResult<Vec<Reservation>> {
        let Some(vehicle) = self.vehicles.get_vehicle_by_driver(driver_id).await? else {
            return Ok(Vec::new());
        };
        let filter = ReservationFilter {
            vehicle_id: Some(vehicle.id),
            status: Some(ReservationStatus::PendingDriver),
            limit: Some(100),
            ..Default::default()
        };
        self.reservations.list_reservations(&filter).await
    }

    /// Primer vehículo libre en `window`, devuelto con su lock tomado.
    /// Bajo el lock se vuelve a consultar la disponibilidad: si otra alta lo
    /// ocupó mientras se esperaba, se pasa al siguiente candidato.
    async fn claim_available(
        &self,
        window: TimeWindow,
        exclude: &[Uuid],
    ) -> AppResult<Option<(Uuid, OwnedMutexGuard<()>)>> {
        let candidates = self.vehicles.find_available_vehicles(window, exclude).await?;
        for candidate in candidates {
            let guard = self.locks.acquire(candidate).await;
            let still_free = self.vehicles.find_available_vehicles(window, exclude).await?;
            if still_free.contains(&candidate) {
                return Ok(Some((candidate, guard)));
            }
        }
        Ok(None)
    }

    /// Comprueba que la reserva espera conductor y que es la de su vehículo
    async fn pending_for_vehicle_of(
        &self,
        reservation_id: Uuid,
        driver_id: Uuid,
        operation: &str,
    ) -> AppResult<(Reservation, Vehicle)> {
        let reservation = self.reservation(reservation_id).await?;
        if reservation.status != ReservationStatus::PendingDriver {
            return Err(invalid_state_error("reservation is not pending driver acceptance"));
        }

        match self.vehicles.get_vehicle_by_driver(driver_id).await? {
            Some(vehicle) if vehicle.id == reservation.vehicle_id => Ok((reservation, vehicle)),
            _ => Err(permission_denied_error(
                operation,
                "this reservation is not assigned to your vehicle",
            )),
        }
    }

    fn notify_pending(&self, vehicle_id: Uuid, reservation: &Reservation) {
        self.notifier.notify_vehicle_driver(
            vehicle_id,
            Notification::new("Reservation Pending", &reservation.purpose)
            .with("type", "reservation_pending")
            .with("reservation_id", reservation.id),
        );
    }

    async fn reservation(&self, id: Uuid) -> AppResult<Reservation> {
        self.reservations
            .get_reservation(id)
            .await?
            .ok_or_else(|| not_found_error("Reservation", id))
    }

    async fn vehicle(&self, id: Uuid) -> AppResult<Vehicle> {
        self.vehicles
            .get_vehicle(id)
            .await?
            .ok_or_else(|| not_found_error("Vehicle", id))
    }
}
