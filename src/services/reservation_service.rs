//! Servicio de reservas
//!
//! Alta con detección de solapes y regla de prioridad, cancelación,
//! edición y consultas (disponibilidad, listado, timeline diario).

use std::sync::Arc;

use chrono::{NaiveDate, TimeZone, Utc};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::models::{
    AuditEntry, NewReservation, Reservation, ReservationChanges, ReservationConflict,
    ReservationFilter, ReservationStatus, TimeWindow,
};
use crate::repositories::{ReservationStore, VehicleStore};
use crate::services::audit_service::AuditLog;
use crate::services::vehicle_locks::VehicleLocks;
use crate::utils::errors::{not_found_error, validation_error, AppResult};
use crate::utils::validation::validate_not_in_past;

/// Resultado del alta: la reserva y los conflictos que generó
#[derive(Debug, Clone, Serialize)]
pub struct ReservationCreated {
    pub reservation: Reservation,
    pub conflicts: Vec<ReservationConflict>,
}

pub struct ReservationService {
    reservations: Arc<dyn ReservationStore>,
    vehicles: Arc<dyn VehicleStore>,
    audit: Arc<dyn AuditLog>,
    locks: Arc<VehicleLocks>,
}

impl ReservationService {
    pub fn new(
        reservations: Arc<dyn ReservationStore>,
        vehicles: Arc<dyn VehicleStore>,
        audit: Arc<dyn AuditLog>,
        locks: Arc<VehicleLocks>,
    ) -> Self {
        Self {
            reservations,
            vehicles,
            audit,
            locks,
        }
    }

    /// Crea una reserva.
    ///
    /// El vehículo debe existir. Sin solapes queda `confirmed`. Con cualquier solape queda
    /// `pending_conflict` y se abre un conflicto por cada reserva solapada:
    /// gana la nueva sólo si su prioridad es estrictamente mayor, y en ese
    /// caso la existente pasa también a `pending_conflict`. Todo se persiste
    /// en una sola escritura.
    pub async fn create(
        &self,
        request: NewReservation,
        requester_id: Uuid,
        priority_level: i32,
    ) -> AppResult<ReservationCreated> {
        let window = TimeWindow::new(request.start_time, request.end_time)?;
        validate_not_in_past(window.start, Utc::now())?;

        if self.vehicles.get_vehicle(request.vehicle_id).await?.is_none() {
            return Err(not_found_error("Vehicle", request.vehicle_id));
        }

        // Chequeo de solape e insert bajo el lock del vehículo
        let _guard = self.locks.acquire(request.vehicle_id).await;

        let overlapping = self
            .reservations
            .find_overlapping(request.vehicle_id, window, None)
            .await?;

        let status = if overlapping.is_empty() {
            ReservationStatus::Confirmed
        } else {
            ReservationStatus::PendingConflict
        };
        let reservation = request.into_reservation(requester_id, priority_level, status);

        let mut conflicts = Vec::with_capacity(overlapping.len());
        let mut demote = Vec::new();
        for existing in &overlapping {
            if priority_level > existing.priority_level {
                if existing.status != ReservationStatus::PendingConflict {
                    demote.push(existing.id);
                }
                conflicts.push(ReservationConflict::new(reservation.id, existing.id));
            } else {
                conflicts.push(ReservationConflict::new(existing.id, reservation.id));
            }
        }

        // Reserva, conflictos y degradaciones se escriben juntos o nada
        self.reservations
            .create_reservation_with_conflicts(&reservation, &conflicts, &demote)
            .await?;

        info!(
            reservation = %reservation.id,
            vehicle = %reservation.vehicle_id,
            status = reservation.status.as_str(),
            conflicts = conflicts.len(),
            "📅 Reserva creada"
        );
        self.audit.log(
            AuditEntry::new(requester_id, "reservation.create", "reservation", reservation.id)
                .after(&reservation),
        );

        Ok(ReservationCreated {
            reservation,
            conflicts,
        })
    }

    pub async fn cancel(&self, id: Uuid, cancelled_by: Uuid, reason: &str) -> AppResult<Reservation> {
        let before = self.get(id).await?;
        self.reservations.cancel_reservation(id, cancelled_by, reason).await?;
        let after = self.get(id).await?;

        info!(reservation = %id, "🚫 Reserva cancelada");
        self.audit.log(
            AuditEntry::new(cancelled_by, "reservation.cancel", "reservation", id)
                .before(&before)
                .after(&after)
                .reason(reason),
        );
        Ok(after)
    }

    /// Aplica cambios parciales. No vuelve a comprobar solapes.
    pub async fn update(
        &self,
        id: Uuid,
        changes: ReservationChanges,
        actor_id: Uuid,
    ) -> AppResult<Reservation> {
        let before = self.get(id).await?;
        let mut updated = before.clone();
        changes.apply_to(&mut updated);
        TimeWindow::new(updated.start_time, updated.end_time)?;
        updated.updated_at = Utc::now();

        self.reservations.update_reservation(&updated).await?;

        self.audit.log(
            AuditEntry::new(actor_id, "reservation.update", "reservation", id)
                .before(&before)
                .after(&updated),
        );
        Ok(updated)
    }

    /// Reservas activas del vehículo que se solapan con la ventana
    pub async fn check_availability(
        &self,
        vehicle_id: Uuid,
        start: chrono::DateTime<Utc>,
        end: chrono::DateTime<Utc>,
    ) -> AppResult<Vec<Reservation>> {
        let window = TimeWindow::new(start, end)?;
        self.reservations.find_overlapping(vehicle_id, window, None).await
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Reservation> {
        self.reservations
            .get_reservation(id)
            .await?
            .ok_or_else(|| not_found_error("Reservation", id))
    }

    pub async fn list(&self, filter: &ReservationFilter) -> AppResult<Vec<Reservation>> {
        self.reservations.list_reservations(filter).await
    }

    /// Reservas activas del vehículo que tocan el día `date` (UTC)
    pub async fn vehicle_timeline(&self, vehicle_id: Uuid, date: NaiveDate) -> AppResult<Vec<Reservation>> {
        let day_start = date
            .and_hms_opt(0, 0, 0)
            .map(|naive| Utc.from_utc_datetime(&naive))
            .ok_or_else(|| validation_error("invalid date"))?;
        let day = TimeWindow::new(day_start, day_start + chrono::Duration::days(1))?;

        let filter = ReservationFilter {
            vehicle_id: Some(vehicle_id),
            from: Some(day.start),
            to: Some(day.end),
            limit: Some(100),
            ..Default::default()
        };

        let reservations = self.reservations.list_reservations(&filter).await?;
        Ok(reservations
            .into_iter()
            .filter(|r| r.status.is_occupying() && r.window().overlaps(&day))
            .collect())
    }
}
