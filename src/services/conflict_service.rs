//! Resolución de conflictos de reservas
//!
//! Cada resolución reclama primero el conflicto con un update condicional
//! (`pending` → resuelto). Si otro actor lo resolvió antes, la operación
//! falla con `InvalidState` sin tocar las reservas.
//!
//! Las reservas ya canceladas o completadas nunca se reabren: sólo se
//! confirman las que siguen ocupando el vehículo.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::models::{
    AuditEntry, ConflictStatus, Reservation, ReservationChanges, ReservationConflict,
    ReservationStatus, TimeWindow,
};
use crate::repositories::{ConflictStore, ReservationStore, VehicleStore};
use crate::services::audit_service::AuditLog;
use crate::utils::errors::{invalid_state_error, not_found_error, AppResult};
use crate::utils::validation::require_non_empty;

/// Conflicto pendiente junto con sus dos reservas
struct OpenConflict {
    conflict: ReservationConflict,
    winning: Reservation,
    losing: Reservation,
}

pub struct ConflictService {
    conflicts: Arc<dyn ConflictStore>,
    reservations: Arc<dyn ReservationStore>,
    vehicles: Arc<dyn VehicleStore>,
    audit: Arc<dyn AuditLog>,
}

impl ConflictService {
    pub fn new(
        conflicts: Arc<dyn ConflictStore>,
        reservations: Arc<dyn ReservationStore>,
        vehicles: Arc<dyn VehicleStore>,
        audit: Arc<dyn AuditLog>,
    ) -> Self {
        Self {
            conflicts,
            reservations,
            vehicles,
            audit,
        }
    }

    pub async fn list_pending(&self) -> AppResult<Vec<ReservationConflict>> {
        self.conflicts.list_pending_conflicts().await
    }

    pub async fn get(&self, id: Uuid) -> AppResult<ReservationConflict> {
        self.conflicts
            .get_conflict(id)
            .await?
            .ok_or_else(|| not_found_error("Conflict", id))
    }

    /// Mueve la reserva perdedora a otro vehículo y confirma ambas
    pub async fn resolve_reassign(
        &self,
        conflict_id: Uuid,
        new_vehicle_id: Uuid,
        resolved_by: Uuid,
        reason: &str,
    ) -> AppResult<ReservationConflict> {
        if self.vehicles.get_vehicle(new_vehicle_id).await?.is_none() {
            return Err(not_found_error("Vehicle", new_vehicle_id));
        }

        let open = self.open(conflict_id).await?;
        ensure_occupying(&open.losing)?;
        self.claim(&open, resolved_by, reason, ConflictStatus::ResolvedReassign).await?;

        self.reservations
            .update_reservation_vehicle(open.losing.id, new_vehicle_id)
            .await?;
        self.confirm_both(&open).await?;

        self.audit.log(
            AuditEntry::new(resolved_by, "conflict.resolve_reassign", "conflict", conflict_id)
                .before(&open.losing)
                .reason(reason),
        );
        self.get(conflict_id).await
    }

    /// Cambia la ventana (u otros campos) de la reserva perdedora y confirma ambas
    pub async fn resolve_change_time(
        &self,
        conflict_id: Uuid,
        changes: ReservationChanges,
        resolved_by: Uuid,
        reason: &str,
    ) -> AppResult<ReservationConflict> {
        let open = self.open(conflict_id).await?;
        ensure_occupying(&open.losing)?;

        let mut losing = open.losing.clone();
        changes.apply_to(&mut losing);
        TimeWindow::new(losing.start_time, losing.end_time)?;
        losing.updated_at = Utc::now();

        self.claim(&open, resolved_by, reason, ConflictStatus::ResolvedChanged).await?;

        self.reservations.update_reservation(&losing).await?;
        self.confirm_both(&open).await?;

        self.audit.log(
            AuditEntry::new(resolved_by, "conflict.resolve_change_time", "conflict", conflict_id)
                .before(&open.losing)
                .after(&losing)
                .reason(reason),
        );
        self.get(conflict_id).await
    }

    /// Cancela la reserva perdedora y confirma la ganadora
    pub async fn resolve_cancel(
        &self,
        conflict_id: Uuid,
        resolved_by: Uuid,
        reason: &str,
    ) -> AppResult<ReservationConflict> {
        let open = self.open(conflict_id).await?;
        self.claim(&open, resolved_by, reason, ConflictStatus::ResolvedCancelled).await?;

        if open.losing.status.is_occupying() {
            self.reservations
                .cancel_reservation(open.losing.id, resolved_by, reason)
                .await?;
        }
        self.confirm(open.winning.id).await?;

        self.audit.log(
            AuditEntry::new(resolved_by, "conflict.resolve_cancel", "conflict", conflict_id)
                .reason(reason),
        );
        self.get(conflict_id).await
    }

    /// Invierte el resultado: confirma la perdedora y cancela la ganadora.
    /// Exige un motivo.
    pub async fn force_assign(
        &self,
        conflict_id: Uuid,
        resolved_by: Uuid,
        reason: &str,
    ) -> AppResult<ReservationConflict> {
        require_non_empty("reason", reason)?;

        let open = self.open(conflict_id).await?;
        ensure_occupying(&open.losing)?;
        self.claim(&open, resolved_by, reason, ConflictStatus::ForceAssigned).await?;

        self.confirm(open.losing.id).await?;
        if open.winning.status.is_occupying() {
            self.reservations
                .cancel_reservation(
                    open.winning.id,
                    resolved_by,
                    &format!("force assigned: {}", reason),
                )
                .await?;
        }

        info!(conflict = %conflict_id, "⚡ Conflicto forzado");
        self.audit.log(
            AuditEntry::new(resolved_by, "conflict.force_assign", "conflict", conflict_id)
                .before(&open.conflict)
                .reason(reason),
        );
        self.get(conflict_id).await
    }

    /// Carga un conflicto todavía pendiente y sus dos reservas
    async fn open(&self, conflict_id: Uuid) -> AppResult<OpenConflict> {
        let conflict = self.get(conflict_id).await?;
        if conflict.status.is_terminal() {
            return Err(invalid_state_error("conflict is already resolved"));
        }

        let winning = self
            .reservations
            .get_reservation(conflict.winning_reservation_id)
            .await?
            .ok_or_else(|| not_found_error("Reservation", conflict.winning_reservation_id))?;
        let losing = self
            .reservations
            .get_reservation(conflict.losing_reservation_id)
            .await?
            .ok_or_else(|| not_found_error("Reservation", conflict.losing_reservation_id))?;

        Ok(OpenConflict {
            conflict,
            winning,
            losing,
        })
    }

    async fn claim(
        &self,
        open: &OpenConflict,
        resolved_by: Uuid,
        reason: &str,
        status: ConflictStatus,
    ) -> AppResult<()> {
        let applied = self
            .conflicts
            .resolve_conflict(open.conflict.id, resolved_by, reason, status)
            .await?;
        if !applied {
            return Err(invalid_state_error("conflict is already resolved"));
        }
        info!(conflict = %open.conflict.id, ?status, "✅ Conflicto resuelto");
        Ok(())
    }

    async fn confirm_both(&self, open: &OpenConflict) -> AppResult<()> {
        for id in [open.losing.id, open.winning.id] {
            self.confirm(id).await?;
        }
        Ok(())
    }

    /// Confirma la reserva salvo que ya esté cerrada
    async fn confirm(&self, id: Uuid) -> AppResult<()> {
        let applied = self
            .reservations
            .update_reservation_status_if(id, &ReservationStatus::OCCUPYING, ReservationStatus::Confirmed)
            .await?;
        if !applied {
            info!(reservation = %id, "⏭️ Reserva cerrada, no se confirma");
        }
        Ok(())
    }
}

/// La reserva que se conserva tiene que seguir viva
fn ensure_occupying(reservation: &Reservation) -> AppResult<()> {
    if reservation.status.is_occupying() {
        Ok(())
    } else {
        Err(invalid_state_error("reservation is already cancelled or completed"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewReservation, Vehicle};
    use crate::repositories::MemoryStore;
    use crate::services::audit_service::MemoryAuditLog;
    use crate::services::reservation_service::ReservationService;
    use crate::services::vehicle_locks::VehicleLocks;
    use chrono::{DateTime, Duration, TimeZone};

    struct Fixture {
        store: Arc<MemoryStore>,
        audit: Arc<MemoryAuditLog>,
        reservations: ReservationService,
        service: ConflictService,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let audit = Arc::new(MemoryAuditLog::new());
        Fixture {
            reservations: ReservationService::new(
                store.clone(),
                store.clone(),
                audit.clone(),
                Arc::new(VehicleLocks::new()),
            ),
            service: ConflictService::new(store.clone(), store.clone(), store.clone(), audit.clone()),
            store,
            audit,
        }
    }

    fn at(hours: i64) -> DateTime<Utc> {
        let tomorrow = (Utc::now() + Duration::days(1)).date_naive();
        Utc.from_utc_datetime(&tomorrow.and_hms_opt(0, 0, 0).unwrap()) + Duration::hours(hours)
    }

    async fn vehicle(f: &Fixture, name: &str) -> Uuid {
        let vehicle = Vehicle {
            id: Uuid::new_v4(),
            name: name.into(),
            license_plate: format!("{}-300", name),
            driver_id: Uuid::new_v4(),
            is_maintenance: false,
            latitude: None,
            longitude: None,
            location_at: None,
        };
        f.store.upsert_vehicle(vehicle.clone()).await;
        vehicle.id
    }

    /// Dos reservas iguales de prioridad 1 y 5 sobre el mismo vehículo
    async fn conflicted(f: &Fixture) -> (Reservation, Reservation, ReservationConflict) {
        let vehicle = vehicle(f, "Sedan").await;
        let (start, end) = (at(1), at(3));
        let make = || NewReservation {
            vehicle_id: vehicle,
            start_time: start,
            end_time: end,
            purpose: "Site visit".into(),
            ..Default::default()
        };
        let low = f.reservations.create(make(), Uuid::new_v4(), 1).await.unwrap();
        let high = f.reservations.create(make(), Uuid::new_v4(), 5).await.unwrap();
        let conflict = high.conflicts[0].clone();
        (high.reservation, low.reservation, conflict)
    }

    async fn status_of(f: &Fixture, id: Uuid) -> ReservationStatus {
        f.store.get_reservation(id).await.unwrap().unwrap().status
    }

    #[tokio::test]
    async fn test_reassign_moves_loser_and_confirms_both() {
        let f = fixture();
        let (winner, loser, conflict) = conflicted(&f).await;
        let other_vehicle = vehicle(&f, "Van").await;

        let resolved = f
            .service
            .resolve_reassign(conflict.id, other_vehicle, Uuid::new_v4(), "moved to van")
            .await
            .unwrap();

        assert_eq!(resolved.status, ConflictStatus::ResolvedReassign);
        assert_eq!(resolved.resolution_reason.as_deref(), Some("moved to van"));
        let moved = f.store.get_reservation(loser.id).await.unwrap().unwrap();
        assert_eq!(moved.vehicle_id, other_vehicle);
        assert_eq!(moved.status, ReservationStatus::Confirmed);
        assert_eq!(status_of(&f, winner.id).await, ReservationStatus::Confirmed);
        assert!(f.service.list_pending().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reassign_to_unknown_vehicle_keeps_conflict_open() {
        let f = fixture();
        let (_, loser, conflict) = conflicted(&f).await;

        let err = f
            .service
            .resolve_reassign(conflict.id, Uuid::new_v4(), Uuid::new_v4(), "moved")
            .await
            .unwrap_err();

        assert_eq!(err.code(), "NOT_FOUND");
        assert_eq!(f.service.get(conflict.id).await.unwrap().status, ConflictStatus::Pending);
        let unchanged = f.store.get_reservation(loser.id).await.unwrap().unwrap();
        assert_eq!(unchanged.vehicle_id, loser.vehicle_id);
        assert_eq!(unchanged.status, ReservationStatus::PendingConflict);
    }

    #[tokio::test]
    async fn test_change_time_validates_window() {
        let f = fixture();
        let (_, loser, conflict) = conflicted(&f).await;

        let bad = ReservationChanges {
            start_time: Some(at(6)),
            end_time: Some(at(5)),
            ..Default::default()
        };
        let err = f
            .service
            .resolve_change_time(conflict.id, bad, Uuid::new_v4(), "")
            .await
            .unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");
        assert_eq!(f.service.get(conflict.id).await.unwrap().status, ConflictStatus::Pending);

        let good = ReservationChanges {
            start_time: Some(at(5)),
            end_time: Some(at(6)),
            ..Default::default()
        };
        f.service
            .resolve_change_time(conflict.id, good, Uuid::new_v4(), "later slot")
            .await
            .unwrap();
        let moved = f.store.get_reservation(loser.id).await.unwrap().unwrap();
        assert_eq!(moved.start_time, at(5));
        assert_eq!(moved.status, ReservationStatus::Confirmed);
    }

    #[tokio::test]
    async fn test_cancel_resolution() {
        let f = fixture();
        let (winner, loser, conflict) = conflicted(&f).await;

        f.service.resolve_cancel(conflict.id, Uuid::new_v4(), "not needed").await.unwrap();

        assert_eq!(status_of(&f, loser.id).await, ReservationStatus::Cancelled);
        assert_eq!(status_of(&f, winner.id).await, ReservationStatus::Confirmed);
    }

    #[tokio::test]
    async fn test_force_assign_inverts_outcome() {
        let f = fixture();
        let (winner, loser, conflict) = conflicted(&f).await;

        let resolved = f
            .service
            .force_assign(conflict.id, Uuid::new_v4(), "CEO override")
            .await
            .unwrap();

        assert_eq!(resolved.status, ConflictStatus::ForceAssigned);
        assert_eq!(status_of(&f, loser.id).await, ReservationStatus::Confirmed);
        let cancelled = f.store.get_reservation(winner.id).await.unwrap().unwrap();
        assert_eq!(cancelled.status, ReservationStatus::Cancelled);
        assert_eq!(cancelled.cancel_reason.as_deref(), Some("force assigned: CEO override"));
        assert!(f.audit.actions().contains(&"conflict.force_assign".to_string()));
    }

    #[tokio::test]
    async fn test_cancel_resolution_does_not_reopen_cancelled_winner() {
        let f = fixture();
        let (winner, loser, conflict) = conflicted(&f).await;
        let requester = Uuid::new_v4();
        f.reservations.cancel(winner.id, requester, "trip called off").await.unwrap();

        f.service.resolve_cancel(conflict.id, Uuid::new_v4(), "duplicate").await.unwrap();

        let kept = f.store.get_reservation(winner.id).await.unwrap().unwrap();
        assert_eq!(kept.status, ReservationStatus::Cancelled);
        assert_eq!(kept.cancel_reason.as_deref(), Some("trip called off"));
        assert_eq!(status_of(&f, loser.id).await, ReservationStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_force_assign_of_cancelled_loser_is_rejected() {
        let f = fixture();
        let (winner, loser, conflict) = conflicted(&f).await;
        f.reservations.cancel(loser.id, Uuid::new_v4(), "no longer needed").await.unwrap();

        let err = f
            .service
            .force_assign(conflict.id, Uuid::new_v4(), "CEO override")
            .await
            .unwrap_err();

        assert_eq!(err.code(), "INVALID_STATE");
        assert_eq!(f.service.get(conflict.id).await.unwrap().status, ConflictStatus::Pending);
        assert_eq!(status_of(&f, loser.id).await, ReservationStatus::Cancelled);
        assert_eq!(status_of(&f, winner.id).await, ReservationStatus::PendingConflict);
    }

    #[tokio::test]
    async fn test_force_assign_requires_reason() {
        let f = fixture();
        let (_, _, conflict) = conflicted(&f).await;

        let err = f.service.force_assign(conflict.id, Uuid::new_v4(), "").await.unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_second_resolution_is_rejected() {
        let f = fixture();
        let (winner, _, conflict) = conflicted(&f).await;

        f.service.resolve_cancel(conflict.id, Uuid::new_v4(), "").await.unwrap();
        let err = f
            .service
            .force_assign(conflict.id, Uuid::new_v4(), "too late")
            .await
            .unwrap_err();

        assert_eq!(err.code(), "INVALID_STATE");
        assert_eq!(status_of(&f, winner.id).await, ReservationStatus::Confirmed);
    }

    #[tokio::test]
    async fn test_missing_conflict_is_not_found() {
        let f = fixture();
        let err = f.service.resolve_cancel(Uuid::new_v4(), Uuid::new_v4(), "").await.unwrap_err();
        assert_eq!(err.code(), "NOT_FOUND");
    }
}
