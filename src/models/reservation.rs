//! Modelo de Reservation
//!
//! Una reserva ocupa un vehículo durante la ventana semiabierta
//! `[start_time, end_time)`. Dos reservas se solapan sii
//! `max(s1, s2) < min(e1, e2)`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::Type;
use uuid::Uuid;

use crate::utils::errors::AppResult;
use crate::utils::validation::validate_time_window;

/// Estado de la reserva - mapea al ENUM reservation_status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "reservation_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ReservationStatus {
    Confirmed,
    PendingConflict,
    PendingDriver,
    DriverDeclined,
    Cancelled,
    Completed,
}

impl ReservationStatus {
    /// Estados que ocupan el vehículo a efectos de detección de solapes
    pub const OCCUPYING: [ReservationStatus; 3] = [
        ReservationStatus::Confirmed,
        ReservationStatus::PendingConflict,
        ReservationStatus::PendingDriver,
    ];

    /// Estados que bloquean el vehículo para la búsqueda de "cualquier vehículo"
    pub const BLOCKING: [ReservationStatus; 2] =
        [ReservationStatus::Confirmed, ReservationStatus::PendingDriver];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationStatus::Confirmed => "confirmed",
            ReservationStatus::PendingConflict => "pending_conflict",
            ReservationStatus::PendingDriver => "pending_driver",
            ReservationStatus::DriverDeclined => "driver_declined",
            ReservationStatus::Cancelled => "cancelled",
            ReservationStatus::Completed => "completed",
        }
    }

    pub fn is_occupying(&self) -> bool {
        Self::OCCUPYING.contains(self)
    }
}

/// Ventana de tiempo semiabierta `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> AppResult<Self> {
        validate_time_window(start, end)?;
        Ok(Self { start, end })
    }

    pub fn overlaps(&self, other: &TimeWindow) -> bool {
        self.start.max(other.start) < self.end.min(other.end)
    }
}

/// Vehículos que ya rechazaron una reserva, en orden de rechazo y sin repetir.
///
/// Cada rechazo agrega un vehículo nuevo y la reasignación automática nunca
/// vuelve a proponer uno de estos, así que la cascada termina.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeclinedVehicles(Vec<Uuid>);

impl DeclinedVehicles {
    pub fn new() -> Self {
        Self::default()
    }

    /// Agrega el vehículo; devuelve `false` si ya estaba
    pub fn insert(&mut self, vehicle_id: Uuid) -> bool {
        if self.contains(&vehicle_id) {
            return false;
        }
        self.0.push(vehicle_id);
        true
    }

    pub fn contains(&self, vehicle_id: &Uuid) -> bool {
        self.0.contains(vehicle_id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[Uuid] {
        &self.0
    }

    /// Conjunto de exclusión para reasignar: vehículo actual ∪ rechazados
    pub fn exclusion_set(&self, current: Uuid) -> Vec<Uuid> {
        let mut set = self.clone();
        set.insert(current);
        set.0
    }
}

impl From<Vec<Uuid>> for DeclinedVehicles {
    fn from(ids: Vec<Uuid>) -> Self {
        let mut set = Self::new();
        for id in ids {
            set.insert(id);
        }
        set
    }
}

/// Reserva programada sobre un vehículo concreto
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reservation {
    pub id: Uuid,
    pub vehicle_id: Uuid,
    pub requester_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub purpose: String,
    pub destinations: Vec<String>,
    pub notes: Option<String>,
    pub passenger_name: Option<String>,
    pub pickup_address: Option<String>,
    pub pickup_lat: Option<f64>,
    pub pickup_lng: Option<f64>,
    pub priority_level: i32,
    pub status: ReservationStatus,
    pub cancel_reason: Option<String>,
    pub cancelled_by: Option<Uuid>,
    pub declined_vehicle_ids: DeclinedVehicles,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Reservation {
    pub fn window(&self) -> TimeWindow {
        TimeWindow {
            start: self.start_time,
            end: self.end_time,
        }
    }
}

/// Datos para crear una reserva nueva
#[derive(Debug, Clone, Default)]
pub struct NewReservation {
    pub vehicle_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub purpose: String,
    pub destinations: Vec<String>,
    pub notes: Option<String>,
    pub passenger_name: Option<String>,
    pub pickup_address: Option<String>,
    pub pickup_lat: Option<f64>,
    pub pickup_lng: Option<f64>,
}

impl NewReservation {
    pub fn into_reservation(
        self,
        requester_id: Uuid,
        priority_level: i32,
        status: ReservationStatus,
    ) -> Reservation {
        let now = Utc::now();
        Reservation {
            id: Uuid::new_v4(),
            vehicle_id: self.vehicle_id,
            requester_id,
            start_time: self.start_time,
            end_time: self.end_time,
            purpose: self.purpose,
            destinations: self.destinations,
            notes: self.notes,
            passenger_name: self.passenger_name,
            pickup_address: self.pickup_address,
            pickup_lat: self.pickup_lat,
            pickup_lng: self.pickup_lng,
            priority_level,
            status,
            cancel_reason: None,
            cancelled_by: None,
            declined_vehicle_ids: DeclinedVehicles::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Cambios parciales: sólo se aplican los campos presentes
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReservationChanges {
    pub vehicle_id: Option<Uuid>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub purpose: Option<String>,
    pub destinations: Option<Vec<String>>,
    pub notes: Option<String>,
}

impl ReservationChanges {
    pub fn apply_to(self, reservation: &mut Reservation) {
        if let Some(vehicle_id) = self.vehicle_id {
            reservation.vehicle_id = vehicle_id;
        }
        if let Some(start) = self.start_time {
            reservation.start_time = start;
        }
        if let Some(end) = self.end_time {
            reservation.end_time = end;
        }
        if let Some(purpose) = self.purpose {
            reservation.purpose = purpose;
        }
        if let Some(destinations) = self.destinations {
            reservation.destinations = destinations;
        }
        if self.notes.is_some() {
            reservation.notes = self.notes;
        }
    }
}

/// Filtros para listar reservas
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReservationFilter {
    pub vehicle_id: Option<Uuid>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub status: Option<ReservationStatus>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl ReservationFilter {
    pub fn effective_limit(&self) -> i64 {
        match self.limit {
            Some(limit) if limit > 0 => limit.min(100),
            _ => 50,
        }
    }

    pub fn effective_offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }

    pub fn matches(&self, reservation: &Reservation) -> bool {
        self.vehicle_id.map_or(true, |id| reservation.vehicle_id == id)
            && self.from.map_or(true, |from| reservation.end_time >= from)
            && self.to.map_or(true, |to| reservation.start_time <= to)
            && self.status.map_or(true, |status| reservation.status == status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2030, 1, 1, hour, minute, 0).unwrap()
    }

    fn window(s: (u32, u32), e: (u32, u32)) -> TimeWindow {
        TimeWindow::new(at(s.0, s.1), at(e.0, e.1)).unwrap()
    }

    #[test]
    fn test_overlap_matches_interval_rule() {
        let cases = [
            (window((10, 0), (11, 0)), window((9, 30), (10, 30)), true),
            (window((10, 0), (11, 0)), window((11, 0), (12, 0)), false),
            (window((10, 0), (11, 0)), window((9, 0), (10, 0)), false),
            (window((10, 0), (11, 0)), window((10, 15), (10, 45)), true),
            (window((10, 0), (11, 0)), window((8, 0), (12, 0)), true),
        ];

        for (a, b, expected) in cases {
            assert_eq!(a.overlaps(&b), expected, "{:?} vs {:?}", a, b);
            assert_eq!(b.overlaps(&a), expected);
            assert_eq!(a.start < b.end && b.start < a.end, expected);
        }
    }

    #[test]
    fn test_time_window_rejects_empty() {
        assert!(TimeWindow::new(at(10, 0), at(10, 0)).is_err());
        assert!(TimeWindow::new(at(10, 0), at(9, 0)).is_err());
    }

    #[test]
    fn test_declined_vehicles_unique_and_ordered() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let mut declined = DeclinedVehicles::new();

        assert!(declined.insert(a));
        assert!(declined.insert(b));
        assert!(!declined.insert(a));
        assert_eq!(declined.as_slice(), &[a, b]);

        let exclusion = declined.exclusion_set(a);
        assert_eq!(exclusion, vec![a, b]);
        let c = Uuid::new_v4();
        assert_eq!(declined.exclusion_set(c), vec![a, b, c]);
    }

    #[test]
    fn test_changes_only_touch_provided_fields() {
        let mut reservation = NewReservation {
            vehicle_id: Uuid::new_v4(),
            start_time: at(10, 0),
            end_time: at(11, 0),
            purpose: "client visit".into(),
            destinations: vec!["Makati".into()],
            ..Default::default()
        }
        .into_reservation(Uuid::new_v4(), 1, ReservationStatus::Confirmed);

        ReservationChanges {
            end_time: Some(at(12, 0)),
            notes: Some("bring documents".into()),
            ..Default::default()
        }
        .apply_to(&mut reservation);

        assert_eq!(reservation.start_time, at(10, 0));
        assert_eq!(reservation.end_time, at(12, 0));
        assert_eq!(reservation.purpose, "client visit");
        assert_eq!(reservation.notes.as_deref(), Some("bring documents"));
        assert_eq!(reservation.window().end - reservation.window().start, Duration::hours(2));
    }

    #[test]
    fn test_filter_limit_defaults() {
        assert_eq!(ReservationFilter::default().effective_limit(), 50);
        let filter = ReservationFilter {
            limit: Some(500),
            ..Default::default()
        };
        assert_eq!(filter.effective_limit(), 100);
    }
}
