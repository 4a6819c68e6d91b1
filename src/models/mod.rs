//! Modelos del sistema
//!
//! Este módulo contiene los modelos de datos del motor de reservas,
//! alineados con el schema PostgreSQL de `migrations/`.

pub mod audit;
pub mod conflict;
pub mod dispatch;
pub mod reservation;
pub mod vehicle;

pub use audit::AuditEntry;
pub use conflict::{ConflictStatus, ReservationConflict};
pub use dispatch::{Dispatch, DispatchStatus, NewDispatch, QuickBoard};
pub use reservation::{
    DeclinedVehicles, NewReservation, Reservation, ReservationChanges, ReservationFilter,
    ReservationStatus, TimeWindow,
};
pub use vehicle::{GeoPoint, Vehicle};
