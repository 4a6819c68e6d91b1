//! Services module
//!
//! Este módulo contiene la lógica de negocio del motor de reservas.
//! Los servicios reciben los almacenes como traits (`Arc<dyn …>`) y
//! los colaboradores de auditoría y notificaciones.

pub mod audit_service;
pub mod booking_service;
pub mod conflict_service;
pub mod dispatch_service;
pub mod eta_service;
pub mod notification_service;
pub mod reservation_service;
pub mod vehicle_locks;

pub use audit_service::{AuditLog, MemoryAuditLog, PgAuditLog, TracingAuditLog};
pub use booking_service::{BookingMode, BookingOutcome, BookingRequest, BookingService};
pub use conflict_service::ConflictService;
pub use dispatch_service::DispatchService;
pub use eta_service::{EtaConfig, EtaEstimator, VehicleEta};
pub use notification_service::{
    Delivery, LogNotifier, MemoryNotifier, Notification, NotificationTarget, Notifier,
    WebhookNotifier,
};
pub use reservation_service::{ReservationCreated, ReservationService};
pub use vehicle_locks::VehicleLocks;
