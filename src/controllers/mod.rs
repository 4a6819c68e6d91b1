//! Controladores
//!
//! Validan el request, registran el evento y llaman al servicio.

pub mod booking_controller;
pub mod conflict_controller;
pub mod dispatch_controller;
pub mod reservation_controller;

pub use booking_controller::BookingController;
pub use conflict_controller::ConflictController;
pub use dispatch_controller::DispatchController;
pub use reservation_controller::ReservationController;
