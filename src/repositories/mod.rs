//! Repositorios
//!
//! Traits del almacén de entidades y sus dos implementaciones:
//! PostgreSQL (sqlx) y en memoria.

pub mod conflict_repository;
pub mod dispatch_repository;
pub mod memory;
pub mod reservation_repository;
pub mod store;
pub mod vehicle_repository;

pub use conflict_repository::ConflictRepository;
pub use dispatch_repository::DispatchRepository;
pub use memory::MemoryStore;
pub use reservation_repository::ReservationRepository;
pub use store::{ConflictStore, DispatchStore, ReservationStore, VehicleStore};
pub use vehicle_repository::VehicleRepository;
