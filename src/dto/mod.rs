//! DTOs de la API HTTP
//!
//! Requests (con validación `validator`) y su conversión a los tipos
//! de entrada de los servicios.

pub mod booking_dto;
pub mod common;
pub mod conflict_dto;
pub mod dispatch_dto;
pub mod reservation_dto;

pub use common::{ApiResponse, ReasonRequest};
