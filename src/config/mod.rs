//! Configuración del motor
//!
//! Variables de entorno del servidor, del almacén y del estimador de ETA,
//! más el pool de PostgreSQL.

pub mod database;
pub mod environment;

pub use environment::*;
