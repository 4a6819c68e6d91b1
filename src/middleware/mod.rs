//! Middleware del sistema
//!
//! Extracción de la identidad del llamante y configuración de CORS.

pub mod actor;
pub mod cors;

pub use actor::Actor;
pub use cors::cors_layer;
