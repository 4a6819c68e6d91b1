//! Motor de reservas y despacho de flota
//!
//! Reservas con detección de solapes y prioridad, resolución de
//! conflictos, ciclo de vida de viajes inmediatos, reasignación
//! automática cuando un conductor rechaza, y estimación de ETA.

pub mod config;
pub mod controllers;
pub mod database;
pub mod dto;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod state;
pub mod utils;

pub use routes::create_router;
pub use state::{AppState, Stores};
