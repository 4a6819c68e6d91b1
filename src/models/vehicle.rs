//! Modelo de Vehicle
//!
//! El motor sólo lee vehículos: la flota la administra otro sistema.
//! La posición es la última conocida (puede faltar o estar vieja).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Vehicle tal como lo ve el motor de reservas
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Vehicle {
    pub id: Uuid,
    pub name: String,
    pub license_plate: String,
    pub driver_id: Uuid,
    pub is_maintenance: bool,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub location_at: Option<DateTime<Utc>>,
}

impl Vehicle {
    /// Última posición conocida, si existe y no es más vieja que `stale_after`
    pub fn fresh_position(&self, now: DateTime<Utc>, stale_after: chrono::Duration) -> Option<GeoPoint> {
        let (lat, lng) = (self.latitude?, self.longitude?);
        match self.location_at {
            Some(at) if now - at <= stale_after => Some(GeoPoint::new(lat, lng)),
            _ => None,
        }
    }
}

/// Punto geográfico en grados decimales
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}
