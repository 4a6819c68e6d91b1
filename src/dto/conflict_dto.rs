use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::models::ReservationChanges;

#[derive(Debug, Deserialize)]
pub struct ReassignRequest {
    pub new_vehicle_id: Uuid,
    #[serde(default)]
    pub reason: String,
}

// Nueva ventana (y otros cambios opcionales) para la reserva perdedora
#[derive(Debug, Deserialize)]
pub struct ChangeTimeRequest {
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub vehicle_id: Option<Uuid>,
    pub purpose: Option<String>,
    pub notes: Option<String>,
    #[serde(default)]
    pub reason: String,
}

impl ChangeTimeRequest {
    pub fn into_parts(self) -> (ReservationChanges, String) {
        let changes = ReservationChanges {
            vehicle_id: self.vehicle_id,
            start_time: self.start_time,
            end_time: self.end_time,
            purpose: self.purpose,
            destinations: None,
            notes: self.notes,
        };
        (changes, self.reason)
    }
}
