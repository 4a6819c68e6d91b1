use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::models::{NewReservation, ReservationChanges};
use crate::utils::validation::validate_not_blank;

// Request para crear una reserva directa (con regla de prioridad)
#[derive(Debug, Deserialize, Validate)]
pub struct CreateReservationRequest {
    pub vehicle_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[validate(custom = "validate_not_blank")]
    pub purpose: String,
    #[serde(default)]
    pub destinations: Vec<String>,
    pub notes: Option<String>,
    pub passenger_name: Option<String>,
    pub pickup_address: Option<String>,
    #[validate(range(min = -90.0, max = 90.0))]
    pub pickup_lat: Option<f64>,
    #[validate(range(min = -180.0, max = 180.0))]
    pub pickup_lng: Option<f64>,
}

impl From<CreateReservationRequest> for NewReservation {
    fn from(request: CreateReservationRequest) -> Self {
        Self {
            vehicle_id: request.vehicle_id,
            start_time: request.start_time,
            end_time: request.end_time,
            purpose: request.purpose,
            destinations: request.destinations,
            notes: request.notes,
            passenger_name: request.passenger_name,
            pickup_address: request.pickup_address,
            pickup_lat: request.pickup_lat,
            pickup_lng: request.pickup_lng,
        }
    }
}

// Request de edición parcial
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateReservationRequest {
    pub vehicle_id: Option<Uuid>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    #[validate(custom = "validate_not_blank")]
    pub purpose: Option<String>,
    pub destinations: Option<Vec<String>>,
    pub notes: Option<String>,
}

impl From<UpdateReservationRequest> for ReservationChanges {
    fn from(request: UpdateReservationRequest) -> Self {
        Self {
            vehicle_id: request.vehicle_id,
            start_time: request.start_time,
            end_time: request.end_time,
            purpose: request.purpose,
            destinations: request.destinations,
            notes: request.notes,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    pub vehicle_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct TimelineQuery {
    /// Día UTC; hoy si falta
    pub date: Option<NaiveDate>,
}
