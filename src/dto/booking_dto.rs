use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::services::booking_service::{BookingMode, BookingRequest};
use crate::utils::validation::validate_not_blank;

// Request unificado: viaje ahora o reserva futura
#[derive(Debug, Deserialize, Validate)]
pub struct CreateBookingRequest {
    pub mode: BookingMode,
    #[serde(default)]
    pub is_now: bool,
    pub vehicle_id: Option<Uuid>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    #[validate(custom = "validate_not_blank")]
    pub purpose: String,
    pub passenger_name: Option<String>,
    #[serde(default)]
    pub pickup_address: String,
    #[validate(range(min = -90.0, max = 90.0))]
    pub pickup_lat: Option<f64>,
    #[validate(range(min = -180.0, max = 180.0))]
    pub pickup_lng: Option<f64>,
    #[serde(default)]
    pub destinations: Vec<String>,
    pub notes: Option<String>,
}

impl From<CreateBookingRequest> for BookingRequest {
    fn from(request: CreateBookingRequest) -> Self {
        Self {
            mode: request.mode,
            is_now: request.is_now,
            vehicle_id: request.vehicle_id,
            start_time: request.start_time,
            end_time: request.end_time,
            purpose: request.purpose,
            passenger_name: request.passenger_name,
            pickup_address: request.pickup_address,
            pickup_lat: request.pickup_lat,
            pickup_lng: request.pickup_lng,
            destinations: request.destinations,
            notes: request.notes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_and_validates() {
        let request: CreateBookingRequest = serde_json::from_value(serde_json::json!({
            "mode": "any",
            "purpose": "Airport",
            "pickup_lat": 95.0
        }))
        .unwrap();
        assert!(!request.is_now);
        assert!(request.validate().is_err());

        let request: CreateBookingRequest = serde_json::from_value(serde_json::json!({
            "mode": "specific",
            "is_now": true,
            "purpose": "  "
        }))
        .unwrap();
        assert!(request.validate().is_err());
    }
}
