use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::models::{DispatchStatus, NewDispatch, QuickBoard};
use crate::utils::validation::validate_not_blank;

// Request para crear un dispatch pendiente
#[derive(Debug, Deserialize, Validate)]
pub struct CreateDispatchRequest {
    #[validate(custom = "validate_not_blank")]
    pub purpose: String,
    pub passenger_name: Option<String>,
    #[validate(range(min = 1, max = 50))]
    pub passenger_count: Option<i32>,
    pub notes: Option<String>,
    #[validate(custom = "validate_not_blank")]
    pub pickup_address: String,
    #[validate(range(min = -90.0, max = 90.0))]
    pub pickup_lat: Option<f64>,
    #[validate(range(min = -180.0, max = 180.0))]
    pub pickup_lng: Option<f64>,
    pub dropoff_address: Option<String>,
    #[validate(range(min = -90.0, max = 90.0))]
    pub dropoff_lat: Option<f64>,
    #[validate(range(min = -180.0, max = 180.0))]
    pub dropoff_lng: Option<f64>,
}

impl From<CreateDispatchRequest> for NewDispatch {
    fn from(request: CreateDispatchRequest) -> Self {
        Self {
            purpose: request.purpose,
            passenger_name: request.passenger_name,
            passenger_count: request.passenger_count.unwrap_or(1),
            notes: request.notes,
            pickup_address: request.pickup_address,
            pickup_lat: request.pickup_lat,
            pickup_lng: request.pickup_lng,
            dropoff_address: request.dropoff_address,
            dropoff_lat: request.dropoff_lat,
            dropoff_lng: request.dropoff_lng,
            estimated_end_at: None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AssignRequest {
    pub vehicle_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: DispatchStatus,
}

#[derive(Debug, Deserialize, Validate)]
pub struct QuickBoardRequest {
    pub vehicle_id: Uuid,
    pub passenger_name: Option<String>,
    #[validate(range(min = 1, max = 50))]
    pub passenger_count: Option<i32>,
    pub purpose: Option<String>,
    pub notes: Option<String>,
    #[validate(range(min = 1, max = 1440))]
    pub estimated_minutes: Option<i64>,
}

impl From<QuickBoardRequest> for QuickBoard {
    fn from(request: QuickBoardRequest) -> Self {
        Self {
            vehicle_id: request.vehicle_id,
            passenger_name: request.passenger_name,
            passenger_count: request.passenger_count,
            purpose: request.purpose,
            notes: request.notes,
            estimated_minutes: request.estimated_minutes,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct DispatchListQuery {
    pub status: Option<DispatchStatus>,
    #[serde(default)]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

#[derive(Debug, Deserialize, Validate)]
pub struct EtaQuery {
    #[validate(range(min = -90.0, max = 90.0))]
    pub lat: f64,
    #[validate(range(min = -180.0, max = 180.0))]
    pub lng: f64,
}
