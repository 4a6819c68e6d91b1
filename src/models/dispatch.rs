//! Modelo de Dispatch (viaje inmediato)
//!
//! Ciclo de vida: `pending → assigned → accepted → en_route → arrived → completed`,
//! con `cancelled` alcanzable desde cualquier estado no terminal.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;

/// Estado del dispatch - mapea al ENUM dispatch_status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "dispatch_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DispatchStatus {
    Pending,
    Assigned,
    Accepted,
    EnRoute,
    Arrived,
    Completed,
    Cancelled,
}

impl DispatchStatus {
    /// Estados en los que el vehículo está ocupado por el viaje
    pub const ACTIVE: [DispatchStatus; 4] = [
        DispatchStatus::Assigned,
        DispatchStatus::Accepted,
        DispatchStatus::EnRoute,
        DispatchStatus::Arrived,
    ];

    pub fn is_active(&self) -> bool {
        Self::ACTIVE.contains(self)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, DispatchStatus::Completed | DispatchStatus::Cancelled)
    }

    /// Estados alcanzables vía `update_status` (con su columna de timestamp)
    pub fn is_progress(&self) -> bool {
        matches!(
            self,
            DispatchStatus::Accepted
                | DispatchStatus::EnRoute
                | DispatchStatus::Arrived
                | DispatchStatus::Completed
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Dispatch {
    pub id: Uuid,
    pub vehicle_id: Option<Uuid>,
    pub requester_id: Uuid,
    pub dispatcher_id: Option<Uuid>,
    pub purpose: String,
    pub passenger_name: Option<String>,
    pub passenger_count: i32,
    pub notes: Option<String>,
    pub pickup_address: String,
    pub pickup_lat: Option<f64>,
    pub pickup_lng: Option<f64>,
    pub dropoff_address: Option<String>,
    pub dropoff_lat: Option<f64>,
    pub dropoff_lng: Option<f64>,
    pub status: DispatchStatus,
    pub assigned_at: Option<DateTime<Utc>>,
    pub accepted_at: Option<DateTime<Utc>>,
    pub en_route_at: Option<DateTime<Utc>>,
    pub arrived_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub estimated_end_at: Option<DateTime<Utc>>,
    pub cancel_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Dispatch {
    /// Marca el timestamp propio del estado de progreso indicado
    pub fn stamp(&mut self, status: DispatchStatus, at: DateTime<Utc>) {
        match status {
            DispatchStatus::Assigned => self.assigned_at = Some(at),
            DispatchStatus::Accepted => self.accepted_at = Some(at),
            DispatchStatus::EnRoute => self.en_route_at = Some(at),
            DispatchStatus::Arrived => self.arrived_at = Some(at),
            DispatchStatus::Completed => self.completed_at = Some(at),
            DispatchStatus::Cancelled => self.cancelled_at = Some(at),
            DispatchStatus::Pending => {}
        }
        self.status = status;
        self.updated_at = at;
    }
}

/// Datos para crear un dispatch en estado `pending`
#[derive(Debug, Clone, Default)]
pub struct NewDispatch {
    pub purpose: String,
    pub passenger_name: Option<String>,
    pub passenger_count: i32,
    pub notes: Option<String>,
    pub pickup_address: String,
    pub pickup_lat: Option<f64>,
    pub pickup_lng: Option<f64>,
    pub dropoff_address: Option<String>,
    pub dropoff_lat: Option<f64>,
    pub dropoff_lng: Option<f64>,
    pub estimated_end_at: Option<DateTime<Utc>>,
}

impl NewDispatch {
    pub fn into_dispatch(self, requester_id: Uuid) -> Dispatch {
        let now = Utc::now();
        Dispatch {
            id: Uuid::new_v4(),
            vehicle_id: None,
            requester_id,
            dispatcher_id: None,
            purpose: self.purpose,
            passenger_name: self.passenger_name,
            passenger_count: self.passenger_count.max(1),
            notes: self.notes,
            pickup_address: self.pickup_address,
            pickup_lat: self.pickup_lat,
            pickup_lng: self.pickup_lng,
            dropoff_address: self.dropoff_address,
            dropoff_lat: self.dropoff_lat,
            dropoff_lng: self.dropoff_lng,
            status: DispatchStatus::Pending,
            assigned_at: None,
            accepted_at: None,
            en_route_at: None,
            arrived_at: None,
            completed_at: None,
            cancelled_at: None,
            estimated_end_at: self.estimated_end_at,
            cancel_reason: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Subida directa al vehículo (pasajero ya presente)
#[derive(Debug, Clone, Default)]
pub struct QuickBoard {
    pub vehicle_id: Uuid,
    pub passenger_name: Option<String>,
    pub passenger_count: Option<i32>,
    pub purpose: Option<String>,
    pub notes: Option<String>,
    pub estimated_minutes: Option<i64>,
}

impl QuickBoard {
    pub const DEFAULT_PURPOSE: &'static str = "Boarding";
    pub const DEFAULT_PICKUP: &'static str = "(route pending)";

    pub fn into_new_dispatch(self, now: DateTime<Utc>) -> NewDispatch {
        NewDispatch {
            purpose: self
                .purpose
                .filter(|p| !p.trim().is_empty())
                .unwrap_or_else(|| Self::DEFAULT_PURPOSE.to_string()),
            passenger_name: self.passenger_name,
            passenger_count: self.passenger_count.unwrap_or(1),
            notes: self.notes,
            pickup_address: Self::DEFAULT_PICKUP.to_string(),
            estimated_end_at: self
                .estimated_minutes
                .filter(|m| *m > 0)
                .map(|m| now + chrono::Duration::minutes(m)),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classes() {
        assert!(DispatchStatus::EnRoute.is_active());
        assert!(!DispatchStatus::Pending.is_active());
        assert!(!DispatchStatus::Completed.is_active());
        assert!(DispatchStatus::Cancelled.is_terminal());
        assert!(DispatchStatus::Completed.is_progress());
        assert!(!DispatchStatus::Assigned.is_progress());
    }

    #[test]
    fn test_stamp_sets_matching_column() {
        let mut dispatch = NewDispatch {
            purpose: "airport".into(),
            pickup_address: "HQ".into(),
            ..Default::default()
        }
        .into_dispatch(Uuid::new_v4());
        assert_eq!(dispatch.passenger_count, 1);

        let now = Utc::now();
        dispatch.stamp(DispatchStatus::Arrived, now);
        assert_eq!(dispatch.status, DispatchStatus::Arrived);
        assert_eq!(dispatch.arrived_at, Some(now));
        assert!(dispatch.accepted_at.is_none());
    }

    #[test]
    fn test_quick_board_defaults() {
        let now = Utc::now();
        let new = QuickBoard {
            vehicle_id: Uuid::new_v4(),
            purpose: Some("  ".into()),
            estimated_minutes: Some(30),
            ..Default::default()
        }
        .into_new_dispatch(now);

        assert_eq!(new.purpose, QuickBoard::DEFAULT_PURPOSE);
        assert_eq!(new.pickup_address, QuickBoard::DEFAULT_PICKUP);
        assert_eq!(new.passenger_count, 1);
        assert_eq!(new.estimated_end_at, Some(now + chrono::Duration::minutes(30)));
    }
}
