//! Modelo de ReservationConflict

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;

/// Estado del conflicto - mapea al ENUM conflict_status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "conflict_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ConflictStatus {
    Pending,
    ResolvedReassign,
    ResolvedChanged,
    ResolvedCancelled,
    ForceAssigned,
}

impl ConflictStatus {
    /// Todos los estados salvo `Pending` son terminales
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ConflictStatus::Pending)
    }
}

/// Par de reservas solapadas sobre el mismo vehículo, con ganadora y perdedora
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ReservationConflict {
    pub id: Uuid,
    pub winning_reservation_id: Uuid,
    pub losing_reservation_id: Uuid,
    pub status: ConflictStatus,
    pub resolved_by: Option<Uuid>,
    pub resolution_reason: Option<String>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl ReservationConflict {
    pub fn new(winning_reservation_id: Uuid, losing_reservation_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            winning_reservation_id,
            losing_reservation_id,
            status: ConflictStatus::Pending,
            resolved_by: None,
            resolution_reason: None,
            resolved_at: None,
            created_at: Utc::now(),
        }
    }
}
