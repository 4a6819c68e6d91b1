//! Entrada del registro de auditoría

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
pub struct AuditEntry {
    pub actor_id: Uuid,
    pub action: String,
    pub target_type: String,
    pub target_id: Uuid,
    pub before_state: Option<serde_json::Value>,
    pub after_state: Option<serde_json::Value>,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl AuditEntry {
    pub fn new(actor_id: Uuid, action: &str, target_type: &str, target_id: Uuid) -> Self {
        Self {
            actor_id,
            action: action.to_string(),
            target_type: target_type.to_string(),
            target_id,
            before_state: None,
            after_state: None,
            reason: None,
            created_at: Utc::now(),
        }
    }

    pub fn before<T: Serialize>(mut self, state: &T) -> Self {
        self.before_state = serde_json::to_value(state).ok();
        self
    }

    pub fn after<T: Serialize>(mut self, state: &T) -> Self {
        self.after_state = serde_json::to_value(state).ok();
        self
    }

    pub fn reason(mut self, reason: &str) -> Self {
        if !reason.is_empty() {
            self.reason = Some(reason.to_string());
        }
        self
    }
}
