//! Registro de auditoría
//!
//! `log` nunca bloquea ni falla: las implementaciones persistentes lanzan
//! la escritura en una tarea aparte y sólo dejan un warning si falla.

use std::sync::Mutex;

use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::AuditEntry;

pub trait AuditLog: Send + Sync {
    fn log(&self, entry: AuditEntry);
}

/// Persiste en la tabla `audit_logs`
pub struct PgAuditLog {
    pool: PgPool,
}

impl PgAuditLog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl AuditLog for PgAuditLog {
    fn log(&self, entry: AuditEntry) {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            warn!(action = %entry.action, "⚠️ Audit sin runtime, entrada descartada");
            return;
        };

        let pool = self.pool.clone();
        handle.spawn(async move {
            let result = sqlx::query(
                r#"
                INSERT INTO audit_logs (id, actor_id, action, target_type, target_id,
                    before_state, after_state, reason, created_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(entry.actor_id)
            .bind(&entry.action)
            .bind(&entry.target_type)
            .bind(entry.target_id)
            .bind(&entry.before_state)
            .bind(&entry.after_state)
            .bind(&entry.reason)
            .bind(entry.created_at)
            .execute(&pool)
            .await;

            if let Err(e) = result {
                warn!(action = %entry.action, error = %e, "⚠️ Error guardando audit log");
            }
        });
    }
}

/// Sólo emite el evento por tracing (modo memoria / desarrollo)
#[derive(Default)]
pub struct TracingAuditLog;

impl AuditLog for TracingAuditLog {
    fn log(&self, entry: AuditEntry) {
        info!(
            actor = %entry.actor_id,
            action = %entry.action,
            target_type = %entry.target_type,
            target = %entry.target_id,
            reason = entry.reason.as_deref().unwrap_or(""),
            "📝 audit"
        );
    }
}

/// Guarda las entradas en memoria; útil en tests
#[derive(Default)]
pub struct MemoryAuditLog {
    entries: Mutex<Vec<AuditEntry>>,
}

impl MemoryAuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<AuditEntry> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }

    pub fn actions(&self) -> Vec<String> {
        self.entries().into_iter().map(|e| e.action).collect()
    }
}

impl AuditLog for MemoryAuditLog {
    fn log(&self, entry: AuditEntry) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push(entry);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_audit_records_in_order() {
        let audit = MemoryAuditLog::new();
        let actor = Uuid::new_v4();
        audit.log(AuditEntry::new(actor, "reservation.create", "reservation", Uuid::new_v4()));
        audit.log(
            AuditEntry::new(actor, "reservation.cancel", "reservation", Uuid::new_v4())
                .reason("trip moved"),
        );

        assert_eq!(audit.actions(), vec!["reservation.create", "reservation.cancel"]);
        assert_eq!(audit.entries()[1].reason.as_deref(), Some("trip moved"));
    }

    #[test]
    fn test_empty_reason_is_dropped() {
        let entry = AuditEntry::new(Uuid::new_v4(), "dispatch.create", "dispatch", Uuid::new_v4())
            .reason("");
        assert!(entry.reason.is_none());
    }
}
