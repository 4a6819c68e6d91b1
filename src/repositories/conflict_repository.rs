use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{ConflictStatus, ReservationConflict};
use crate::repositories::store::ConflictStore;
use crate::utils::errors::AppResult;

const CONFLICT_COLUMNS: &str = "id, winning_reservation_id, losing_reservation_id, status, \
    resolved_by, resolution_reason, resolved_at, created_at";

pub struct ConflictRepository {
    pool: PgPool,
}

impl ConflictRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ConflictStore for ConflictRepository {
    async fn get_conflict(&self, id: Uuid) -> AppResult<Option<ReservationConflict>> {
        let conflict = sqlx::query_as::<_, ReservationConflict>(&format!(
            "SELECT {} FROM reservation_conflicts WHERE id = $1",
            CONFLICT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(conflict)
    }

    async fn list_pending_conflicts(&self) -> AppResult<Vec<ReservationConflict>> {
        let conflicts = sqlx::query_as::<_, ReservationConflict>(&format!(
            "SELECT {} FROM reservation_conflicts WHERE status = 'pending' ORDER BY created_at DESC",
            CONFLICT_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(conflicts)
    }

    async fn resolve_conflict(
        &self,
        id: Uuid,
        resolved_by: Uuid,
        reason: &str,
        status: ConflictStatus,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE reservation_conflicts
            SET status = $1, resolved_by = $2, resolution_reason = $3, resolved_at = NOW()
            WHERE id = $4 AND status = 'pending'
            "#,
        )
        .bind(status)
        .bind(resolved_by)
        .bind(reason)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}
