use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{Dispatch, DispatchStatus};
use crate::repositories::store::DispatchStore;
use crate::utils::errors::AppResult;

const DISPATCH_COLUMNS: &str = "d.id, d.vehicle_id, d.requester_id, d.dispatcher_id, d.purpose, \
    d.passenger_name, d.passenger_count, d.notes, d.pickup_address, d.pickup_lat, d.pickup_lng, \
    d.dropoff_address, d.dropoff_lat, d.dropoff_lng, d.status, d.assigned_at, d.accepted_at, \
    d.en_route_at, d.arrived_at, d.completed_at, d.cancelled_at, d.estimated_end_at, \
    d.cancel_reason, d.created_at, d.updated_at";

const ACTIVE_STATUSES: &str = "('assigned', 'accepted', 'en_route', 'arrived')";

pub struct DispatchRepository {
    pool: PgPool,
}

impl DispatchRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Columna de timestamp propia de cada estado de progreso
fn timestamp_column(status: DispatchStatus) -> Option<&'static str> {
    match status {
        DispatchStatus::Accepted => Some("accepted_at"),
        DispatchStatus::EnRoute => Some("en_route_at"),
        DispatchStatus::Arrived => Some("arrived_at"),
        DispatchStatus::Completed => Some("completed_at"),
        _ => None,
    }
}

#[async_trait]
impl DispatchStore for DispatchRepository {
    async fn create_dispatch(&self, d: &Dispatch) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO dispatches (id, requester_id, purpose, passenger_name, passenger_count, notes,
                pickup_address, pickup_lat, pickup_lng, dropoff_address, dropoff_lat, dropoff_lng,
                status, estimated_end_at, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            "#,
        )
        .bind(d.id)
        .bind(d.requester_id)
        .bind(&d.purpose)
        .bind(&d.passenger_name)
        .bind(d.passenger_count)
        .bind(&d.notes)
        .bind(&d.pickup_address)
        .bind(d.pickup_lat)
        .bind(d.pickup_lng)
        .bind(&d.dropoff_address)
        .bind(d.dropoff_lat)
        .bind(d.dropoff_lng)
        .bind(d.status)
        .bind(d.estimated_end_at)
        .bind(d.created_at)
        .bind(d.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_dispatch(&self, id: Uuid) -> AppResult<Option<Dispatch>> {
        let dispatch = sqlx::query_as::<_, Dispatch>(&format!(
            "SELECT {} FROM dispatches d WHERE d.id = $1",
            DISPATCH_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(dispatch)
    }

    async fn list_dispatches(
        &self,
        status: Option<DispatchStatus>,
        limit: i64,
        offset: i64,
    ) -> AppResult<Vec<Dispatch>> {
        let dispatches = sqlx::query_as::<_, Dispatch>(&format!(
            r#"
            SELECT {} FROM dispatches d
            WHERE ($1::dispatch_status IS NULL OR d.status = $1)
            ORDER BY d.created_at DESC
            LIMIT $2 OFFSET $3
            "#,
            DISPATCH_COLUMNS
        ))
        .bind(status)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(dispatches)
    }

    async fn assign_dispatch(&self, id: Uuid, vehicle_id: Uuid, dispatcher_id: Uuid) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE dispatches
            SET vehicle_id = $1, dispatcher_id = $2, status = 'assigned',
                assigned_at = NOW(), updated_at = NOW()
            WHERE id = $3 AND status = 'pending'
            "#,
        )
        .bind(vehicle_id)
        .bind(dispatcher_id)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn update_dispatch_status(&self, id: Uuid, status: DispatchStatus) -> AppResult<()> {
        let query = match timestamp_column(status) {
            Some(column) => format!(
                "UPDATE dispatches SET status = $1, {} = NOW(), updated_at = NOW() WHERE id = $2",
                column
            ),
            None => "UPDATE dispatches SET status = $1, updated_at = NOW() WHERE id = $2".to_string(),
        };

        sqlx::query(&query)
            .bind(status)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn cancel_dispatch(&self, id: Uuid, reason: &str) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE dispatches
            SET status = 'cancelled', cancelled_at = NOW(), cancel_reason = $1, updated_at = NOW()
            WHERE id = $2 AND status NOT IN ('completed', 'cancelled')
            "#,
        )
        .bind(reason)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn get_active_dispatch_for_vehicle(&self, vehicle_id: Uuid) -> AppResult<Option<Dispatch>> {
        let dispatch = sqlx::query_as::<_, Dispatch>(&format!(
            r#"
            SELECT {} FROM dispatches d
            WHERE d.vehicle_id = $1 AND d.status IN {}
            ORDER BY d.created_at DESC LIMIT 1
            "#,
            DISPATCH_COLUMNS, ACTIVE_STATUSES
        ))
        .bind(vehicle_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(dispatch)
    }

    async fn get_active_dispatch_for_driver(&self, driver_id: Uuid) -> AppResult<Option<Dispatch>> {
        let dispatch = sqlx::query_as::<_, Dispatch>(&format!(
            r#"
            SELECT {} FROM dispatches d
            JOIN vehicles v ON v.id = d.vehicle_id
            WHERE v.driver_id = $1 AND d.status IN {}
            ORDER BY d.created_at DESC LIMIT 1
            "#,
            DISPATCH_COLUMNS, ACTIVE_STATUSES
        ))
        .bind(driver_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(dispatch)
    }
}
