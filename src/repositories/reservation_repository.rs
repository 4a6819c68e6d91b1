use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgArguments;
use sqlx::query::Query;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::models::{
    DeclinedVehicles, Reservation, ReservationConflict, ReservationFilter, ReservationStatus,
    TimeWindow,
};
use crate::repositories::store::ReservationStore;
use crate::utils::errors::AppResult;

const RESERVATION_COLUMNS: &str = "id, vehicle_id, requester_id, start_time, end_time, purpose, \
    destinations, notes, passenger_name, pickup_address, pickup_lat, pickup_lng, priority_level, \
    status, cancel_reason, cancelled_by, declined_vehicle_ids, created_at, updated_at";

// Fila cruda: el array de rechazos se convierte a DeclinedVehicles
#[derive(Debug, FromRow)]
struct ReservationRow {
    id: Uuid,
    vehicle_id: Uuid,
    requester_id: Uuid,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    purpose: String,
    destinations: Vec<String>,
    notes: Option<String>,
    passenger_name: Option<String>,
    pickup_address: Option<String>,
    pickup_lat: Option<f64>,
    pickup_lng: Option<f64>,
    priority_level: i32,
    status: ReservationStatus,
    cancel_reason: Option<String>,
    cancelled_by: Option<Uuid>,
    declined_vehicle_ids: Vec<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ReservationRow> for Reservation {
    fn from(row: ReservationRow) -> Self {
        Self {
            id: row.id,
            vehicle_id: row.vehicle_id,
            requester_id: row.requester_id,
            start_time: row.start_time,
            end_time: row.end_time,
            purpose: row.purpose,
            destinations: row.destinations,
            notes: row.notes,
            passenger_name: row.passenger_name,
            pickup_address: row.pickup_address,
            pickup_lat: row.pickup_lat,
            pickup_lng: row.pickup_lng,
            priority_level: row.priority_level,
            status: row.status,
            cancel_reason: row.cancel_reason,
            cancelled_by: row.cancelled_by,
            declined_vehicle_ids: DeclinedVehicles::from(row.declined_vehicle_ids),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

pub struct ReservationRepository {
    pool: PgPool,
}

impl ReservationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReservationStore for ReservationRepository {
    async fn create_reservation(&self, r: &Reservation) -> AppResult<()> {
        insert_reservation(r).execute(&self.pool).await?;
        Ok(())
    }

    async fn create_reservation_with_conflicts(
        &self,
        reservation: &Reservation,
        conflicts: &[ReservationConflict],
        demote: &[Uuid],
    ) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        insert_reservation(reservation).execute(&mut *tx).await?;
        for conflict in conflicts {
            sqlx::query(
                r#"
                INSERT INTO reservation_conflicts (id, winning_reservation_id, losing_reservation_id, status, created_at)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(conflict.id)
            .bind(conflict.winning_reservation_id)
            .bind(conflict.losing_reservation_id)
            .bind(conflict.status)
            .bind(conflict.created_at)
            .execute(&mut *tx)
            .await?;
        }
        if !demote.is_empty() {
            sqlx::query(
                "UPDATE reservations SET status = 'pending_conflict', updated_at = NOW() WHERE id = ANY($1)",
            )
            .bind(demote)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn get_reservation(&self, id: Uuid) -> AppResult<Option<Reservation>> {
        let row = sqlx::query_as::<_, ReservationRow>(&format!(
            "SELECT {} FROM reservations WHERE id = $1",
            RESERVATION_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Reservation::from))
    }

    async fn update_reservation(&self, r: &Reservation) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE reservations
            SET vehicle_id = $1, start_time = $2, end_time = $3, purpose = $4,
                destinations = $5, notes = $6, updated_at = NOW()
            WHERE id = $7
            "#,
        )
        .bind(r.vehicle_id)
        .bind(r.start_time)
        .bind(r.end_time)
        .bind(&r.purpose)
        .bind(&r.destinations)
        .bind(&r.notes)
        .bind(r.id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update_reservation_status(&self, id: Uuid, status: ReservationStatus) -> AppResult<()> {
        sqlx::query("UPDATE reservations SET status = $1, updated_at = NOW() WHERE id = $2")
            .bind(status)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn update_reservation_status_if(
        &self,
        id: Uuid,
        expected: &[ReservationStatus],
        status: ReservationStatus,
    ) -> AppResult<bool> {
        let expected: Vec<&str> = expected.iter().map(|s| s.as_str()).collect();
        let result = sqlx::query(
            r#"
            UPDATE reservations SET status = $1, updated_at = NOW()
            WHERE id = $2 AND status::text = ANY($3)
            "#,
        )
        .bind(status)
        .bind(id)
        .bind(expected)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn update_reservation_vehicle(&self, id: Uuid, vehicle_id: Uuid) -> AppResult<()> {
        sqlx::query("UPDATE reservations SET vehicle_id = $1, updated_at = NOW() WHERE id = $2")
            .bind(vehicle_id)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn cancel_reservation(&self, id: Uuid, cancelled_by: Uuid, reason: &str) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE reservations
            SET status = 'cancelled', cancelled_by = $1, cancel_reason = $2, updated_at = NOW()
            WHERE id = $3
            "#,
        )
        .bind(cancelled_by)
        .bind(reason)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn add_declined_vehicle(&self, id: Uuid, vehicle_id: Uuid) -> AppResult<()> {
        // Sin duplicados: el array se comporta como conjunto ordenado
        sqlx::query(
            r#"
            UPDATE reservations
            SET declined_vehicle_ids = array_append(declined_vehicle_ids, $1),
                updated_at = NOW()
            WHERE id = $2 AND NOT ($1 = ANY(declined_vehicle_ids))
            "#,
        )
        .bind(vehicle_id)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_overlapping(
        &self,
        vehicle_id: Uuid,
        window: TimeWindow,
        exclude_id: Option<Uuid>,
    ) -> AppResult<Vec<Reservation>> {
        let rows = sqlx::query_as::<_, ReservationRow>(&format!(
            r#"
            SELECT {} FROM reservations
            WHERE vehicle_id = $1
                AND status IN ('confirmed', 'pending_conflict', 'pending_driver')
                AND start_time < $3
                AND end_time > $2
                AND ($4::uuid IS NULL OR id <> $4)
            ORDER BY start_time ASC
            "#,
            RESERVATION_COLUMNS
        ))
        .bind(vehicle_id)
        .bind(window.start)
        .bind(window.end)
        .bind(exclude_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Reservation::from).collect())
    }

    async fn list_reservations(&self, filter: &ReservationFilter) -> AppResult<Vec<Reservation>> {
        let mut query: QueryBuilder<Postgres> = QueryBuilder::new(format!(
            "SELECT {} FROM reservations WHERE 1=1",
            RESERVATION_COLUMNS
        ));

        if let Some(vehicle_id) = filter.vehicle_id {
            query.push(" AND vehicle_id = ").push_bind(vehicle_id);
        }
        if let Some(from) = filter.from {
            query.push(" AND end_time >= ").push_bind(from);
        }
        if let Some(to) = filter.to {
            query.push(" AND start_time <= ").push_bind(to);
        }
        if let Some(status) = filter.status {
            query.push(" AND status = ").push_bind(status);
        }

        query
            .push(" ORDER BY start_time ASC LIMIT ")
            .push_bind(filter.effective_limit())
            .push(" OFFSET ")
            .push_bind(filter.effective_offset());

        let rows = query
            .build_query_as::<ReservationRow>()
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Reservation::from).collect())
    }
}

fn insert_reservation(r: &Reservation) -> Query<'_, Postgres, PgArguments> {
    sqlx::query(
        r#"
        INSERT INTO reservations (id, vehicle_id, requester_id, start_time, end_time, purpose,
            destinations, notes, passenger_name, pickup_address, pickup_lat, pickup_lng,
            priority_level, status, declined_vehicle_ids, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
        "#,
    )
    .bind(r.id)
    .bind(r.vehicle_id)
    .bind(r.requester_id)
    .bind(r.start_time)
    .bind(r.end_time)
    .bind(&r.purpose)
    .bind(&r.destinations)
    .bind(&r.notes)
    .bind(&r.passenger_name)
    .bind(&r.pickup_address)
    .bind(r.pickup_lat)
    .bind(r.pickup_lng)
    .bind(r.priority_level)
    .bind(r.status)
    .bind(r.declined_vehicle_ids.as_slice().to_vec())
    .bind(r.created_at)
    .bind(r.updated_at)
}
