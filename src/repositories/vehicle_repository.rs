use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{TimeWindow, Vehicle};
use crate::repositories::store::VehicleStore;
use crate::utils::errors::AppResult;

const VEHICLE_SELECT: &str = r#"
    SELECT v.id, v.name, v.license_plate, v.driver_id, v.is_maintenance,
           vlc.latitude, vlc.longitude, vlc.recorded_at AS location_at
    FROM vehicles v
    LEFT JOIN vehicle_location_current vlc ON vlc.vehicle_id = v.id
"#;

pub struct VehicleRepository {
    pool: PgPool,
}

impl VehicleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VehicleStore for VehicleRepository {
    async fn get_vehicle(&self, id: Uuid) -> AppResult<Option<Vehicle>> {
        let vehicle = sqlx::query_as::<_, Vehicle>(&format!("{} WHERE v.id = $1", VEHICLE_SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(vehicle)
    }

    async fn get_vehicle_by_driver(&self, driver_id: Uuid) -> AppResult<Option<Vehicle>> {
        let vehicle = sqlx::query_as::<_, Vehicle>(&format!(
            "{} WHERE v.driver_id = $1 ORDER BY v.name LIMIT 1",
            VEHICLE_SELECT
        ))
        .bind(driver_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(vehicle)
    }

    async fn list_vehicles(&self) -> AppResult<Vec<Vehicle>> {
        let vehicles = sqlx::query_as::<_, Vehicle>(&format!("{} ORDER BY v.name", VEHICLE_SELECT))
            .fetch_all(&self.pool)
            .await?;

        Ok(vehicles)
    }

    async fn find_available_vehicles(
        &self,
        window: TimeWindow,
        exclude: &[Uuid],
    ) -> AppResult<Vec<Uuid>> {
        let ids: Vec<(Uuid,)> = sqlx::query_as(
            r#"
            SELECT v.id
            FROM vehicles v
            WHERE v.is_maintenance = FALSE
                AND v.id <> ALL($3::uuid[])
                AND NOT EXISTS (
                    SELECT 1 FROM reservations res
                    WHERE res.vehicle_id = v.id
                        AND res.status IN ('confirmed', 'pending_driver')
                        AND res.start_time < $2
                        AND res.end_time > $1
                )
                AND NOT EXISTS (
                    SELECT 1 FROM dispatches d
                    WHERE d.vehicle_id = v.id
                        AND d.status IN ('assigned', 'accepted', 'en_route', 'arrived')
                )
            ORDER BY v.name
            "#,
        )
        .bind(window.start)
        .bind(window.end)
        .bind(exclude.to_vec())
        .fetch_all(&self.pool)
        .await?;

        Ok(ids.into_iter().map(|(id,)| id).collect())
    }
}
