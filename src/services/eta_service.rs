//! Estimación de ETA
//!
//! Distancia haversine desde cada vehículo al punto de recogida y una
//! velocidad media urbana muestreada al azar. Es una aproximación: el RNG
//! se puede sembrar para obtener resultados reproducibles.

use std::sync::{Arc, Mutex};

use chrono::{Duration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use crate::models::GeoPoint;
use crate::repositories::{DispatchStore, VehicleStore};
use crate::utils::errors::{validation_error, AppResult};

const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Desplazamientos (lat, lng) para vehículos sin posición reciente
const FALLBACK_OFFSETS: [(f64, f64); 5] = [
    (0.005, 0.003),
    (-0.003, 0.008),
    (0.008, -0.004),
    (-0.006, -0.006),
    (0.002, 0.012),
];

#[derive(Debug, Clone)]
pub struct EtaConfig {
    pub reference: GeoPoint,
    pub min_speed_kmh: f64,
    pub max_speed_kmh: f64,
    pub min_duration_sec: i64,
    pub location_stale_after: Duration,
    pub seed: Option<u64>,
}

impl Default for EtaConfig {
    fn default() -> Self {
        Self {
            reference: GeoPoint::new(14.5547, 121.0244),
            min_speed_kmh: 15.0,
            max_speed_kmh: 25.0,
            min_duration_sec: 60,
            location_stale_after: Duration::seconds(120),
            seed: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct VehicleEta {
    pub vehicle_id: Uuid,
    pub vehicle_name: String,
    pub license_plate: String,
    pub latitude: f64,
    pub longitude: f64,
    /// true si la posición es la de respaldo y no la reportada
    pub position_estimated: bool,
    pub distance_m: i64,
    pub duration_sec: i64,
    pub is_available: bool,
}

pub struct EtaEstimator {
    vehicles: Arc<dyn VehicleStore>,
    dispatches: Arc<dyn DispatchStore>,
    config: EtaConfig,
    rng: Mutex<StdRng>,
}

impl EtaEstimator {
    pub fn new(
        vehicles: Arc<dyn VehicleStore>,
        dispatches: Arc<dyn DispatchStore>,
        config: EtaConfig,
    ) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            vehicles,
            dispatches,
            config,
            rng: Mutex::new(rng),
        }
    }

    /// ETA de todos los vehículos (orden por nombre) hasta `pickup`
    pub async fn estimate_all(&self, pickup: GeoPoint) -> AppResult<Vec<VehicleEta>> {
        if !(-90.0..=90.0).contains(&pickup.lat) || !(-180.0..=180.0).contains(&pickup.lng) {
            return Err(validation_error("pickup coordinates out of range"));
        }

        let vehicles = self.vehicles.list_vehicles().await?;
        let now = Utc::now();

        let mut busy = Vec::with_capacity(vehicles.len());
        for vehicle in &vehicles {
            let active = self.dispatches.get_active_dispatch_for_vehicle(vehicle.id).await?;
            busy.push(active.is_some());
        }

        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let estimates = vehicles
            .iter()
            .zip(busy)
            .enumerate()
            .map(|(index, (vehicle, is_busy))| {
                let (position, position_estimated) =
                    match vehicle.fresh_position(now, self.config.location_stale_after) {
                        Some(position) => (position, false),
                        None => (self.fallback_position(index), true),
                    };
                let distance_m = haversine_m(position, pickup);

                VehicleEta {
                    vehicle_id: vehicle.id,
                    vehicle_name: vehicle.name.clone(),
                    license_plate: vehicle.license_plate.clone(),
                    latitude: position.lat,
                    longitude: position.lng,
                    position_estimated,
                    distance_m: distance_m.round() as i64,
                    duration_sec: self.sample_duration(distance_m, &mut rng),
                    is_available: !vehicle.is_maintenance && !is_busy,
                }
            })
            .collect::<Vec<_>>();

        debug!(count = estimates.len(), "🧭 ETAs calculados");
        Ok(estimates)
    }

    fn fallback_position(&self, index: usize) -> GeoPoint {
        let (dlat, dlng) = FALLBACK_OFFSETS[index % FALLBACK_OFFSETS.len()];
        GeoPoint::new(self.config.reference.lat + dlat, self.config.reference.lng + dlng)
    }

    fn sample_duration(&self, distance_m: f64, rng: &mut StdRng) -> i64 {
        let speed_kmh = rng.gen_range(self.config.min_speed_kmh..=self.config.max_speed_kmh);
        let duration = (distance_m / (speed_kmh * 1000.0 / 3600.0)).round() as i64;
        let floor = self.config.min_duration_sec;
        if duration < floor {
            floor + rng.gen_range(0..(2 * floor).max(1))
        } else {
            duration
        }
    }
}

/// Distancia great-circle en metros
pub fn haversine_m(a: GeoPoint, b: GeoPoint) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();
    let h = (d_lat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * h.sqrt().atan2((1.0 - h).sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewDispatch, Vehicle};
    use crate::repositories::MemoryStore;

    fn vehicle(name: &str, position: Option<(f64, f64)>) -> Vehicle {
        Vehicle {
            id: Uuid::new_v4(),
            name: name.into(),
            license_plate: format!("{}-001", name),
            driver_id: Uuid::new_v4(),
            is_maintenance: false,
            latitude: position.map(|p| p.0),
            longitude: position.map(|p| p.1),
            location_at: position.map(|_| Utc::now()),
        }
    }

    fn estimator(store: Arc<MemoryStore>, seed: u64) -> EtaEstimator {
        EtaEstimator::new(
            store.clone(),
            store,
            EtaConfig {
                seed: Some(seed),
                ..EtaConfig::default()
            },
        )
    }

    #[test]
    fn test_haversine_known_distance() {
        // Un grado de latitud ≈ 111.19 km
        let d = haversine_m(GeoPoint::new(0.0, 0.0), GeoPoint::new(1.0, 0.0));
        assert!((d - 111_195.0).abs() < 1.0, "got {}", d);
        assert_eq!(haversine_m(GeoPoint::new(14.5, 121.0), GeoPoint::new(14.5, 121.0)), 0.0);
    }

    #[tokio::test]
    async fn test_same_seed_same_output() {
        let store = Arc::new(MemoryStore::new());
        store.upsert_vehicle(vehicle("A", Some((14.60, 121.00)))).await;
        store.upsert_vehicle(vehicle("B", None)).await;

        let pickup = GeoPoint::new(14.55, 121.02);
        let first = estimator(store.clone(), 7).estimate_all(pickup).await.unwrap();
        let second = estimator(store, 7).estimate_all(pickup).await.unwrap();

        let durations = |v: &[VehicleEta]| v.iter().map(|e| e.duration_sec).collect::<Vec<_>>();
        assert_eq!(durations(&first), durations(&second));
    }

    #[tokio::test]
    async fn test_fallback_positions_cycle_and_floor_applies() {
        let store = Arc::new(MemoryStore::new());
        for name in ["V1", "V2", "V3", "V4", "V5", "V6"] {
            store.upsert_vehicle(vehicle(name, None)).await;
        }

        let reference = EtaConfig::default().reference;
        let etas = estimator(store, 1).estimate_all(reference).await.unwrap();

        assert_eq!(etas.len(), 6);
        assert!(etas.iter().all(|e| e.position_estimated));
        assert!((etas[0].latitude - (reference.lat + 0.005)).abs() < 1e-9);
        assert!((etas[1].longitude - (reference.lng + 0.008)).abs() < 1e-9);
        // el sexto vuelve al primer desplazamiento
        assert!((etas[5].latitude - etas[0].latitude).abs() < 1e-9);
        assert!(etas.iter().all(|e| e.duration_sec >= 60));
    }

    #[tokio::test]
    async fn test_near_vehicle_gets_floor_range() {
        let store = Arc::new(MemoryStore::new());
        store.upsert_vehicle(vehicle("Near", Some((14.5547, 121.0244)))).await;

        for seed in 0..20 {
            let etas = estimator(store.clone(), seed)
                .estimate_all(GeoPoint::new(14.5547, 121.0244))
                .await
                .unwrap();
            assert_eq!(etas[0].distance_m, 0);
            assert!((60..180).contains(&etas[0].duration_sec));
        }
    }

    #[tokio::test]
    async fn test_availability_reflects_maintenance_and_active_dispatch() {
        let store = Arc::new(MemoryStore::new());
        let idle = vehicle("A", Some((14.6, 121.0)));
        let mut repairing = vehicle("B", Some((14.6, 121.0)));
        repairing.is_maintenance = true;
        let busy = vehicle("C", Some((14.6, 121.0)));
        for v in [&idle, &repairing, &busy] {
            store.upsert_vehicle(v.clone()).await;
        }

        let dispatch = NewDispatch {
            purpose: "Airport".into(),
            pickup_address: "Lobby".into(),
            ..Default::default()
        }
        .into_dispatch(Uuid::new_v4());
        store.create_dispatch(&dispatch).await.unwrap();
        store.assign_dispatch(dispatch.id, busy.id, Uuid::new_v4()).await.unwrap();

        let etas = estimator(store, 3).estimate_all(GeoPoint::new(14.55, 121.02)).await.unwrap();
        let available: Vec<_> = etas.iter().map(|e| (e.vehicle_name.as_str(), e.is_available)).collect();
        assert_eq!(available, vec![("A", true), ("B", false), ("C", false)]);
    }

    #[tokio::test]
    async fn test_rejects_out_of_range_pickup() {
        let store = Arc::new(MemoryStore::new());
        let err = estimator(store, 0).estimate_all(GeoPoint::new(91.0, 0.0)).await.unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");
    }
}
