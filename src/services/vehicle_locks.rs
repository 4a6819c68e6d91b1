//! Locks por vehículo
//!
//! Serializan dentro del proceso las secuencias leer-y-escribir sobre un
//! mismo vehículo (chequeo de solape + alta de reserva, chequeo de
//! ocupado + quick-board). Vehículos distintos no se bloquean entre sí.
//! Las entradas sin guard ni espera se descartan en el siguiente `acquire`,
//! así el mapa sólo guarda los vehículos en uso.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

#[derive(Default)]
pub struct VehicleLocks {
    locks: Mutex<HashMap<Uuid, Arc<Mutex<()>>>>,
}

impl VehicleLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Espera el lock del vehículo; se libera al soltar el guard
    pub async fn acquire(&self, vehicle_id: Uuid) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            // Sólo el mapa la referencia: nadie la tiene ni la espera
            locks.retain(|id, lock| *id == vehicle_id || Arc::strong_count(lock) > 1);
            locks.entry(vehicle_id).or_default().clone()
        };
        lock.lock_owned().await
    }

    #[cfg(test)]
    async fn tracked(&self) -> usize {
        self.locks.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_vehicle_is_serialized() {
        let locks = Arc::new(VehicleLocks::new());
        let vehicle = Uuid::new_v4();

        let guard = locks.acquire(vehicle).await;
        let contender = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _guard = locks.acquire(vehicle).await;
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        drop(guard);
        contender.await.unwrap();
    }

    #[tokio::test]
    async fn test_released_locks_are_dropped() {
        let locks = VehicleLocks::new();
        for _ in 0..64 {
            let _guard = locks.acquire(Uuid::new_v4()).await;
        }
        let held = locks.acquire(Uuid::new_v4()).await;
        assert_eq!(locks.tracked().await, 1);

        let _other = locks.acquire(Uuid::new_v4()).await;
        assert_eq!(locks.tracked().await, 2);
        drop(held);
    }

    #[tokio::test]
    async fn test_other_vehicles_do_not_block() {
        let locks = VehicleLocks::new();
        let _a = locks.acquire(Uuid::new_v4()).await;
        let acquired = tokio::time::timeout(Duration::from_millis(50), locks.acquire(Uuid::new_v4())).await;
        assert!(acquired.is_ok());
    }
}
