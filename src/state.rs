//! Shared application state
//!
//! Este módulo define el estado compartido de la aplicación que se pasa
//! a través del router de Axum, y el cableado de almacenes y servicios.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::environment::EnvironmentConfig;
use crate::repositories::{
    ConflictRepository, ConflictStore, DispatchRepository, DispatchStore, MemoryStore,
    ReservationRepository, ReservationStore, VehicleRepository, VehicleStore,
};
use crate::services::{
    AuditLog, BookingService, ConflictService, DispatchService, EtaEstimator, Notifier,
    ReservationService, VehicleLocks,
};

/// Un almacén por rol
#[derive(Clone)]
pub struct Stores {
    pub vehicles: Arc<dyn VehicleStore>,
    pub reservations: Arc<dyn ReservationStore>,
    pub conflicts: Arc<dyn ConflictStore>,
    pub dispatches: Arc<dyn DispatchStore>,
}

impl Stores {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            vehicles: Arc::new(VehicleRepository::new(pool.clone())),
            reservations: Arc::new(ReservationRepository::new(pool.clone())),
            conflicts: Arc::new(ConflictRepository::new(pool.clone())),
            dispatches: Arc::new(DispatchRepository::new(pool)),
        }
    }

    pub fn memory(store: Arc<MemoryStore>) -> Self {
        Self {
            vehicles: store.clone(),
            reservations: store.clone(),
            conflicts: store.clone(),
            dispatches: store,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: EnvironmentConfig,
    pub reservations: Arc<ReservationService>,
    pub conflicts: Arc<ConflictService>,
    pub dispatches: Arc<DispatchService>,
    pub bookings: Arc<BookingService>,
    pub eta: Arc<EtaEstimator>,
}

impl AppState {
    pub fn new(
        config: EnvironmentConfig,
        stores: Stores,
        audit: Arc<dyn AuditLog>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let locks = Arc::new(VehicleLocks::new());

        let reservations = Arc::new(ReservationService::new(
            stores.reservations.clone(),
            stores.vehicles.clone(),
            audit.clone(),
            locks.clone(),
        ));
        let conflicts = Arc::new(ConflictService::new(
            stores.conflicts.clone(),
            stores.reservations.clone(),
            stores.vehicles.clone(),
            audit.clone(),
        ));
        let dispatches = Arc::new(DispatchService::new(
            stores.dispatches.clone(),
            stores.vehicles.clone(),
            audit.clone(),
            notifier.clone(),
            locks.clone(),
        ));
        let bookings = Arc::new(BookingService::new(
            dispatches.clone(),
            stores.vehicles.clone(),
            stores.reservations.clone(),
            audit,
            notifier,
            locks,
        ));
        let eta = Arc::new(EtaEstimator::new(
            stores.vehicles,
            stores.dispatches,
            config.eta.clone(),
        ));

        Self {
            config,
            reservations,
            conflicts,
            dispatches,
            bookings,
            eta,
        }
    }
}
