//! Rutas HTTP
//!
//! Un router por recurso, anidados bajo `/api`.

pub mod booking_routes;
pub mod conflict_routes;
pub mod dispatch_routes;
pub mod reservation_routes;

use axum::{response::Json, routing::get, Router};
use serde_json::{json, Value};

use crate::state::AppState;

/// Router completo de la API
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api/bookings", booking_routes::create_booking_router())
        .nest("/api/reservations", reservation_routes::create_reservation_router())
        .nest("/api/conflicts", conflict_routes::create_conflict_router())
        .nest("/api/dispatches", dispatch_routes::create_dispatch_router())
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
