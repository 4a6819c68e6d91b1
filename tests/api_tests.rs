use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use fleet_booking::config::environment::EnvironmentConfig;
use fleet_booking::models::Vehicle;
use fleet_booking::repositories::MemoryStore;
use fleet_booking::services::{MemoryAuditLog, MemoryNotifier};
use fleet_booking::{create_router, AppState, Stores};

struct TestApp {
    router: Router,
    store: Arc<MemoryStore>,
    actor: Uuid,
}

impl TestApp {
    async fn send(&self, method: &str, uri: &str, body: Option<Value>, priority: Option<i32>) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("x-actor-id", self.actor.to_string());
        if let Some(priority) = priority {
            builder = builder.header("x-actor-priority", priority.to_string());
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        read(self.router.clone().oneshot(request).await.unwrap()).await
    }

    async fn vehicle(&self, name: &str, position: Option<(f64, f64)>) -> Vehicle {
        let vehicle = Vehicle {
            id: Uuid::new_v4(),
            name: name.into(),
            license_plate: format!("{}-200", name),
            driver_id: Uuid::new_v4(),
            is_maintenance: false,
            latitude: position.map(|p| p.0),
            longitude: position.map(|p| p.1),
            location_at: position.map(|_| Utc::now()),
        };
        self.store.upsert_vehicle(vehicle.clone()).await;
        vehicle
    }
}

async fn read(response: axum::response::Response) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn create_test_app() -> TestApp {
    let store = Arc::new(MemoryStore::new());
    let mut config = EnvironmentConfig::default();
    config.eta.seed = Some(7);
    let state = AppState::new(
        config,
        Stores::memory(store.clone()),
        Arc::new(MemoryAuditLog::new()),
        Arc::new(MemoryNotifier::new()),
    );
    TestApp {
        router: create_router(state),
        store,
        actor: Uuid::new_v4(),
    }
}

fn window(from_hours: i64, to_hours: i64) -> (String, String) {
    let base = Utc::now() + Duration::days(3);
    (
        (base + Duration::hours(from_hours)).to_rfc3339(),
        (base + Duration::hours(to_hours)).to_rfc3339(),
    )
}

#[tokio::test]
async fn test_health_check() {
    let app = create_test_app();
    let response = app
        .router
        .clone()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let (status, body) = read(response).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_missing_actor_is_unauthorized() {
    let app = create_test_app();
    let response = app
        .router
        .clone()
        .oneshot(Request::get("/api/conflicts").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let (status, body) = read(response).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_reservation_conflict_flow() {
    let app = create_test_app();
    let van = app.vehicle("Van", None).await;
    let (start, end) = window(9, 11);

    let (status, first) = app
        .send(
            "POST",
            "/api/reservations",
            Some(json!({ "vehicle_id": van.id, "start_time": start, "end_time": end, "purpose": "Audit" })),
            Some(1),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["data"]["reservation"]["status"], "confirmed");

    let (status, second) = app
        .send(
            "POST",
            "/api/reservations",
            Some(json!({ "vehicle_id": van.id, "start_time": start, "end_time": end, "purpose": "Board meeting" })),
            Some(9),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["data"]["reservation"]["status"], "pending_conflict");
    let conflict_id = second["data"]["conflicts"][0]["id"].as_str().unwrap().to_string();

    let (status, pending) = app.send("GET", "/api/conflicts", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(pending["data"].as_array().unwrap().len(), 1);

    let (status, body) = app
        .send("POST", &format!("/api/conflicts/{}/force-assign", conflict_id), Some(json!({})), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let (status, body) = app
        .send("POST", &format!("/api/conflicts/{}/cancel", conflict_id), Some(json!({ "reason": "duplicate" })), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "resolved_cancelled");

    let first_id = first["data"]["reservation"]["id"].as_str().unwrap();
    let (_, loser) = app.send("GET", &format!("/api/reservations/{}", first_id), None, None).await;
    assert_eq!(loser["data"]["status"], "cancelled");
}

#[tokio::test]
async fn test_reservation_rejects_inverted_window() {
    let app = create_test_app();
    let van = app.vehicle("Van", None).await;
    let (start, end) = window(9, 11);

    let (status, body) = app
        .send(
            "POST",
            "/api/reservations",
            Some(json!({ "vehicle_id": van.id, "start_time": end, "end_time": start, "purpose": "Audit" })),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], Value::Null);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_quick_board_on_busy_vehicle_conflicts() {
    let app = create_test_app();
    let van = app.vehicle("Van", None).await;

    let (status, trip) = app
        .send("POST", "/api/dispatches/quick-board", Some(json!({ "vehicle_id": van.id })), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(trip["data"]["status"], "en_route");

    let (status, body) = app
        .send("POST", "/api/dispatches/quick-board", Some(json!({ "vehicle_id": van.id })), None)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "VEHICLE_BUSY");

    let (status, _) = app
        .send("POST", "/api/dispatches/quick-board", Some(json!({ "vehicle_id": Uuid::new_v4() })), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_eta_lists_fleet() {
    let app = create_test_app();
    let near = app.vehicle("Near", Some((14.5547, 121.0244))).await;
    app.vehicle("Unknown", None).await;

    let (status, body) = app.send("GET", "/api/dispatches/eta?lat=14.56&lng=121.03", None, None).await;
    assert_eq!(status, StatusCode::OK);

    let etas = body["data"].as_array().unwrap();
    assert_eq!(etas.len(), 2);
    let entry = etas
        .iter()
        .find(|e| e["vehicle_id"] == json!(near.id))
        .unwrap();
    assert_eq!(entry["position_estimated"], false);
    assert!(entry["duration_sec"].as_i64().unwrap() >= 60);

    let (status, _) = app.send("GET", "/api/dispatches/eta?lat=120&lng=0", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
