//! Notificaciones push
//!
//! Best-effort: el envío se lanza en segundo plano y los errores se
//! registran y se descartan. Nunca hacen fallar la operación que notifica.

use std::collections::HashMap;
use std::sync::Mutex;

use reqwest::Client;
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Destinatario de una notificación
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum NotificationTarget {
    User(Uuid),
    VehicleDriver(Uuid),
    Roles(Vec<String>),
}

/// Contenido de una notificación; el destinatario lo fija el `Notifier`
#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub data: HashMap<String, String>,
}

impl Notification {
    pub fn new(title: &str, body: &str) -> Self {
        Self {
            title: title.to_string(),
            body: body.to_string(),
            data: HashMap::new(),
        }
    }

    pub fn with(mut self, key: &str, value: impl ToString) -> Self {
        self.data.insert(key.to_string(), value.to_string());
        self
    }
}

/// Notificación ya dirigida, tal como sale hacia el gateway
#[derive(Debug, Clone, Serialize)]
pub struct Delivery {
    pub target: NotificationTarget,
    #[serde(flatten)]
    pub notification: Notification,
}

pub trait Notifier: Send + Sync {
    fn send(&self, delivery: Delivery);

    fn notify_user(&self, user_id: Uuid, notification: Notification) {
        self.send(Delivery {
            target: NotificationTarget::User(user_id),
            notification,
        });
    }

    fn notify_vehicle_driver(&self, vehicle_id: Uuid, notification: Notification) {
        self.send(Delivery {
            target: NotificationTarget::VehicleDriver(vehicle_id),
            notification,
        });
    }

    fn notify_role(&self, roles: &[&str], notification: Notification) {
        self.send(Delivery {
            target: NotificationTarget::Roles(roles.iter().map(|r| r.to_string()).collect()),
            notification,
        });
    }
}

/// Publica cada notificación como JSON en un webhook (gateway push externo)
pub struct WebhookNotifier {
    client: Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: String) -> Self {
        Self {
            client: Client::new(),
            url,
        }
    }
}

impl Notifier for WebhookNotifier {
    fn send(&self, delivery: Delivery) {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            warn!(title = %delivery.notification.title, "⚠️ Notificación sin runtime, descartada");
            return;
        };

        let client = self.client.clone();
        let url = self.url.clone();
        handle.spawn(async move {
            let title = &delivery.notification.title;
            match client.post(&url).json(&delivery).send().await {
                Ok(response) if response.status().is_success() => {
                    debug!(title = %title, "📨 Notificación enviada");
                }
                Ok(response) => {
                    warn!(status = %response.status(), title = %title, "⚠️ Webhook rechazó la notificación");
                }
                Err(e) => {
                    warn!(error = %e, title = %title, "⚠️ Error enviando notificación");
                }
            }
        });
    }
}

/// Sólo registra la notificación
#[derive(Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn send(&self, delivery: Delivery) {
        info!(target_kind = ?delivery.target, title = %delivery.notification.title, "📨 notify");
    }
}

/// Acumula las notificaciones en memoria; útil en tests
#[derive(Default)]
pub struct MemoryNotifier {
    sent: Mutex<Vec<Delivery>>,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<Delivery> {
        self.sent.lock().map(|sent| sent.clone()).unwrap_or_default()
    }
}

impl Notifier for MemoryNotifier {
    fn send(&self, delivery: Delivery) {
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(delivery);
        }
    }
}
