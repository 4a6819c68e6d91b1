use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use dotenvy::dotenv;
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use fleet_booking::config::database::DatabaseConfig;
use fleet_booking::config::environment::{EnvironmentConfig, StoreBackend};
use fleet_booking::database::DatabaseConnection;
use fleet_booking::middleware::cors_layer;
use fleet_booking::repositories::MemoryStore;
use fleet_booking::services::{
    AuditLog, LogNotifier, Notifier, PgAuditLog, TracingAuditLog, WebhookNotifier,
};
use fleet_booking::{create_router, AppState, Stores};

#[tokio::main]
async fn main() -> Result<()> {
    // Cargar variables de entorno
    dotenv().ok();

    // Configurar logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("🚗 Fleet Booking Engine");
    info!("=======================");

    let config = EnvironmentConfig::from_env().context("invalid configuration")?;

    let (stores, audit): (Stores, Arc<dyn AuditLog>) = match config.store {
        StoreBackend::Postgres => {
            let db_config = DatabaseConfig::from_env().context("invalid database configuration")?;
            let db = match DatabaseConnection::connect(&db_config).await {
                Ok(db) => db,
                Err(e) => {
                    error!("❌ Error conectando a la base de datos: {}", e);
                    return Err(anyhow::anyhow!("Error de base de datos: {}", e));
                }
            };
            db.run_migrations().await.context("database migrations failed")?;
            let pool = db.pool();
            (Stores::postgres(pool.clone()), Arc::new(PgAuditLog::new(pool)))
        }
        StoreBackend::Memory => {
            warn!("⚠️ Almacén en memoria: los datos se pierden al reiniciar");
            (Stores::memory(Arc::new(MemoryStore::new())), Arc::new(TracingAuditLog))
        }
    };

    let notifier: Arc<dyn Notifier> = match &config.notify_webhook_url {
        Some(url) => {
            info!("📨 Notificaciones vía webhook");
            Arc::new(WebhookNotifier::new(url.clone()))
        }
        None => Arc::new(LogNotifier),
    };

    let addr: SocketAddr = config
        .server_url()
        .parse()
        .with_context(|| format!("invalid listen address {}", config.server_url()))?;
    let cors = cors_layer(&config);

    let app = create_router(AppState::new(config, stores, audit, notifier))
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    info!("🌐 Servidor iniciando en http://{}", addr);
    info!("   POST /api/bookings - Reserva unificada (ahora / futura)");
    info!("   /api/reservations - Reservas, disponibilidad y timeline");
    info!("   /api/conflicts - Resolución de conflictos");
    info!("   /api/dispatches - Viajes inmediatos, quick board y ETA");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| {
            error!("❌ Error del servidor: {}", e);
            e
        })?;

    info!("👋 Servidor terminado");
    Ok(())
}

/// Señal de apagado graceful
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("❌ No se pudo instalar el handler de Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("❌ No se pudo instalar el handler de SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("🛑 Señal Ctrl+C recibida, apagando servidor...");
        },
        _ = terminate => {
            info!("🛑 Señal SIGTERM recibida, apagando servidor...");
        },
    }
}
