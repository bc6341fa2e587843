use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use dotenvy::dotenv;
use tokio::signal;
use tracing::{error, info, warn, Level};

use vehicle_rental::config::environment::{EnvironmentConfig, StorageBackend};
use vehicle_rental::database;
use vehicle_rental::routes::create_router;
use vehicle_rental::state::AppState;
use vehicle_rental::utils::clock::SystemClock;

#[tokio::main]
async fn main() -> Result<()> {
    // Cargar variables de entorno
    dotenv().ok();
    let config = EnvironmentConfig::from_env()?;

    // Configurar logging
    let level = config.log_level.parse::<Level>().unwrap_or(Level::INFO);
    tracing_subscriber::fmt().with_max_level(level).init();

    info!("🚗 Vehicle Rental API");
    info!("================================================");
    info!("🌍 Entorno: {}", config.environment);
    info!("📍 Fórmula de distancia: {}", config.distance_formula);

    let clock = Arc::new(SystemClock);
    let state = match config.storage_backend {
        StorageBackend::Postgres => {
            let url = config
                .database_url
                .clone()
                .context("DATABASE_URL must be set")?;
            let pool = database::connect(&url).await?;
            database::run_migrations(&pool).await?;
            AppState::with_postgres(config.clone(), pool, clock)
        }
        StorageBackend::Memory => {
            warn!("⚠️ Almacenamiento en memoria: los datos se pierden al reiniciar");
            AppState::in_memory(config.clone(), clock)
        }
    };

    if let (Some(username), Some(password)) = (&config.admin_username, &config.admin_password) {
        state
            .auth
            .ensure_admin(username, password)
            .await
            .map_err(|e| anyhow::anyhow!("no se pudo crear el administrador: {}", e))?;
    }

    let app = create_router(state);
    let addr: SocketAddr = config
        .server_url()
        .parse()
        .with_context(|| format!("dirección inválida: {}", config.server_url()))?;

    info!("🌐 Servidor iniciando en http://{}", addr);
    info!("🔍 Endpoints disponibles:");
    info!("   GET  /health");
    info!("👤 /api/account: sign-up, sign-in, sign-out, me, update");
    info!("💰 /api/payment: top-up/:account_id");
    info!("🚗 /api/vehicle: POST /, GET|PUT|DELETE /:id");
    info!("🔑 /api/rent: vehicles, new/:vehicle_id, end/:id, :id, history, vehicle-history/:id");
    info!("🛠️ /api/admin/rent: /, :id, end/:id, user-history/:id, vehicle-history/:id");
    info!("🛠️ /api/admin/account: /, :id (start/count)");
    info!("🛠️ /api/admin/vehicle: /, :id (start/count/vehicle_type)");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("❌ Error del servidor: {}", e);
        return Err(e.into());
    }

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
            Ok(mut stream) => {
                stream.recv().await;
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
            info!("🛑 Señal de terminación recibida, apagando servidor...");
        },
    }
}
