//! Guestlist HTTP Server

use axum::{Router, routing::get};
use guestlist::{MemoryRecordStore, RecordStore, RedisRecordStore, RegistrationService};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::handlers::{self, AppState};

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/healthz", get(handlers::health))
        .route("/readyz", get(handlers::ready))
        .route(
            "/guests",
            get(handlers::list_guests).post(handlers::create_guest),
        )
        .route(
            "/guests/:sequence_id",
            get(handlers::get_guest).delete(handlers::delete_guest),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Open the record store named by the configuration.
pub async fn connect_store(
    config: &Config,
) -> Result<Arc<dyn RecordStore>, Box<dyn std::error::Error>> {
    match &config.redis_url {
        Some(redis_url) => {
            tracing::info!("Connecting to Redis");
            let store = RedisRecordStore::connect(redis_url, &config.redis_key_prefix)
                .await
                .map_err(|e| format!("Failed to connect to Redis: {}", e))?
                .with_page_size(config.scan_page_size);
            tracing::info!("Connected to Redis");
            Ok(Arc::new(store))
        }
        None => {
            tracing::warn!("REDIS_URL not set, guest records will not survive a restart");
            Ok(Arc::new(MemoryRecordStore::with_page_size(config.scan_page_size)))
        }
    }
}

pub async fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let store = connect_store(&config).await?;
    let state = Arc::new(AppState {
        registrations: RegistrationService::new(store),
    });

    let app = create_router(state);

    let addr = config.socket_addr();
    tracing::info!("Guestlist service listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Wait for shutdown signal (SIGTERM or Ctrl+C).
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => tracing::info!("Received Ctrl+C signal"),
            Err(e) => tracing::error!("Failed to listen for Ctrl+C: {}", e),
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
                tracing::info!("Received SIGTERM signal");
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Starting graceful shutdown...");
}
