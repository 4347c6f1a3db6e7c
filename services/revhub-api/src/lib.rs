pub mod handlers;
pub mod middleware;
pub mod rest;
pub mod state;
pub mod telemetry;
pub mod validation;

pub use rest::build_router;
pub use state::AppState;

use revhub_core::{CoreError, CoreResult, RevhubConfig};
use tokio::net::TcpListener;
use tracing::{error, info};

/// Boots the RevHub API server and serves until SIGINT or SIGTERM.
pub async fn run_server(config: RevhubConfig) -> CoreResult<()> {
    let addr = config
        .server
        .socket_addr()
        .map_err(|e| CoreError::validation(e.to_string()))?;

    let state = AppState::from_config(&config);
    let app = build_router(state);

    info!("Starting RevHub API server on {}", addr);

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| CoreError::internal(format!("Failed to bind to {}: {}", addr, e)))?;

    info!("Server successfully bound to {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| CoreError::internal(format!("Server error: {}", e)))?;

    info!("RevHub API server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install CTRL+C signal handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received CTRL+C signal, initiating graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM signal, initiating graceful shutdown");
        }
    }
}
