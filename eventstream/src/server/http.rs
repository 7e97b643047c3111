//! HTTP server wiring and lifecycle.

use std::net::SocketAddr;

use axum::routing::get;
use axum::Router;
use tokio::signal;
use tokio_util::sync::CancellationToken;

use super::handlers::{
    get_event, get_events, get_healthy, get_metrics, get_range, get_ready, AppState,
};

/// Builds the service router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/events", get(get_events))
        .route("/api/v1/events/{id}", get(get_event))
        .route("/api/v1/range", get(get_range))
        .route("/metrics", get(get_metrics))
        .route("/-/healthy", get(get_healthy))
        .route("/-/ready", get(get_ready))
        .with_state(state)
}

/// Serves HTTP until `shutdown` fires, then drains in-flight connections.
///
/// Draining is bounded by the configured shutdown timeout; connections still
/// open after that (long-lived streams, typically) are closed forcibly.
pub async fn serve(state: AppState, shutdown: CancellationToken) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], state.config.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "starting http listener");

    let drain_timeout = state.config.shutdown_timeout;
    let app = router(state);

    let graceful = {
        let shutdown = shutdown.clone();
        async move { shutdown.cancelled().await }
    };

    tokio::select! {
        result = axum::serve(listener, app).with_graceful_shutdown(graceful) => result,
        _ = async {
            shutdown.cancelled().await;
            tokio::time::sleep(drain_timeout).await;
        } => {
            tracing::warn!(timeout = ?drain_timeout, "drain timeout exceeded, forcing close");
            Ok(())
        }
    }
}

/// Resolves on SIGINT (Ctrl+C) or SIGTERM (pod termination).
pub async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received SIGINT, starting graceful shutdown"),
        _ = terminate => tracing::info!("received SIGTERM, starting graceful shutdown"),
    }
}
