//! vSphere event history over HTTP.
//!
//! A single writer task polls the upstream event source and appends each
//! event, wrapped as a CloudEvents JSON payload, to a bounded in-memory log
//! ([`eventlog`]). The HTTP adapter serves three read-only views of that
//! log: the retained offset range, a single record by offset, and a
//! newline-delimited live stream.
//!
//! [`run`] wires the pieces together: signal handling, the ingestor, and
//! the HTTP listener, all derived from one root cancellation token.

pub mod config;
pub mod event;
pub mod ingest;
pub mod server;
pub mod vsphere;

use std::sync::{Arc, OnceLock};

use thiserror::Error;
use tokio_util::sync::CancellationToken;

use config::{CliArgs, ServerConfig};
use ingest::{IngestError, Ingestor, SharedReader};
use server::handlers::AppState;
use server::metrics::Metrics;
use vsphere::EventSource;

/// Fatal service errors.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("serve http: {0}")]
    Http(#[from] std::io::Error),

    #[error("ingest events: {0}")]
    Ingest(#[from] IngestError),

    #[error("task failed: {0}")]
    Task(String),
}

/// Runs the service until a shutdown signal arrives or a task fails.
pub async fn run(
    args: CliArgs,
    source: impl EventSource + 'static,
) -> Result<(), ServiceError> {
    let shutdown = CancellationToken::new();

    let signal_task = tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            server::shutdown_signal().await;
            shutdown.cancel();
        }
    });

    let result = run_with_shutdown(args, source, shutdown).await;
    signal_task.abort();
    result
}

/// Like [`run`], but driven by a caller-supplied shutdown token.
///
/// The ingestor and every HTTP connection derive from `shutdown`; a fatal
/// error in either task cancels the token so the other side drains.
pub async fn run_with_shutdown(
    args: CliArgs,
    source: impl EventSource + 'static,
    shutdown: CancellationToken,
) -> Result<(), ServiceError> {
    let reader_slot: SharedReader = Arc::new(OnceLock::new());
    let metrics = Arc::new(Metrics::new());

    let state = AppState {
        log: reader_slot.clone(),
        metrics: metrics.clone(),
        config: Arc::new(ServerConfig {
            port: args.port,
            ..ServerConfig::default()
        }),
        shutdown: shutdown.clone(),
    };

    let ingestor = Ingestor::new(source, reader_slot, metrics, args);
    let mut ingest_task = tokio::spawn(ingestor.run(shutdown.clone()));

    let serve = server::serve(state, shutdown.clone());
    tokio::pin!(serve);

    tokio::select! {
        result = &mut serve => {
            shutdown.cancel();
            let _ = (&mut ingest_task).await;
            result.map_err(ServiceError::Http)
        }
        joined = &mut ingest_task => {
            shutdown.cancel();
            let serve_result = serve.await;
            match joined {
                Ok(Ok(())) => serve_result.map_err(ServiceError::Http),
                Ok(Err(err)) => Err(ServiceError::Ingest(err)),
                Err(err) => Err(ServiceError::Task(err.to_string())),
            }
        }
    }
}
