//! HTTP route handlers.

use std::convert::Infallible;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use bytes::Bytes;
use prometheus_client::metrics::gauge::Gauge;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use uuid::Uuid;

use eventlog::{LogReader, Offset, NO_OFFSET};

use crate::config::ServerConfig;
use crate::event::CloudEvent;
use crate::ingest::SharedReader;
use crate::server::error::ApiError;
use crate::server::metrics::Metrics;
use crate::server::request::{EventsParams, WatchMode};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub log: SharedReader,
    pub metrics: Arc<Metrics>,
    pub config: Arc<ServerConfig>,
    /// Server-wide shutdown signal; streaming connections derive from it.
    pub shutdown: CancellationToken,
}

impl AppState {
    /// The read capability, or 503 while the ingestor has not yet seen an
    /// event and the log does not exist.
    fn reader(&self) -> Result<&LogReader, ApiError> {
        self.log.get().ok_or(ApiError::Unavailable)
    }
}

#[derive(Debug, Serialize)]
struct LogRange {
    earliest: Offset,
    latest: Offset,
}

/// Handle `GET /api/v1/range`.
///
/// 200 with the inclusive offset bounds, 204 on an empty log.
pub async fn get_range(State(state): State<AppState>) -> Result<Response, ApiError> {
    state.metrics.observe_request("range");
    let log = state.reader()?;

    let (earliest, latest) = log.range().await;
    if latest == NO_OFFSET {
        return Ok(StatusCode::NO_CONTENT.into_response());
    }

    Ok(Json(LogRange { earliest, latest }).into_response())
}

/// Handle `GET /api/v1/events/{id}`.
///
/// Returns the raw record bytes at the given offset.
pub async fn get_event(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    state.metrics.observe_request("event");

    let offset: Offset = id
        .parse()
        .map_err(|_| ApiError::BadRequest("invalid offset".to_string()))?;

    let log = state.reader()?;
    let record = log
        .read(&state.shutdown, offset)
        .await
        .map_err(ApiError::from_read)?;

    Ok((
        [(header::CONTENT_TYPE, "application/json")],
        record.data,
    )
        .into_response())
}

/// Handle `GET /api/v1/events`.
///
/// Returns the last page of records, or streams from an offset when
/// `watch=true`.
pub async fn get_events(
    State(state): State<AppState>,
    Query(params): Query<EventsParams>,
) -> Result<Response, ApiError> {
    state.metrics.observe_request("events");

    match params.watch_mode()? {
        WatchMode::Page => read_events(&state).await,
        WatchMode::Stream => stream_events(&state, &params).await,
    }
}

/// One-shot page of the most recent records as a JSON array of CloudEvents.
async fn read_events(state: &AppState) -> Result<Response, ApiError> {
    let log = state.reader()?;

    let (earliest, latest) = log.range().await;
    if latest == NO_OFFSET {
        return Ok(StatusCode::NO_CONTENT.into_response());
    }

    let start = page_start(earliest, latest, state.config.page_size);
    let mut events = Vec::new();
    for offset in start..=latest {
        let record = match log.read(&state.shutdown, offset).await {
            Ok(record) => record,
            // Purged while paging; the page just comes up short.
            Err(eventlog::Error::OutOfRange) => continue,
            Err(eventlog::Error::Cancelled) => return Err(ApiError::Cancelled),
            Err(err) => return Err(ApiError::Internal(err.to_string())),
        };

        let event: CloudEvent = serde_json::from_slice(&record.data)
            .map_err(|err| ApiError::Internal(format!("unmarshal event: {err}")))?;
        events.push(event);
    }

    Ok(Json(events).into_response())
}

/// Long-lived stream of newline-delimited records.
///
/// Every record becomes its own body chunk, so the client sees each line as
/// soon as it is written instead of when a buffer fills.
async fn stream_events(state: &AppState, params: &EventsParams) -> Result<Response, ApiError> {
    let log = state.reader()?;
    let stream_id = Uuid::new_v4();

    let (earliest, latest) = log.range().await;
    let start = match params.start_offset()? {
        Some(offset) => offset,
        None => {
            debug!(%stream_id, earliest, latest, "no start offset specified");
            latest + 1
        }
    };

    // Validate before the status line is committed; the cursor re-checks on
    // every step anyway.
    if start < earliest {
        return Err(ApiError::from_read(eventlog::Error::OutOfRange));
    }
    if start > latest + 1 {
        return Err(ApiError::Internal(eventlog::Error::FutureOffset.to_string()));
    }

    debug!(%stream_id, start, "starting stream");
    let cancel = state.shutdown.child_token();
    let mut cursor = log.stream(cancel, start);
    let guard = StreamGuard::new(state.metrics.active_streams.clone());
    let timeout = state.config.stream_timeout;

    let lines = async_stream::stream! {
        let _guard = guard;
        let deadline = tokio::time::sleep(timeout);
        tokio::pin!(deadline);

        loop {
            let next = tokio::select! {
                _ = &mut deadline => {
                    debug!(%stream_id, "stream write timeout");
                    break;
                }
                next = cursor.next() => next,
            };

            match next {
                Ok(Some(record)) => {
                    let mut line = Vec::with_capacity(record.data.len() + 1);
                    line.extend_from_slice(&record.data);
                    line.push(b'\n');
                    yield Ok::<Bytes, Infallible>(Bytes::from(line));
                }
                Ok(None) => break,
                Err(eventlog::Error::Cancelled) => break,
                Err(err) => {
                    // Status is already on the wire; all that is left is to
                    // end the stream.
                    warn!(%stream_id, error = %err, "stream terminated");
                    break;
                }
            }
        }
        debug!(%stream_id, "stream stopped");
    };

    Response::builder()
        .header(header::CONNECTION, "Keep-Alive")
        .header("X-Content-Type-Options", "nosniff")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from_stream(lines))
        .map_err(|err| ApiError::Internal(err.to_string()))
}

/// Handle `GET /metrics`.
pub async fn get_metrics(State(state): State<AppState>) -> String {
    state.metrics.encode()
}

/// Handle `GET /-/healthy`.
pub async fn get_healthy() -> StatusCode {
    StatusCode::OK
}

/// Handle `GET /-/ready`.
///
/// Ready means the log exists, i.e. at least one upstream event arrived.
pub async fn get_ready(State(state): State<AppState>) -> StatusCode {
    if state.log.get().is_some() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

/// First offset of the page ending at `latest`.
///
/// The full retained range when it fits the page, otherwise the last
/// `page_size` offsets including `latest`.
fn page_start(earliest: Offset, latest: Offset, page_size: usize) -> Offset {
    let mut start = earliest;
    if latest - earliest + 1 > page_size as Offset {
        start = latest - page_size as Offset + 1;
    }
    start
}

/// Holds the active-streams gauge up for the lifetime of one connection.
struct StreamGuard {
    gauge: Gauge,
}

impl StreamGuard {
    fn new(gauge: Gauge) -> Self {
        gauge.inc();
        Self { gauge }
    }
}

impl Drop for StreamGuard {
    fn drop(&mut self) {
        self.gauge.dec();
    }
}
