//! The ingestor: the log's single writer.
//!
//! A dedicated task polls the upstream source on a fixed cadence and appends
//! every event to the log in receipt order. The log itself is created
//! lazily, on the very first event, so the upstream event key can seed the
//! offset space. Until then the shared reader slot stays empty and the HTTP
//! layer reports the service as unavailable.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use bytes::Bytes;
use thiserror::Error;
use tokio::time::interval;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use eventlog::{Log, LogReader, Offset};

use crate::config::{CliArgs, MAX_BATCH, POLL_INTERVAL};
use crate::event::CloudEvent;
use crate::server::metrics::Metrics;
use crate::vsphere::{EventSource, SourceError};

/// Slot the ingestor publishes the read capability into, exactly once.
pub type SharedReader = Arc<OnceLock<LogReader>>;

/// Errors that terminate the ingestor.
///
/// Any of these (other than a cancelled write) is fatal to the service: a
/// writer that cannot keep the log moving has nothing to serve.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("read events: {0}")]
    Source(#[from] SourceError),

    #[error("write to log: {0}")]
    Log(#[from] eventlog::Error),

    #[error("encode event: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Polls the upstream source and appends to the log.
pub struct Ingestor<S> {
    source: S,
    reader_slot: SharedReader,
    metrics: Arc<Metrics>,
    log: Option<Log>,
    args: CliArgs,
    poll_interval: Duration,
    max_batch: usize,
}

impl<S: EventSource> Ingestor<S> {
    pub fn new(source: S, reader_slot: SharedReader, metrics: Arc<Metrics>, args: CliArgs) -> Self {
        Self {
            source,
            reader_slot,
            metrics,
            log: None,
            args,
            poll_interval: POLL_INTERVAL,
            max_batch: MAX_BATCH,
        }
    }

    /// Overrides the polling cadence.
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Runs until `cancel` fires or a fatal error occurs.
    pub async fn run(mut self, cancel: CancellationToken) -> Result<(), IngestError> {
        info!(
            poll_interval = ?self.poll_interval,
            max_batch = self.max_batch,
            "starting event collector"
        );

        let mut ticker = interval(self.poll_interval);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("event collector stopping");
                    return Ok(());
                }
                _ = ticker.tick() => {
                    match self.poll_once(&cancel).await {
                        Ok(()) => {}
                        Err(IngestError::Log(eventlog::Error::Cancelled)) => return Ok(()),
                        Err(err) => return Err(err),
                    }
                }
            }
        }
    }

    /// Fetches one batch and appends each event in receipt order.
    async fn poll_once(&mut self, cancel: &CancellationToken) -> Result<(), IngestError> {
        let events = self.source.next_events(self.max_batch).await?;

        for event in events {
            let envelope = CloudEvent::from_vsphere(self.source.endpoint(), &event)?;
            let data = serde_json::to_vec(&envelope)?;
            let bytes = data.len();

            let log = self.ensure_log(event.key)?;
            let offset = log.write(cancel, Bytes::from(data)).await?;

            self.metrics.ingest_events_total.inc();
            self.metrics.ingest_bytes_total.inc_by(bytes as u64);
            debug!(offset, bytes, event_type = %event.event_type, "wrote event to log");
        }
        Ok(())
    }

    /// Initializes the log from the first observed event key.
    ///
    /// Happens at most once per process; later events never re-initialize.
    fn ensure_log(&mut self, first_key: i32) -> Result<&Log, IngestError> {
        if self.log.is_none() {
            let config = self.args.to_log_config(Offset::from(first_key));
            info!(
                start_offset = first_key,
                max_segment_size = config.max_segment_size,
                max_record_size = config.max_record_size,
                "initializing log"
            );
            let log = Log::new(config)?;
            let _ = self.reader_slot.set(log.reader());
            self.log = Some(log);
        }

        self.log.as_ref().ok_or_else(|| {
            IngestError::Log(eventlog::Error::Internal(
                "log initialization did not take effect".to_string(),
            ))
        })
    }
}
