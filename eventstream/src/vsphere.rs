//! Upstream vSphere event source boundary.
//!
//! The service consumes upstream events exclusively through the
//! [`EventSource`] trait. A production deployment plugs the SOAP event
//! collector in here; the built-in [`SimulatorSource`] stands in for it
//! during tests and local runs, the same seam the upstream's own simulator
//! occupies.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Classification of an upstream event type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventClass {
    Event,
    EventEx,
    ExtendedEvent,
}

/// A normalized vSphere infrastructure event.
///
/// `key` is the event manager's monotonically increasing identifier; the
/// first observed key seeds the log's offset space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VsphereEvent {
    pub key: i32,
    pub chain_id: i32,
    pub created_time: DateTime<Utc>,
    /// Concrete upstream type name, e.g. `VmPoweredOnEvent`.
    pub event_type: String,
    pub class: EventClass,
    pub full_formatted_message: String,
}

/// Errors surfaced by an event source.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("connect to event source: {0}")]
    Connect(String),

    #[error("read events: {0}")]
    Read(String),
}

/// A pull-based source of upstream events.
///
/// Implementations keep their own read position: each call returns events
/// newer than the previous batch, oldest first. An empty vector means no new
/// events are available yet.
#[async_trait]
pub trait EventSource: Send {
    /// Fetches up to `max` new events.
    async fn next_events(&mut self, max: usize) -> Result<Vec<VsphereEvent>, SourceError>;

    /// Identifier of the upstream endpoint, used as the event source URI.
    fn endpoint(&self) -> &str;
}

const SIMULATED_TYPES: &[&str] = &[
    "UserLoginSessionEvent",
    "VmStartingEvent",
    "VmPoweredOnEvent",
    "VmStoppingEvent",
    "VmPoweredOffEvent",
];

/// Deterministic in-process event source.
///
/// Emits synthetic events with contiguous keys, cycling through a handful of
/// common event types. Unbounded by default; [`with_limit`] caps the total
/// for tests that need the source to run dry, and [`with_stream_begin`]
/// backdates the first events the way a history collector replays the past.
///
/// [`with_limit`]: SimulatorSource::with_limit
/// [`with_stream_begin`]: SimulatorSource::with_stream_begin
pub struct SimulatorSource {
    endpoint: String,
    next_key: i32,
    next_time: DateTime<Utc>,
    remaining: Option<usize>,
    burst: usize,
}

impl SimulatorSource {
    /// Creates an unbounded source whose first event carries `first_key`.
    pub fn new(first_key: i32) -> Self {
        Self {
            endpoint: "https://vcsim.local/sdk".to_string(),
            next_key: first_key,
            next_time: Utc::now(),
            remaining: None,
            burst: 5,
        }
    }

    /// Creates a source that stops after `total` events.
    pub fn with_limit(first_key: i32, total: usize) -> Self {
        Self {
            remaining: Some(total),
            ..Self::new(first_key)
        }
    }

    /// Overrides how many events a single poll returns at most.
    pub fn with_burst(mut self, burst: usize) -> Self {
        self.burst = burst;
        self
    }

    /// Starts the event history `begin` in the past.
    ///
    /// Emitted timestamps advance one second per event from that point until
    /// they catch up with the wall clock, then track it.
    pub fn with_stream_begin(mut self, begin: Duration) -> Self {
        self.next_time = Utc::now() - begin;
        self
    }

    fn make_event(&mut self) -> VsphereEvent {
        let key = self.next_key;
        self.next_key += 1;
        let event_type = SIMULATED_TYPES[key.rem_euclid(SIMULATED_TYPES.len() as i32) as usize];

        let now = Utc::now();
        let created_time = if self.next_time < now {
            let backdated = self.next_time;
            self.next_time = self.next_time + chrono::Duration::seconds(1);
            backdated
        } else {
            now
        };

        VsphereEvent {
            key,
            chain_id: key,
            created_time,
            event_type: event_type.to_string(),
            class: EventClass::Event,
            full_formatted_message: format!("{event_type} (key {key}) on vcsim"),
        }
    }
}

#[async_trait]
impl EventSource for SimulatorSource {
    async fn next_events(&mut self, max: usize) -> Result<Vec<VsphereEvent>, SourceError> {
        let mut count = self.burst.min(max);
        if let Some(remaining) = self.remaining {
            count = count.min(remaining);
        }

        let events = (0..count).map(|_| self.make_event()).collect();
        if let Some(remaining) = self.remaining.as_mut() {
            *remaining -= count;
        }
        Ok(events)
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }
}
