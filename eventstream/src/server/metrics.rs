//! Prometheus metrics for the service.

use prometheus_client::encoding::EncodeLabelSet;
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::gauge::Gauge;
use prometheus_client::registry::Registry;

/// Labels for per-endpoint HTTP request counters.
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct EndpointLabels {
    pub endpoint: String,
}

/// Container for all Prometheus metrics.
pub struct Metrics {
    registry: Registry,

    /// Counter of upstream events appended to the log.
    pub ingest_events_total: Counter,

    /// Counter of payload bytes appended to the log.
    pub ingest_bytes_total: Counter,

    /// Counter of HTTP requests by endpoint.
    pub http_requests_total: Family<EndpointLabels, Counter>,

    /// Gauge of currently open streaming connections.
    pub active_streams: Gauge,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    /// Create a new metrics registry with all metrics registered.
    pub fn new() -> Self {
        let mut registry = Registry::default();

        // Counter names are registered without the _total suffix; the
        // encoder appends it.
        let ingest_events_total = Counter::default();
        registry.register(
            "ingest_events",
            "Total number of upstream events appended to the log",
            ingest_events_total.clone(),
        );

        let ingest_bytes_total = Counter::default();
        registry.register(
            "ingest_bytes",
            "Total number of payload bytes appended to the log",
            ingest_bytes_total.clone(),
        );

        let http_requests_total = Family::<EndpointLabels, Counter>::default();
        registry.register(
            "http_requests",
            "Total number of HTTP requests",
            http_requests_total.clone(),
        );

        let active_streams = Gauge::default();
        registry.register(
            "active_streams",
            "Number of currently open streaming connections",
            active_streams.clone(),
        );

        Self {
            registry,
            ingest_events_total,
            ingest_bytes_total,
            http_requests_total,
            active_streams,
        }
    }

    /// Marks one request against the given endpoint.
    pub fn observe_request(&self, endpoint: &str) {
        self.http_requests_total
            .get_or_create(&EndpointLabels {
                endpoint: endpoint.to_string(),
            })
            .inc();
    }

    /// Encode all metrics to Prometheus text format.
    pub fn encode(&self) -> String {
        let mut buffer = String::new();
        prometheus_client::encoding::text::encode(&mut buffer, &self.registry)
            .expect("encoding metrics should not fail");
        buffer
    }
}
