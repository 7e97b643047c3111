//! Service configuration from CLI flags and environment variables.

use std::time::Duration;

use clap::Parser;

use eventlog::{Offset, DEFAULT_MAX_RECORD_SIZE, DEFAULT_MAX_SEGMENT_SIZE};

/// How often the ingestor polls the upstream event source.
pub const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Maximum number of upstream events fetched per poll.
pub const MAX_BATCH: usize = 50;

/// Number of records returned by the paged events endpoint.
pub const PAGE_SIZE: usize = 50;

/// Forces a streaming connection to disconnect after this time.
pub const STREAM_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// Grace period for in-flight connections during shutdown.
pub const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// CLI arguments, each overridable through the environment.
#[derive(Parser, Debug, Clone)]
#[command(name = "eventstream")]
#[command(about = "Serves recent vSphere events over HTTP, paged or streamed")]
pub struct CliArgs {
    /// Maximum record payload size in bytes
    #[arg(long, env = "LOG_MAX_RECORD_SIZE_BYTES", default_value_t = DEFAULT_MAX_RECORD_SIZE)]
    pub max_record_size: usize,

    /// Records per log segment; retention is twice this value
    #[arg(long, env = "LOG_MAX_SEGMENT_SIZE", default_value_t = DEFAULT_MAX_SEGMENT_SIZE)]
    pub max_segment_size: usize,

    /// How far into the past event polling begins (e.g. "10m", "1h")
    #[arg(long, env = "VCENTER_STREAM_BEGIN", default_value = "10m", value_parser = humantime::parse_duration)]
    pub stream_begin: Duration,

    /// HTTP listen port
    #[arg(long, env = "PORT", default_value_t = 8080)]
    pub port: u16,

    /// Verbose logging
    #[arg(long, env = "DEBUG")]
    pub debug: bool,
}

impl CliArgs {
    /// Builds the log configuration for a log rooted at `start_offset`.
    pub fn to_log_config(&self, start_offset: Offset) -> eventlog::Config {
        eventlog::Config {
            start_offset,
            max_segment_size: self.max_segment_size,
            max_record_size: self.max_record_size,
            ..eventlog::Config::default()
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub page_size: usize,
    pub stream_timeout: Duration,
    pub shutdown_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            page_size: PAGE_SIZE,
            stream_timeout: STREAM_TIMEOUT,
            shutdown_timeout: SHUTDOWN_TIMEOUT,
        }
    }
}
