//! Error types for the event log.

use thiserror::Error;

/// Convenience alias for log results.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by log operations.
///
/// [`OutOfRange`](Error::OutOfRange) and [`FutureOffset`](Error::FutureOffset)
/// are deliberately distinct kinds even where callers map them to the same
/// response: the first marks an offset the retention window has passed (or
/// one that precedes the log's beginning), the second an offset that has not
/// been written yet.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// The offset is below the earliest retained record.
    #[error("offset out of range")]
    OutOfRange,

    /// The offset has not been written yet.
    #[error("future offset")]
    FutureOffset,

    /// The payload exceeds the configured maximum record size.
    #[error("record data too large: {size} bytes exceeds maximum {max}")]
    RecordTooLarge {
        /// Size of the rejected payload.
        size: usize,
        /// Configured maximum payload size.
        max: usize,
    },

    /// The operation's cancellation signal fired before it completed.
    #[error("operation cancelled")]
    Cancelled,

    /// The configuration passed to [`Log::new`](crate::Log::new) is invalid.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// An unexpected internal failure.
    #[error("internal error: {0}")]
    Internal(String),
}
