//! Configuration for constructing a log.

use crate::model::Offset;

/// Default number of records per segment.
pub const DEFAULT_MAX_SEGMENT_SIZE: usize = 1000;

/// Default maximum record payload size in bytes.
pub const DEFAULT_MAX_RECORD_SIZE: usize = 524_288;

/// Configuration for a [`Log`](crate::Log).
///
/// All fields are fixed at construction time; there is no way to change them
/// on a live log. Validation happens in [`Log::new`](crate::Log::new).
#[derive(Debug, Clone)]
pub struct Config {
    /// First offset the log will assign. Must not be negative.
    pub start_offset: Offset,

    /// Number of records per segment. The active segment accepts appends
    /// until it holds this many records, then a new one is allocated.
    pub max_segment_size: usize,

    /// Maximum payload size in bytes accepted by a single write.
    pub max_record_size: usize,

    /// Number of sealed segments retained behind the active one.
    ///
    /// Total retained records are `(1 + history_segments) * max_segment_size`;
    /// the default of one history segment keeps "current plus previous".
    pub history_segments: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            start_offset: 0,
            max_segment_size: DEFAULT_MAX_SEGMENT_SIZE,
            max_record_size: DEFAULT_MAX_RECORD_SIZE,
            history_segments: 1,
        }
    }
}

impl Config {
    /// Total number of records retained once the log has wrapped.
    pub fn retained_records(&self) -> usize {
        (1 + self.history_segments) * self.max_segment_size
    }
}
