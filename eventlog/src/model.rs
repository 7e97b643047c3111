//! Core data types for the event log.

use bytes::Bytes;

/// Position of a record in the log.
///
/// Offsets are signed 64-bit integers assigned densely by successive writes,
/// starting at the log's configured start offset. The sentinel [`NO_OFFSET`]
/// marks the absence of an offset: an empty log reports
/// `(NO_OFFSET, NO_OFFSET)` as its range.
pub type Offset = i64;

/// Sentinel value denoting "no such offset".
pub const NO_OFFSET: Offset = -1;

/// A record stored in the log.
///
/// The payload is opaque to the log; callers encode and decode it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// The offset assigned to this record at write time.
    pub offset: Offset,

    /// The record payload.
    pub data: Bytes,
}
