//! Fixed-capacity record segments.

use bytes::Bytes;

use crate::model::Offset;

/// A contiguous run of records starting at a fixed offset.
///
/// Segments are append-only. Truncation drops whole segments, which keeps
/// the log's earliest offset on a segment boundary and advances it by
/// exactly one segment's worth of records at a time.
#[derive(Debug)]
pub(crate) struct Segment {
    start: Offset,
    records: Vec<Bytes>,
}

impl Segment {
    /// Creates an empty segment whose first record will land at `start`.
    pub(crate) fn new(start: Offset, capacity: usize) -> Self {
        Self {
            start,
            records: Vec::with_capacity(capacity),
        }
    }

    /// First offset covered by this segment.
    pub(crate) fn start(&self) -> Offset {
        self.start
    }

    /// Whether the segment has reached `max` records.
    pub(crate) fn is_full(&self, max: usize) -> bool {
        self.records.len() >= max
    }

    /// Appends a payload and returns the offset it was stored at.
    pub(crate) fn append(&mut self, data: Bytes) -> Offset {
        let offset = self.start + self.records.len() as Offset;
        self.records.push(data);
        offset
    }

    /// Returns the payload at `offset`, if it lies within this segment.
    pub(crate) fn get(&self, offset: Offset) -> Option<Bytes> {
        if offset < self.start {
            return None;
        }
        self.records.get((offset - self.start) as usize).cloned()
    }
}
