//! Writer handle, read capability, and retention.

use std::collections::VecDeque;
use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::{Notify, RwLock};
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::model::{Offset, Record, NO_OFFSET};
use crate::segment::Segment;
use crate::stream::LogStream;

/// Mutable log state behind a single lock.
///
/// The front of the deque is the oldest retained segment, the back is the
/// active one. Offsets are contiguous across the deque; the list is never
/// empty.
pub(crate) struct LogInner {
    segments: VecDeque<Segment>,
    next_offset: Offset,
}

impl LogInner {
    /// Snapshot of `(earliest, latest)`; `(NO_OFFSET, NO_OFFSET)` iff the
    /// log has never been written to.
    pub(crate) fn range(&self, start_offset: Offset) -> (Offset, Offset) {
        if self.next_offset == start_offset {
            return (NO_OFFSET, NO_OFFSET);
        }
        let earliest = self
            .segments
            .front()
            .map(|s| s.start())
            .unwrap_or(NO_OFFSET);
        (earliest, self.next_offset - 1)
    }

    /// Looks up the payload at `offset` within the retained segments.
    pub(crate) fn get(&self, offset: Offset) -> Option<Bytes> {
        self.segments.iter().find_map(|s| s.get(offset))
    }
}

/// State shared between the writer, readers, and cursors.
pub(crate) struct Shared {
    pub(crate) config: Config,
    pub(crate) inner: RwLock<LogInner>,
    pub(crate) notify: Notify,
}

/// The writer handle of a bounded log.
///
/// `Log` is deliberately not `Clone`: a process holds exactly one writer and
/// hands everything else a [`LogReader`], which makes the single-writer
/// discipline structural. Dropping the `Log` does not invalidate readers;
/// they keep serving the retained window.
pub struct Log {
    shared: Arc<Shared>,
}

impl Log {
    /// Creates an empty log from the given configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] when `start_offset` is negative or
    /// either size limit is zero.
    pub fn new(config: Config) -> Result<Self> {
        if config.start_offset < 0 {
            return Err(Error::InvalidConfig(format!(
                "start offset must not be negative, got {}",
                config.start_offset
            )));
        }
        if config.max_segment_size == 0 {
            return Err(Error::InvalidConfig(
                "max segment size must be greater than zero".to_string(),
            ));
        }
        if config.max_record_size == 0 {
            return Err(Error::InvalidConfig(
                "max record size must be greater than zero".to_string(),
            ));
        }

        let mut segments = VecDeque::new();
        segments.push_back(Segment::new(config.start_offset, config.max_segment_size));

        let inner = LogInner {
            segments,
            next_offset: config.start_offset,
        };

        Ok(Self {
            shared: Arc::new(Shared {
                config,
                inner: RwLock::new(inner),
                notify: Notify::new(),
            }),
        })
    }

    /// Returns a read-only capability over this log.
    pub fn reader(&self) -> LogReader {
        LogReader {
            shared: self.shared.clone(),
        }
    }

    /// Appends `data` at the next unused offset and returns that offset.
    ///
    /// Writes are serialized; a reader that observes offset `k + 1` can also
    /// read `k` (until retention passes it). Every successful write wakes
    /// all blocked cursors.
    ///
    /// # Errors
    ///
    /// - [`Error::RecordTooLarge`] when `data` exceeds the configured
    ///   maximum record size.
    /// - [`Error::Cancelled`] when `cancel` fires before the record is
    ///   stored; the log is not mutated in that case.
    pub async fn write(&self, cancel: &CancellationToken, data: Bytes) -> Result<Offset> {
        let max = self.shared.config.max_record_size;
        if data.len() > max {
            return Err(Error::RecordTooLarge {
                size: data.len(),
                max,
            });
        }

        let mut inner = tokio::select! {
            guard = self.shared.inner.write() => guard,
            _ = cancel.cancelled() => return Err(Error::Cancelled),
        };

        let config = &self.shared.config;
        let roll = match inner.segments.back() {
            Some(active) => active.is_full(config.max_segment_size),
            None => true,
        };
        if roll {
            let start = inner.next_offset;
            inner
                .segments
                .push_back(Segment::new(start, config.max_segment_size));
            // Retention: keep only as many whole segments as the retained
            // record capacity allows.
            let max_segments = config.retained_records() / config.max_segment_size;
            while inner.segments.len() > max_segments {
                inner.segments.pop_front();
            }
        }

        let offset = match inner.segments.back_mut() {
            Some(active) => active.append(data),
            None => return Err(Error::Internal("segment list is empty".to_string())),
        };
        inner.next_offset = offset + 1;
        drop(inner);

        self.shared.notify.notify_waiters();
        Ok(offset)
    }

    /// Non-blocking snapshot of the retained offset range.
    ///
    /// See [`LogReader::range`].
    pub async fn range(&self) -> (Offset, Offset) {
        let inner = self.shared.inner.read().await;
        inner.range(self.shared.config.start_offset)
    }
}

/// Read-only capability over a [`Log`].
///
/// Cheap to clone and safe to share across tasks; it exposes point reads,
/// range snapshots, and tailing cursors, but no writer surface.
#[derive(Clone)]
pub struct LogReader {
    shared: Arc<Shared>,
}

impl LogReader {
    /// Returns the record at `offset`.
    ///
    /// # Errors
    ///
    /// - [`Error::OutOfRange`] when the offset has been truncated away or
    ///   precedes the log's start offset.
    /// - [`Error::FutureOffset`] when the offset has not been written yet,
    ///   including any offset at or past the start offset of an empty log.
    /// - [`Error::Cancelled`] when `cancel` fires first.
    pub async fn read(&self, cancel: &CancellationToken, offset: Offset) -> Result<Record> {
        let inner = tokio::select! {
            guard = self.shared.inner.read() => guard,
            _ = cancel.cancelled() => return Err(Error::Cancelled),
        };

        let start_offset = self.shared.config.start_offset;
        let (earliest, latest) = inner.range(start_offset);

        if latest == NO_OFFSET {
            if offset < start_offset {
                return Err(Error::OutOfRange);
            }
            return Err(Error::FutureOffset);
        }
        if offset < earliest {
            return Err(Error::OutOfRange);
        }
        if offset > latest {
            return Err(Error::FutureOffset);
        }

        match inner.get(offset) {
            Some(data) => Ok(Record { offset, data }),
            // Unreachable while offsets stay contiguous within the range.
            None => Err(Error::Internal(format!(
                "record {offset} missing inside retained range"
            ))),
        }
    }

    /// Non-blocking snapshot of `(earliest, latest)`.
    ///
    /// Returns `(NO_OFFSET, NO_OFFSET)` iff the log has never been written
    /// to. The pair is consistent: both values come from the same locked
    /// observation.
    pub async fn range(&self) -> (Offset, Offset) {
        let inner = self.shared.inner.read().await;
        inner.range(self.shared.config.start_offset)
    }

    /// Opens a tailing cursor producing records at `from, from + 1, …`.
    ///
    /// `from == latest + 1` is the canonical "tail from now" start and is
    /// valid even on an empty log. See [`LogStream::next`] for termination
    /// semantics.
    pub fn stream(&self, cancel: CancellationToken, from: Offset) -> LogStream {
        LogStream::new(self.shared.clone(), cancel, from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(start: Offset, segment_size: usize) -> Config {
        Config {
            start_offset: start,
            max_segment_size: segment_size,
            ..Config::default()
        }
    }

    /// Writes `n` records whose payload is the decimal write index,
    /// mirroring how the service tests seed data.
    async fn write_indexed(log: &Log, n: usize) {
        let cancel = CancellationToken::new();
        for i in 0..n {
            log.write(&cancel, Bytes::from(i.to_string()))
                .await
                .unwrap();
        }
    }

    #[test]
    fn should_reject_negative_start_offset() {
        // given
        let config = config(-1, 10);

        // when
        let result = Log::new(config);

        // then
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn should_reject_zero_segment_size() {
        let result = Log::new(config(0, 0));
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn should_reject_zero_record_size() {
        let result = Log::new(Config {
            max_record_size: 0,
            ..Config::default()
        });
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn should_report_empty_range_before_first_write() {
        // given
        let log = Log::new(config(10, 5)).unwrap();

        // when
        let (earliest, latest) = log.reader().range().await;

        // then
        assert_eq!((earliest, latest), (NO_OFFSET, NO_OFFSET));
    }

    #[tokio::test]
    async fn should_assign_contiguous_offsets_from_start() {
        // given
        let log = Log::new(config(10, 5)).unwrap();
        let cancel = CancellationToken::new();

        // when
        let first = log.write(&cancel, Bytes::from("a")).await.unwrap();
        let second = log.write(&cancel, Bytes::from("b")).await.unwrap();
        let third = log.write(&cancel, Bytes::from("c")).await.unwrap();

        // then
        assert_eq!((first, second, third), (10, 11, 12));
        assert_eq!(log.reader().range().await, (10, 12));
    }

    #[tokio::test]
    async fn should_roundtrip_record_data() {
        // given
        let log = Log::new(config(0, 10)).unwrap();
        let cancel = CancellationToken::new();
        let payload = Bytes::from(vec![0u8, 1, 2, 254, 255]);

        // when
        let offset = log.write(&cancel, payload.clone()).await.unwrap();
        let record = log.reader().read(&cancel, offset).await.unwrap();

        // then
        assert_eq!(record.offset, offset);
        assert_eq!(record.data, payload);
    }

    #[tokio::test]
    async fn should_enforce_max_record_size() {
        // given
        let log = Log::new(Config {
            max_record_size: 4,
            ..Config::default()
        })
        .unwrap();
        let cancel = CancellationToken::new();

        // when
        let result = log.write(&cancel, Bytes::from("too large")).await;

        // then
        assert_eq!(
            result,
            Err(Error::RecordTooLarge { size: 9, max: 4 })
        );
        assert_eq!(log.reader().range().await, (NO_OFFSET, NO_OFFSET));
    }

    #[tokio::test]
    async fn should_return_cancelled_without_mutating_on_cancelled_write() {
        // given
        let log = Log::new(config(0, 10)).unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();

        // when
        let result = log.write(&cancel, Bytes::from("a")).await;

        // then
        assert_eq!(result, Err(Error::Cancelled));
        assert_eq!(log.reader().range().await, (NO_OFFSET, NO_OFFSET));
    }

    #[tokio::test]
    async fn should_return_cancelled_on_cancelled_read() {
        // given
        let log = Log::new(config(0, 10)).unwrap();
        write_indexed(&log, 3).await;
        let cancel = CancellationToken::new();
        cancel.cancel();

        // when
        let result = log.reader().read(&cancel, 0).await;

        // then
        assert_eq!(result, Err(Error::Cancelled));
    }

    #[tokio::test]
    async fn should_truncate_oldest_segment_when_capacity_exceeded() {
        // given - retention is two segments of five records
        let log = Log::new(config(0, 5)).unwrap();

        // when
        write_indexed(&log, 20).await;

        // then
        assert_eq!(log.reader().range().await, (10, 19));
    }

    #[tokio::test]
    async fn should_retain_at_most_the_configured_capacity() {
        // given
        let config = config(0, 5);
        let capacity = config.retained_records() as Offset;
        let log = Log::new(config).unwrap();

        // when - writes end exactly on a segment boundary
        write_indexed(&log, 35).await;

        // then - the retained window is the full capacity
        let (earliest, latest) = log.reader().range().await;
        assert_eq!(latest, 34);
        assert_eq!(latest - earliest + 1, capacity);
    }

    #[tokio::test]
    async fn should_keep_range_full_width_under_continuous_writes() {
        // given
        let log = Log::new(config(0, 5)).unwrap();

        // when - one record past a segment boundary
        write_indexed(&log, 16).await;

        // then - segments [10..15) and [15..16) are retained
        let (earliest, latest) = log.reader().range().await;
        assert_eq!(latest, 15);
        assert_eq!(earliest, 10);
    }

    #[tokio::test]
    async fn should_fail_truncated_reads_with_out_of_range() {
        // given
        let log = Log::new(config(0, 5)).unwrap();
        write_indexed(&log, 20).await;
        let cancel = CancellationToken::new();
        let reader = log.reader();

        // then - purged offsets stay unreadable, retained ones serve
        assert_eq!(reader.read(&cancel, 3).await, Err(Error::OutOfRange));
        assert_eq!(reader.read(&cancel, 9).await, Err(Error::OutOfRange));
        let record = reader.read(&cancel, 11).await.unwrap();
        assert_eq!(record.data, Bytes::from("11"));
    }

    #[tokio::test]
    async fn should_fail_unwritten_reads_with_future_offset() {
        // given
        let log = Log::new(config(0, 10)).unwrap();
        write_indexed(&log, 3).await;
        let cancel = CancellationToken::new();

        // when
        let result = log.reader().read(&cancel, 7).await;

        // then
        assert_eq!(result, Err(Error::FutureOffset));
    }

    #[tokio::test]
    async fn should_fail_reads_on_empty_log() {
        // given
        let log = Log::new(config(10, 5)).unwrap();
        let cancel = CancellationToken::new();
        let reader = log.reader();

        // then - below the start offset is gone forever, at or past it is
        // merely not written yet
        assert_eq!(reader.read(&cancel, 3).await, Err(Error::OutOfRange));
        assert_eq!(reader.read(&cancel, 10).await, Err(Error::FutureOffset));
        assert_eq!(reader.read(&cancel, 17).await, Err(Error::FutureOffset));
    }

    #[tokio::test]
    async fn should_keep_out_of_range_monotonic() {
        // given
        let log = Log::new(config(0, 5)).unwrap();
        let cancel = CancellationToken::new();
        let reader = log.reader();
        write_indexed(&log, 10).await;

        // when - offset 0 is still retained, then truncation passes it
        assert!(reader.read(&cancel, 0).await.is_ok());
        write_indexed(&log, 10).await;

        // then
        assert_eq!(reader.read(&cancel, 0).await, Err(Error::OutOfRange));
    }

    #[tokio::test]
    async fn should_serve_concurrent_readers_during_writes() {
        // given
        let log = Log::new(config(0, 100)).unwrap();
        let reader = log.reader();
        let cancel = CancellationToken::new();

        // when - a reader races the writer
        let read_task = tokio::spawn({
            let reader = reader.clone();
            let cancel = cancel.clone();
            async move {
                loop {
                    let (_, latest) = reader.range().await;
                    if latest >= 49 {
                        return reader.read(&cancel, 49).await;
                    }
                    tokio::task::yield_now().await;
                }
            }
        });
        write_indexed(&log, 50).await;

        // then
        let record = read_task.await.unwrap().unwrap();
        assert_eq!(record.data, Bytes::from("49"));
    }
}
