//! Tailing cursors over the log.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};
use crate::log::Shared;
use crate::model::{Offset, Record, NO_OFFSET};

/// A lazy cursor producing records at consecutive offsets.
///
/// The cursor holds only the next offset it wants plus a subscription to
/// write notifications; it re-resolves storage on every step. Truncation
/// overtaking a slow consumer is therefore detected at the next call instead
/// of leaving a dangling reference into dropped storage.
pub struct LogStream {
    shared: Arc<Shared>,
    cancel: CancellationToken,
    next_offset: Offset,
    finished: bool,
}

impl LogStream {
    pub(crate) fn new(shared: Arc<Shared>, cancel: CancellationToken, from: Offset) -> Self {
        Self {
            shared,
            cancel,
            next_offset: from,
            finished: false,
        }
    }

    /// Returns the next record, waiting for a write when the cursor has
    /// caught up with the log.
    ///
    /// Terminal outcomes end the cursor; later calls return `Ok(None)`:
    ///
    /// - `Err(Cancelled)` once the cancellation signal fires.
    /// - `Err(OutOfRange)` when the retention window has passed the cursor,
    ///   either at the start offset or mid-iteration.
    /// - `Err(FutureOffset)` when the cursor points past `latest + 1`.
    ///
    /// A cursor at exactly `latest + 1` blocks until the next write.
    pub async fn next(&mut self) -> Result<Option<Record>> {
        if self.finished {
            return Ok(None);
        }

        let shared = Arc::clone(&self.shared);
        loop {
            // Subscribe before inspecting state so a write racing the check
            // below still wakes the wait.
            let notified = shared.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.cancel.is_cancelled() {
                return self.finish(Error::Cancelled);
            }

            {
                let inner = shared.inner.read().await;
                let (earliest, latest) = inner.range(shared.config.start_offset);

                if self.next_offset < earliest {
                    return self.finish(Error::OutOfRange);
                }
                if latest != NO_OFFSET && self.next_offset <= latest {
                    match inner.get(self.next_offset) {
                        Some(data) => {
                            let record = Record {
                                offset: self.next_offset,
                                data,
                            };
                            self.next_offset += 1;
                            return Ok(Some(record));
                        }
                        None => {
                            return self.finish(Error::Internal(format!(
                                "record {} missing inside retained range",
                                self.next_offset
                            )));
                        }
                    }
                }
                if self.next_offset > latest + 1 {
                    return self.finish(Error::FutureOffset);
                }
            }

            let cancelled = self.cancel.cancelled();
            tokio::select! {
                _ = notified => {}
                _ = cancelled => return self.finish(Error::Cancelled),
            }
        }
    }

    fn finish(&mut self, err: Error) -> Result<Option<Record>> {
        self.finished = true;
        Err(err)
    }
}
