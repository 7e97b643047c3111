//! Bounded, offset-addressed, in-memory event log.
//!
//! The log stores opaque byte records at dense, monotonically increasing
//! offsets and retains a rolling window of recent history. One task writes,
//! any number of tasks read; readers can snapshot the current range, fetch a
//! single record, or tail the log with a cursor that blocks until the next
//! write.
//!
//! # Key Concepts
//!
//! - **[`Log`]**: the writer handle. It is not `Clone`; a process holds
//!   exactly one, which makes the single-writer discipline structural rather
//!   than a locking convention.
//! - **[`LogReader`]**: the read-only capability, cheap to clone and share
//!   with any number of concurrent readers.
//! - **Offsets**: assigned contiguously starting at the configured start
//!   offset. Once the retention window passes an offset, reads of it fail
//!   with [`Error::OutOfRange`] forever; records are never silently
//!   replaced.
//! - **[`LogStream`]**: a tailing cursor. It resumes from a caller-supplied
//!   offset, blocks when it has caught up, and terminates when cancelled or
//!   when truncation overtakes it.
//!
//! # Example
//!
//! ```ignore
//! use bytes::Bytes;
//! use eventlog::{Config, Log};
//! use tokio_util::sync::CancellationToken;
//!
//! let log = Log::new(Config::default())?;
//! let reader = log.reader();
//! let cancel = CancellationToken::new();
//!
//! let offset = log.write(&cancel, Bytes::from("payload")).await?;
//! let record = reader.read(&cancel, offset).await?;
//! assert_eq!(record.data, Bytes::from("payload"));
//! ```

mod config;
mod error;
mod log;
mod model;
mod segment;
mod stream;

pub use config::{Config, DEFAULT_MAX_RECORD_SIZE, DEFAULT_MAX_SEGMENT_SIZE};
pub use error::{Error, Result};
pub use log::{Log, LogReader};
pub use model::{Offset, Record, NO_OFFSET};
pub use stream::LogStream;
