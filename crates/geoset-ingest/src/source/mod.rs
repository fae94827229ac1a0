//! Source adapters
//!
//! A source adapter turns one dataset file into a lazy, single-pass sequence
//! of [`RawRecord`](geoset_common::RawRecord)s. Parsing runs on its own unit of
//! concurrency and feeds a bounded relay; the caller consumes the relay through
//! a [`RecordStream`].
//!
//! Construction is the only fallible step visible to callers. Row-level
//! problems are logged and either defaulted or skipped, never surfaced.

pub mod csv_source;
pub mod format;
pub mod formats;
pub mod stream;

use std::path::PathBuf;

use thiserror::Error;
use tokio_util::sync::CancellationToken;

pub use csv_source::{CsvSource, DEFAULT_SOURCE_CAPACITY};
pub use format::DatasetFormat;
pub use stream::RecordStream;

/// Errors raised while constructing or starting a source
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Source file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Not a regular file: {}", .0.display())]
    NotAFile(PathBuf),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Source {0} cancelled before reading started")]
    Cancelled(String),

    #[error("No source registered for file name: {0}")]
    Unsupported(String),
}

/// Capability shared by every dataset format: produce records from a file
///
/// `read_all` consumes the adapter, so a source is read at most once. Build a
/// new adapter to read the same file again.
pub trait SourceAdapter: Send {
    /// File name used in logs and reports
    fn name(&self) -> &str;

    /// Start reading
    ///
    /// Fails with [`SourceError::Cancelled`] when `cancel` is already
    /// triggered. Once started, the producer stops promptly on cancellation
    /// and never blocks on a full relay after it.
    fn read_all(self: Box<Self>, cancel: CancellationToken) -> Result<RecordStream, SourceError>;
}
