//! Delimited text file adapter driven by a [`DatasetFormat`]

use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

use csv::{ByteRecord, ReaderBuilder, StringRecord};
use geoset_common::RawRecord;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::format::DatasetFormat;
use super::stream::RecordStream;
use super::{SourceAdapter, SourceError};

/// Records buffered between the parsing unit and its consumer
pub const DEFAULT_SOURCE_CAPACITY: usize = 100;

/// One pass over a `;`-delimited dataset file
#[derive(Debug)]
pub struct CsvSource {
    path: PathBuf,
    file_name: String,
    format: &'static DatasetFormat,
    capacity: usize,
}

impl CsvSource {
    /// Check that `path` is a readable regular file and bind it to `format`
    pub fn open(path: impl AsRef<Path>, format: &'static DatasetFormat) -> Result<Self, SourceError> {
        let path = path.as_ref().to_path_buf();

        let metadata = std::fs::metadata(&path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => SourceError::NotFound(path.clone()),
            _ => SourceError::Io {
                path: path.clone(),
                source: e,
            },
        })?;

        if !metadata.is_file() {
            return Err(SourceError::NotAFile(path));
        }

        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        Ok(Self {
            path,
            file_name,
            format,
            capacity: DEFAULT_SOURCE_CAPACITY,
        })
    }

    /// Override the relay capacity (minimum 1)
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    pub fn format(&self) -> &'static DatasetFormat {
        self.format
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SourceAdapter for CsvSource {
    fn name(&self) -> &str {
        &self.file_name
    }

    fn read_all(self: Box<Self>, cancel: CancellationToken) -> Result<RecordStream, SourceError> {
        if cancel.is_cancelled() {
            return Err(SourceError::Cancelled(self.file_name));
        }

        let runtime = Handle::try_current().map_err(|e| SourceError::Io {
            path: self.path.clone(),
            source: io::Error::other(e),
        })?;

        let (tx, rx) = mpsc::channel(self.capacity);
        let producer = runtime.spawn_blocking(move || produce(*self, tx, cancel));

        Ok(RecordStream::new(rx, producer))
    }
}

/// Parsing unit: owns the file handle for the whole pass
fn produce(source: CsvSource, tx: mpsc::Sender<RawRecord>, cancel: CancellationToken) -> u64 {
    let CsvSource {
        path,
        file_name,
        format,
        ..
    } = source;

    let file = match File::open(&path) {
        Ok(file) => file,
        Err(e) => {
            error!(file = %file_name, error = %e, "Failed to open source file");
            return 0;
        },
    };

    info!(file = %file_name, format = format.id, "Reading source file");

    let mut reader = ReaderBuilder::new()
        .delimiter(format.delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(BufReader::new(file));

    let mut record = ByteRecord::new();
    let mut sent = 0u64;
    let mut skipped = 0u64;

    loop {
        if cancel.is_cancelled() {
            debug!(file = %file_name, sent, "Cancelled while reading");
            break;
        }

        match reader.read_byte_record(&mut record) {
            Ok(true) => {},
            Ok(false) => break,
            Err(e) if e.is_io_error() => {
                error!(file = %file_name, error = %e, "I/O error while reading, stopping");
                break;
            },
            Err(e) => {
                let line = e.position().map(|p| p.line()).unwrap_or(0);
                warn!(file = %file_name, line, error = %e, "Skipping malformed row");
                skipped += 1;
                continue;
            },
        }

        let line = record.position().map(|p| p.line()).unwrap_or(0);
        let row = decode_row(&record, &file_name, line);
        let Some(raw) = format.parse_row(&row, &file_name, line) else {
            skipped += 1;
            continue;
        };

        if !deliver(&tx, raw, &cancel) {
            debug!(file = %file_name, sent, "Relay closed or cancelled, stopping");
            break;
        }
        sent += 1;
    }

    info!(file = %file_name, sent, skipped, "Finished reading source file");
    sent
}

/// Decode a raw row, replacing invalid UTF-8 sequences instead of dropping the row
fn decode_row(record: &ByteRecord, file_name: &str, line: u64) -> StringRecord {
    if let Some(column) = record.iter().position(|field| std::str::from_utf8(field).is_err()) {
        warn!(file = %file_name, line, column, "Row is not valid UTF-8, replacing invalid bytes");
    }
    StringRecord::from_byte_record_lossy(record.clone())
}

/// Send one record, giving up as soon as the token is cancelled
///
/// Runs on the blocking pool, so the send is driven by a local executor.
fn deliver(tx: &mpsc::Sender<RawRecord>, raw: RawRecord, cancel: &CancellationToken) -> bool {
    futures::executor::block_on(async {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => false,
            result = tx.send(raw) => result.is_ok(),
        }
    })
}
