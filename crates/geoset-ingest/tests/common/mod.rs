//! Shared helpers for geoset-ingest integration tests

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use geoset_common::RawRecord;
use geoset_ingest::source::{RecordStream, SourceAdapter, SourceError};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Initialize tracing for tests
pub fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let _ = fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,geoset_ingest=debug")),
        )
        .with_test_writer()
        .try_init();
}

/// Raw records named `r0`, `r1`, ... with the index as longitude
pub fn numbered(count: usize) -> Vec<RawRecord> {
    (0..count)
        .map(|i| RawRecord::new(format!("r{i}"), "generated", i as f64, 0.0, 0.0))
        .collect()
}

/// Adapter over a fixed list of records
pub struct VecSource {
    pub name: String,
    pub records: Vec<RawRecord>,
    pub capacity: usize,
}

impl VecSource {
    pub fn new(name: &str, records: Vec<RawRecord>) -> Self {
        Self {
            name: name.to_string(),
            records,
            capacity: 4,
        }
    }
}

impl SourceAdapter for VecSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn read_all(self: Box<Self>, cancel: CancellationToken) -> Result<RecordStream, SourceError> {
        if cancel.is_cancelled() {
            return Err(SourceError::Cancelled(self.name));
        }

        let (tx, rx) = mpsc::channel(self.capacity);
        let producer = tokio::spawn(async move {
            let mut sent = 0;
            for raw in self.records {
                let delivered = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => false,
                    result = tx.send(raw) => result.is_ok(),
                };
                if !delivered {
                    break;
                }
                sent += 1;
            }
            sent
        });

        Ok(RecordStream::new(rx, producer))
    }
}

/// Stream that yields `count` records and then stays open until cancelled
pub fn stalled_stream(count: usize, cancel: CancellationToken) -> RecordStream {
    let (tx, rx) = mpsc::channel(count.max(1));
    let producer = tokio::spawn(async move {
        let mut sent = 0;
        for raw in numbered(count) {
            if tx.send(raw).await.is_err() {
                return sent;
            }
            sent += 1;
        }
        cancel.cancelled().await;
        sent
    });
    RecordStream::new(rx, producer)
}

/// Write `contents` to `dir/name`
pub fn write_fixture(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).expect("write fixture");
    path
}

/// Placemark sheet with `rows` data rows
pub fn placemark_sheet(rows: usize) -> String {
    let mut sheet = String::from("Name;Description;Lon;Lat;Height\n");
    for i in 0..rows {
        sheet.push_str(&format!("Site {i};row {i};{}.5;{}.25;{i}\n", i % 180, i % 90));
    }
    sheet
}
