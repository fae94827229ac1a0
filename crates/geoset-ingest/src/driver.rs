//! Batch accumulation and flushing for one source file
//!
//! The driver drains a [`RecordStream`], turns every raw record into a
//! [`NormalizedEntity`] and collects them into batches. A full batch is handed
//! to a spawned flush task and accumulation continues into a fresh batch right
//! away. At most one flush is in flight: before issuing the next one the
//! driver waits for the previous one, so store calls never overlap.
//!
//! A failed flush is logged and its batch dropped. There is no retry and later
//! batches are unaffected. On cancellation the partial batch is discarded
//! without a flush; a flush that was already issued is still awaited.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use geoset_common::NormalizedEntity;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::DEFAULT_BATCH_SIZE;
use crate::source::RecordStream;
use crate::store::{EntityStore, StoreResult};

/// Batch length at which a flush is issued
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FlushThreshold {
    /// Flush when the batch holds `batch_size` entities
    #[default]
    Full,
    /// Flush when the batch holds `batch_size - 1` entities
    OneShort,
}

impl FlushThreshold {
    /// Number of entities that triggers a flush for `batch_size`
    pub fn limit(self, batch_size: usize) -> usize {
        match self {
            FlushThreshold::Full => batch_size.max(1),
            FlushThreshold::OneShort => batch_size.saturating_sub(1).max(1),
        }
    }
}

impl FromStr for FlushThreshold {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "full" => Ok(FlushThreshold::Full),
            "one-short" | "one_short" => Ok(FlushThreshold::OneShort),
            other => Err(format!(
                "Invalid flush threshold: {other}. Expected one of: full, one-short"
            )),
        }
    }
}

impl fmt::Display for FlushThreshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlushThreshold::Full => write!(f, "full"),
            FlushThreshold::OneShort => write!(f, "one-short"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverConfig {
    pub batch_size: usize,
    pub threshold: FlushThreshold,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            threshold: FlushThreshold::Full,
        }
    }
}

/// Lifecycle of one driver run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DriverState {
    #[default]
    Idle,
    Streaming,
    Flushing,
    Done,
    Cancelled,
}

/// Counters for one driver run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestStats {
    pub records_received: u64,
    pub entities_flushed: u64,
    pub batches_flushed: u64,
    pub batches_failed: u64,
    /// Entities lost to failed flushes
    pub entities_dropped: u64,
    pub state: DriverState,
}

impl IngestStats {
    pub fn batches_issued(&self) -> u64 {
        self.batches_flushed + self.batches_failed
    }
}

struct PendingFlush {
    number: u64,
    size: usize,
    handle: JoinHandle<StoreResult<()>>,
}

/// Turns a record stream into store batches
pub struct IngestionDriver {
    store: Arc<dyn EntityStore>,
    config: DriverConfig,
}

impl IngestionDriver {
    pub fn new(store: Arc<dyn EntityStore>, config: DriverConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> DriverConfig {
        self.config
    }

    /// Drive `stream` to exhaustion or cancellation
    ///
    /// Returns once every issued flush has settled and the stream's producer
    /// has stopped.
    pub async fn run(
        &self,
        source_file: &str,
        mut stream: RecordStream,
        cancel: CancellationToken,
    ) -> IngestStats {
        let limit = self.config.threshold.limit(self.config.batch_size);
        let mut stats = IngestStats {
            state: DriverState::Streaming,
            ..IngestStats::default()
        };
        let mut batch: Vec<NormalizedEntity> = Vec::with_capacity(limit);
        let mut pending: Option<PendingFlush> = None;
        let mut batch_number = 0u64;
        let mut cancelled = false;

        debug!(file = %source_file, limit, threshold = %self.config.threshold, "Driver streaming");

        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    cancelled = true;
                    break;
                }
                next = stream.recv() => next,
            };

            let Some(raw) = next else {
                break;
            };

            stats.records_received += 1;
            batch.push(NormalizedEntity::from_raw(raw, source_file));

            if batch.len() >= limit {
                if let Some(previous) = pending.take() {
                    stats.state = DriverState::Flushing;
                    self.settle(source_file, previous, &mut stats).await;
                    stats.state = DriverState::Streaming;
                }

                batch_number += 1;
                let full = std::mem::replace(&mut batch, Vec::with_capacity(limit));
                pending = Some(self.issue(batch_number, full));
            }
        }

        if let Some(previous) = pending.take() {
            stats.state = DriverState::Flushing;
            self.settle(source_file, previous, &mut stats).await;
        }

        if cancelled {
            if !batch.is_empty() {
                warn!(
                    file = %source_file,
                    discarded = batch.len(),
                    "Cancelled, discarding partial batch without flush"
                );
            }
            stats.state = DriverState::Cancelled;
        } else {
            if !batch.is_empty() {
                stats.state = DriverState::Flushing;
                batch_number += 1;
                let last = std::mem::take(&mut batch);
                let flush = self.issue(batch_number, last);
                self.settle(source_file, flush, &mut stats).await;
            }
            stats.state = DriverState::Done;
        }

        stream.finish().await;

        info!(
            file = %source_file,
            records = stats.records_received,
            flushed = stats.entities_flushed,
            batches = stats.batches_flushed,
            failed_batches = stats.batches_failed,
            dropped = stats.entities_dropped,
            state = ?stats.state,
            "Driver finished"
        );

        stats
    }

    fn issue(&self, number: u64, batch: Vec<NormalizedEntity>) -> PendingFlush {
        let store = Arc::clone(&self.store);
        let batch_size = self.config.batch_size;
        let size = batch.len();

        // The batch moves into the task and is dropped there whatever the outcome
        let handle = tokio::spawn(async move { store.bulk_insert(&batch, batch_size).await });

        PendingFlush {
            number,
            size,
            handle,
        }
    }

    async fn settle(&self, source_file: &str, flush: PendingFlush, stats: &mut IngestStats) {
        let PendingFlush {
            number,
            size,
            handle,
        } = flush;

        let failure = match handle.await {
            Ok(Ok(())) => None,
            Ok(Err(e)) => Some(e.to_string()),
            Err(e) => Some(format!("flush task failed: {e}")),
        };

        match failure {
            None => {
                debug!(file = %source_file, batch = number, size, "Batch flushed");
                stats.batches_flushed += 1;
                stats.entities_flushed += size as u64;
            },
            Some(e) => {
                error!(
                    file = %source_file,
                    batch = number,
                    size,
                    error = %e,
                    "Batch flush failed, dropping batch"
                );
                stats.batches_failed += 1;
                stats.entities_dropped += size as u64;
            },
        }
    }
}
