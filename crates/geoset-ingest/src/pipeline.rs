//! Cancellation-aware relay in front of a source adapter
//!
//! The pipeline starts an adapter and forwards its records, unchanged and in
//! order, into a fresh bounded relay drained by the consumer. The forwarding
//! task owns the only sender of that relay, so the output closes exactly once:
//! when the task returns, whether the adapter ran dry or the token fired.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::source::{RecordStream, SourceAdapter, SourceError};

/// Records buffered between the forwarding task and the driver
pub const DEFAULT_RELAY_CAPACITY: usize = 100;

/// One adapter plus the relay the consumer reads from
pub struct RecordPipeline {
    adapter: Box<dyn SourceAdapter>,
    capacity: usize,
}

impl RecordPipeline {
    pub fn new(adapter: Box<dyn SourceAdapter>, capacity: usize) -> Self {
        Self {
            adapter,
            capacity: capacity.max(1),
        }
    }

    pub fn source_name(&self) -> &str {
        self.adapter.name()
    }

    /// Start the adapter and the forwarding task
    ///
    /// Fails only when the adapter refuses to start.
    pub fn start(self, cancel: CancellationToken) -> Result<RecordStream, SourceError> {
        let name = self.adapter.name().to_string();
        let upstream = self.adapter.read_all(cancel.clone())?;

        let (tx, rx) = mpsc::channel(self.capacity);
        let forwarder = tokio::spawn(forward(name, upstream, tx, cancel));

        Ok(RecordStream::new(rx, forwarder))
    }
}

async fn forward(
    name: String,
    mut upstream: RecordStream,
    tx: mpsc::Sender<geoset_common::RawRecord>,
    cancel: CancellationToken,
) -> u64 {
    let mut forwarded = 0u64;

    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(source = %name, forwarded, "Relay cancelled while waiting for input");
                break;
            }
            next = upstream.recv() => next,
        };

        let Some(raw) = next else {
            break;
        };

        let delivered = tokio::select! {
            biased;
            _ = cancel.cancelled() => false,
            result = tx.send(raw) => result.is_ok(),
        };

        if !delivered {
            debug!(source = %name, forwarded, "Relay output closed or cancelled");
            break;
        }
        forwarded += 1;
    }

    // Closing the upstream relay releases a producer parked on a full buffer
    let produced = upstream.finish().await;
    info!(source = %name, produced, forwarded, "Relay finished");

    forwarded
}
