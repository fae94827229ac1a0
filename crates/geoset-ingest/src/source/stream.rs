//! Receiving end of a relay plus the unit of concurrency feeding it

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Stream;
use geoset_common::RawRecord;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::warn;

/// Lazy, single-pass sequence of raw records
///
/// The stream owns the receiver of a bounded relay and the join handle of the
/// task that sends into it. It ends when that task drops its sender, either
/// because the source is exhausted or because it observed cancellation.
///
/// Dropping the stream closes the relay, so a producer blocked on a full relay
/// wakes up and stops. Call [`RecordStream::finish`] to additionally wait for
/// the producer to return.
#[derive(Debug)]
pub struct RecordStream {
    rx: mpsc::Receiver<RawRecord>,
    producer: Option<JoinHandle<u64>>,
}

impl RecordStream {
    /// Wrap a relay receiver and the task feeding it
    ///
    /// The task must own every sender of the relay and return the number of
    /// records it sent.
    pub fn new(rx: mpsc::Receiver<RawRecord>, producer: JoinHandle<u64>) -> Self {
        Self {
            rx,
            producer: Some(producer),
        }
    }

    /// Next record, or `None` once the producer has finished
    pub async fn recv(&mut self) -> Option<RawRecord> {
        self.rx.recv().await
    }

    /// Close the relay and wait for the producer to return
    ///
    /// Records still buffered in the relay are discarded. Returns how many
    /// records the producer emitted.
    pub async fn finish(mut self) -> u64 {
        self.rx.close();

        let Some(producer) = self.producer.take() else {
            return 0;
        };

        match producer.await {
            Ok(sent) => sent,
            Err(e) => {
                warn!(error = %e, "Record producer did not complete");
                0
            },
        }
    }
}

impl Stream for RecordStream {
    type Item = RawRecord;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}
