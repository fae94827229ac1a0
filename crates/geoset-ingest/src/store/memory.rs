//! In-memory entity store for dry runs and tests

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use geoset_common::NormalizedEntity;
use tokio::sync::Mutex;

use super::{EntityStore, StoreError, StoreResult};

#[derive(Debug, Default)]
struct Recorded {
    created: Vec<NormalizedEntity>,
    batches: Vec<Vec<NormalizedEntity>>,
    bulk_calls: usize,
}

/// Keeps every accepted entity in memory
///
/// Bulk calls can be slowed down or rejected by call number (0-based), which
/// lets tests observe flush overlap and failure isolation.
#[derive(Debug, Default)]
pub struct MemoryEntityStore {
    recorded: Mutex<Recorded>,
    rejected_calls: HashSet<usize>,
    delay: Option<Duration>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MemoryEntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject the given bulk calls with [`StoreError::Rejected`]
    pub fn rejecting(mut self, calls: impl IntoIterator<Item = usize>) -> Self {
        self.rejected_calls.extend(calls);
        self
    }

    /// Sleep inside every bulk call
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Accepted batches in call order
    pub async fn batches(&self) -> Vec<Vec<NormalizedEntity>> {
        self.recorded.lock().await.batches.clone()
    }

    /// Every accepted entity, batches first, then single creates
    pub async fn entities(&self) -> Vec<NormalizedEntity> {
        let recorded = self.recorded.lock().await;
        recorded
            .batches
            .iter()
            .flatten()
            .chain(recorded.created.iter())
            .cloned()
            .collect()
    }

    pub async fn len(&self) -> usize {
        let recorded = self.recorded.lock().await;
        recorded.batches.iter().map(Vec::len).sum::<usize>() + recorded.created.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Bulk calls received, accepted or not
    pub async fn bulk_calls(&self) -> usize {
        self.recorded.lock().await.bulk_calls
    }

    /// Highest number of bulk calls observed running at the same time
    pub fn max_concurrent_bulk_calls(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EntityStore for MemoryEntityStore {
    async fn create(&self, entity: &NormalizedEntity) -> StoreResult<()> {
        self.recorded.lock().await.created.push(entity.clone());
        Ok(())
    }

    async fn bulk_insert(&self, entities: &[NormalizedEntity], _batch_size: usize) -> StoreResult<()> {
        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(running, Ordering::SeqCst);

        let call = {
            let mut recorded = self.recorded.lock().await;
            recorded.bulk_calls += 1;
            recorded.bulk_calls - 1
        };

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let result = if self.rejected_calls.contains(&call) {
            Err(StoreError::Rejected(format!("bulk call {call} rejected")))
        } else {
            self.recorded.lock().await.batches.push(entities.to_vec());
            Ok(())
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use geoset_common::RawRecord;

    fn entity(name: &str) -> NormalizedEntity {
        NormalizedEntity::from_raw(RawRecord::new(name, "", 1.0, 2.0, 0.0), "memory.csv")
    }

    #[tokio::test]
    async fn test_records_batches_and_creates() {
        let store = MemoryEntityStore::new();
        store.bulk_insert(&[entity("a"), entity("b")], 10).await.unwrap();
        store.create(&entity("c")).await.unwrap();

        assert_eq!(store.batches().await.len(), 1);
        assert_eq!(store.len().await, 3);
        let names: Vec<_> = store.entities().await.iter().map(|e| e.name().to_string()).collect();
        assert_eq!(names, ["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_rejected_calls() {
        let store = MemoryEntityStore::new().rejecting([1]);

        assert!(store.bulk_insert(&[entity("a")], 1).await.is_ok());
        let err = store.bulk_insert(&[entity("b")], 1).await.unwrap_err();
        assert!(matches!(err, StoreError::Rejected(_)));
        assert!(store.bulk_insert(&[entity("c")], 1).await.is_ok());

        assert_eq!(store.bulk_calls().await, 3);
        assert_eq!(store.len().await, 2);
    }
}
