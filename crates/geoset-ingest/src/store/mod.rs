//! Entity store boundary
//!
//! The ingestion core only sees [`EntityStore`]: a possibly slow, possibly
//! failing sink taking one entity or one batch per call. Transactions, if
//! any, are the implementation's business.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use geoset_common::NormalizedEntity;
use thiserror::Error;

pub use memory::MemoryEntityStore;
pub use postgres::PgEntityStore;

/// Entity store errors with contextual information
#[derive(Error, Debug)]
pub enum StoreError {
    /// SQL query or connection error
    #[error("Database query failed: {0}")]
    Database(#[from] sqlx::Error),

    /// Schema migration failed
    #[error("Database migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Store configuration is invalid or missing
    #[error("Store configuration error: {0}. Check DATABASE_URL and connection settings.")]
    Config(String),

    /// The store refused the call
    #[error("Store rejected the request: {0}")]
    Rejected(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Durable sink for normalized entities
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Persist a single entity
    async fn create(&self, entity: &NormalizedEntity) -> StoreResult<()>;

    /// Persist a batch; `batch_size` bounds how many rows go into one statement
    async fn bulk_insert(&self, entities: &[NormalizedEntity], batch_size: usize) -> StoreResult<()>;
}
