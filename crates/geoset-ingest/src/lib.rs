//! Geoset Ingest Library
//!
//! Streaming ingestion of geospatial CSV exports into the entity store.
//!
//! # Data flow
//!
//! ```text
//! file -> SourceAdapter -> RecordPipeline -> IngestionDriver -> EntityStore
//! ```
//!
//! - [`source`]: per-format adapters producing raw records on a blocking task
//! - [`registry`]: file name to adapter table
//! - [`pipeline`]: cancellation-aware relay between adapter and driver
//! - [`driver`]: normalization, batching and flushing
//! - [`store`]: the persistence boundary (Postgres and in-memory)
//! - [`orchestrator`]: one file at a time over a data directory
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use geoset_ingest::config::IngestConfig;
//! use geoset_ingest::orchestrator::{Orchestrator, OrchestratorSettings};
//! use geoset_ingest::registry::SourceRegistry;
//! use geoset_ingest::store::MemoryEntityStore;
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = IngestConfig::load()?;
//!     let orchestrator = Orchestrator::new(
//!         SourceRegistry::builtin()?,
//!         Arc::new(MemoryEntityStore::new()),
//!         OrchestratorSettings::from_config(&config),
//!     );
//!
//!     let summary = orchestrator.run(CancellationToken::new()).await?;
//!     println!("{} entities", summary.entities_flushed());
//!     Ok(())
//! }
//! ```

#![deny(clippy::unwrap_used, clippy::expect_used)]

pub mod config;
pub mod driver;
pub mod orchestrator;
pub mod pipeline;
pub mod registry;
pub mod source;
pub mod store;

use std::path::PathBuf;

use geoset_common::GeosetError;
use thiserror::Error;

use source::SourceError;
use store::StoreError;

/// Run-level ingestion errors
#[derive(Debug, Error)]
pub enum IngestError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Failed to read data directory {}: {source}", path.display())]
    Discovery {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid file name pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error(transparent)]
    Config(#[from] GeosetError),
}

pub type Result<T> = std::result::Result<T, IngestError>;
