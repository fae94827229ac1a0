//! Geoset Common Library
//!
//! Shared types, utilities, and error handling for the geoset workspace.
//!
//! # Overview
//!
//! - **Error Handling**: [`GeosetError`] and the [`Result`] alias
//! - **Logging**: `tracing` subscriber setup shared by every binary
//! - **Types**: the record shapes that flow through ingestion
//! - **Spatial**: the hierarchical cell key attached to every entity
//!
//! # Example
//!
//! ```no_run
//! use geoset_common::spatial;
//! use geoset_common::types::{NormalizedEntity, RawRecord};
//!
//! let raw = RawRecord::new("Jericho", "oasis city", 35.444, 31.871, 0.0);
//! let entity = NormalizedEntity::from_raw(raw, "all-bible-places.csv");
//! assert_eq!(entity.spatial_key(), &spatial::encode(31.871, 35.444));
//! ```

#![deny(clippy::unwrap_used, clippy::expect_used)]

pub mod error;
pub mod logging;
pub mod spatial;
pub mod types;

// Re-export commonly used types
pub use error::{GeosetError, Result};
pub use spatial::SpatialKey;
pub use types::{NormalizedEntity, RawRecord};
