//! Record shapes shared by the ingestion pipeline and the entity store

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::spatial::{self, SpatialKey};

// ============================================================================
// Adapter Output
// ============================================================================

/// A row normalized by a source adapter.
///
/// Raw records have no identity: they are produced by one adapter pass and
/// consumed once by the ingestion driver.
///
/// # Examples
///
/// ```rust
/// use geoset_common::types::RawRecord;
/// use serde_json::json;
///
/// let record = RawRecord::new("Stonehenge", "Wiltshire", -1.8262, 51.1789, 102.0)
///     .with_metadata(json!({ "period": "neolithic" }));
/// assert_eq!(record.metadata["period"], "neolithic");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    /// Primary label of the row (place name, location, postal code)
    pub name: String,

    /// Short human-readable description
    pub description: String,

    /// Longitude in degrees
    pub longitude: f64,

    /// Latitude in degrees
    pub latitude: f64,

    /// Height / elevation, 0 when the format has none
    pub height: f64,

    /// Format-specific payload (a JSON object, possibly empty)
    pub metadata: serde_json::Value,
}

impl RawRecord {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        longitude: f64,
        latitude: f64,
        height: f64,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            longitude,
            latitude,
            height,
            metadata: serde_json::Value::Object(serde_json::Map::new()),
        }
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }
}

// ============================================================================
// Ingestion Unit
// ============================================================================

/// An identified, spatially keyed record ready to be persisted.
///
/// Entities are built only through [`NormalizedEntity::from_raw`] and expose
/// read-only accessors, so neither the identity nor the spatial key can drift
/// from the coordinates after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedEntity {
    id: Uuid,
    source_file: String,
    name: String,
    description: String,
    longitude: f64,
    latitude: f64,
    height: f64,
    metadata: serde_json::Value,
    spatial_key: SpatialKey,
}

impl NormalizedEntity {
    /// Assign a fresh identity and spatial key to a raw record
    pub fn from_raw(raw: RawRecord, source_file: impl Into<String>) -> Self {
        let spatial_key = spatial::encode(raw.latitude, raw.longitude);

        Self {
            id: Uuid::new_v4(),
            source_file: source_file.into(),
            name: raw.name,
            description: raw.description,
            longitude: raw.longitude,
            latitude: raw.latitude,
            height: raw.height,
            metadata: raw.metadata,
            spatial_key,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Name of the file the record was read from
    pub fn source_file(&self) -> &str {
        &self.source_file
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn metadata(&self) -> &serde_json::Value {
        &self.metadata
    }

    pub fn spatial_key(&self) -> &SpatialKey {
        &self.spatial_key
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_raw_record_defaults_to_empty_metadata() {
        let record = RawRecord::new("a", "b", 1.0, 2.0, 3.0);
        assert_eq!(record.metadata, json!({}));
    }

    #[test]
    fn test_from_raw_copies_fields() {
        let raw = RawRecord::new("Petra", "Ma'an", 35.4444, 30.3285, 810.0)
            .with_metadata(json!({ "country": "JO" }));
        let entity = NormalizedEntity::from_raw(raw, "Historical Cities.csv");

        assert_eq!(entity.source_file(), "Historical Cities.csv");
        assert_eq!(entity.name(), "Petra");
        assert_eq!(entity.description(), "Ma'an");
        assert_eq!(entity.longitude(), 35.4444);
        assert_eq!(entity.latitude(), 30.3285);
        assert_eq!(entity.height(), 810.0);
        assert_eq!(entity.metadata()["country"], "JO");
        assert_eq!(entity.spatial_key(), &spatial::encode(30.3285, 35.4444));
    }

    #[test]
    fn test_from_raw_assigns_unique_ids() {
        let raw = RawRecord::new("same", "same", 10.0, 10.0, 0.0);
        let first = NormalizedEntity::from_raw(raw.clone(), "f.csv");
        let second = NormalizedEntity::from_raw(raw, "f.csv");

        assert_ne!(first.id(), second.id());
        assert_eq!(first.spatial_key(), second.spatial_key());
    }
}
