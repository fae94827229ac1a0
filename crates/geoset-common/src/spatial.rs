//! Spatial key encoding
//!
//! Every entity carries the S2 cell that contains its coordinates. S2 cells
//! form a quadtree over the six faces of a cube projected onto the sphere, and
//! the 64-bit identifiers are ordered along a Hilbert curve, so:
//!
//! - nearby points tend to share long identifier prefixes
//! - every cell at level `n` covers a contiguous identifier range at level 30
//!
//! Both properties let later queries use plain `BETWEEN` scans on the stored
//! key instead of geometric predicates.
//!
//! Input is not range-checked. Upstream datasets contain dirty coordinates and
//! the key of an out-of-range pair is whatever the projection produces.

use s2::cellid::CellID;
use s2::latlng::LatLng;
use serde::{Deserialize, Serialize};

/// Subdivision level of the cells produced by [`encode`] (S2 leaf cells, ~1cm²).
pub const LEAF_LEVEL: u64 = 30;

/// Hierarchical cell identifier for a coordinate pair
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpatialKey {
    /// Raw S2 cell identifier
    pub cell_id: u64,
    /// Compact hex token of the same cell (trailing zero nibbles stripped)
    pub token: String,
}

impl SpatialKey {
    fn from_cell(cell: CellID) -> Self {
        Self {
            cell_id: cell.0,
            token: cell.to_token(),
        }
    }

    /// Subdivision level of this key
    pub fn level(&self) -> u64 {
        CellID(self.cell_id).level()
    }

    /// Ancestor cell at a coarser level
    ///
    /// Levels finer than the key's own level return the key unchanged.
    pub fn parent(&self, level: u64) -> SpatialKey {
        let cell = CellID(self.cell_id);
        if level >= cell.level() {
            return self.clone();
        }
        Self::from_cell(cell.parent(level))
    }

    /// The identifier reinterpreted as `i64` for storage in a `BIGINT` column.
    ///
    /// The bit pattern is preserved, so ordering only holds within one sign.
    pub fn cell_id_i64(&self) -> i64 {
        self.cell_id as i64
    }
}

impl std::fmt::Display for SpatialKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.token)
    }
}

/// Encode a latitude/longitude pair (degrees) into its leaf-level spatial key
pub fn encode(lat: f64, lon: f64) -> SpatialKey {
    let cell = CellID::from(&LatLng::from_degrees(lat, lon));
    SpatialKey::from_cell(cell)
}
