//! Built-in dataset formats
//!
//! Every format here is a `;`-delimited export with a header line. Formats
//! are grouped by the kind of data they carry:
//!
//! - [`history`]: generic placemark sheets, biblical places, monoliths, UNESCO sites
//! - [`hazards`]: earthquakes, volcanic eruptions, impact structures, terrorism incidents
//! - [`infrastructure`]: cities, power plants, postal codes

pub mod hazards;
pub mod history;
pub mod infrastructure;

use super::format::DatasetFormat;

pub use hazards::{EARTHQUAKES, IMPACT_STRUCTURES, TERRORISM_INCIDENTS, VOLCANIC_ERUPTIONS};
pub use history::{BIBLE_PLACES, MONOLITHS, PLACEMARKS, UNESCO_HERITAGE};
pub use infrastructure::{ALL_CITIES, POSTAL_CODES, POWER_PLANTS};

/// All built-in formats, in a stable order
pub fn all() -> [&'static DatasetFormat; 11] {
    [
        &PLACEMARKS,
        &BIBLE_PLACES,
        &MONOLITHS,
        &UNESCO_HERITAGE,
        &EARTHQUAKES,
        &VOLCANIC_ERUPTIONS,
        &IMPACT_STRUCTURES,
        &TERRORISM_INCIDENTS,
        &ALL_CITIES,
        &POWER_PLANTS,
        &POSTAL_CODES,
    ]
}

/// Look up a built-in format by id
pub fn by_id(id: &str) -> Option<&'static DatasetFormat> {
    all().into_iter().find(|format| format.id == id)
}
