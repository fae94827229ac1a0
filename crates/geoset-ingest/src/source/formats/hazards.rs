//! Natural hazard and incident databases

use crate::source::format::{
    DatasetFormat, DescriptionRule, MetadataField, NameRule, Row, DEFAULT_DELIMITER,
};

pub static EARTHQUAKES: DatasetFormat = DatasetFormat {
    id: "earthquakes",
    columns: 19,
    delimiter: DEFAULT_DELIMITER,
    name: NameRule::column(0),
    description: DescriptionRule::Column(4),
    longitude: 17,
    latitude: 16,
    height: Some(18),
    metadata: &[
        MetadataField::text("location_name", 0),
        MetadataField::text("year", 1),
        MetadataField::text("month", 2),
        MetadataField::text("day", 3),
        MetadataField::text("country", 4),
        MetadataField::text("focal_depth", 5),
        MetadataField::text("eq_primary", 6),
        MetadataField::text("flag_tsunami", 7),
        MetadataField::text("deaths", 8),
        MetadataField::text("injuries", 9),
        MetadataField::text("missing", 10),
        MetadataField::text("missing_description", 11),
        MetadataField::text("houses_destroyed", 12),
        MetadataField::text("houses_damaged", 13),
        MetadataField::text("damage", 14),
        MetadataField::text("damage_description", 15),
    ],
};

fn country_and_location(row: &Row<'_>) -> String {
    format!("{} — {}", row.text(8), row.text(7))
}

pub static VOLCANIC_ERUPTIONS: DatasetFormat = DatasetFormat {
    id: "volcanic-eruptions",
    columns: 21,
    delimiter: DEFAULT_DELIMITER,
    name: NameRule::column(0),
    description: DescriptionRule::Custom(country_and_location),
    longitude: 19,
    latitude: 18,
    height: Some(20),
    metadata: &[
        MetadataField::text("volcano_name", 0),
        MetadataField::text("year", 1),
        MetadataField::text("month", 2),
        MetadataField::text("day", 3),
        MetadataField::text("elevation", 4),
        MetadataField::text("volcano_type", 5),
        MetadataField::text("status", 6),
        MetadataField::text("location", 7),
        MetadataField::text("country", 8),
        MetadataField::text("flag_tsunami", 9),
        MetadataField::text("flag_earthquake", 10),
        MetadataField::text("volcanic_explosivity_index", 11),
        MetadataField::text("deaths", 12),
        MetadataField::text("missing", 13),
        MetadataField::text("injuries", 14),
        MetadataField::text("damage", 15),
        MetadataField::text("damage_description", 16),
        MetadataField::text("houses_destroyed", 17),
    ],
};

pub static IMPACT_STRUCTURES: DatasetFormat = DatasetFormat {
    id: "impact-structures",
    columns: 8,
    delimiter: DEFAULT_DELIMITER,
    name: NameRule::column(0),
    description: DescriptionRule::Column(4),
    longitude: 6,
    latitude: 5,
    height: Some(7),
    metadata: &[
        MetadataField::text("region", 0),
        MetadataField::text("probability", 1),
        MetadataField::text("age_m", 2),
        MetadataField::text("daimeter_km", 3),
        MetadataField::text("webpage", 4),
    ],
};

pub static TERRORISM_INCIDENTS: DatasetFormat = DatasetFormat {
    id: "terrorism-incidents",
    columns: 17,
    delimiter: DEFAULT_DELIMITER,
    name: NameRule::column(4),
    description: DescriptionRule::Column(5),
    longitude: 15,
    latitude: 14,
    height: Some(16),
    metadata: &[
        MetadataField::text("eventid", 0),
        MetadataField::text("iyear", 1),
        MetadataField::text("imonth", 2),
        MetadataField::text("iday", 3),
        MetadataField::text("targets", 6),
        MetadataField::text("attacktype_txt", 7),
        MetadataField::text("terrorists", 8),
        MetadataField::text("motive_claime", 9),
        MetadataField::text("weapons", 10),
        MetadataField::text("damage", 11),
        MetadataField::text("killed", 12),
        MetadataField::text("wounded", 13),
    ],
};
