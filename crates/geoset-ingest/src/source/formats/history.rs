//! Historical and cultural site exports

use crate::source::format::{DatasetFormat, DescriptionRule, MetadataField, NameRule, DEFAULT_DELIMITER};

/// Generic `Name;Description;Lon;Lat;Height` placemark sheet
pub static PLACEMARKS: DatasetFormat = DatasetFormat {
    id: "placemarks",
    columns: 5,
    delimiter: DEFAULT_DELIMITER,
    name: NameRule::column(0),
    description: DescriptionRule::Column(1),
    longitude: 2,
    latitude: 3,
    height: Some(4),
    metadata: &[],
};

pub static BIBLE_PLACES: DatasetFormat = DatasetFormat {
    id: "bible-places",
    columns: 6,
    delimiter: DEFAULT_DELIMITER,
    name: NameRule::or_placeholder(0),
    description: DescriptionRule::Column(1),
    longitude: 3,
    latitude: 4,
    height: Some(5),
    metadata: &[MetadataField::text("description", 2)],
};

pub static MONOLITHS: DatasetFormat = DatasetFormat {
    id: "monoliths",
    columns: 17,
    delimiter: DEFAULT_DELIMITER,
    name: NameRule::column(1),
    description: DescriptionRule::Column(5),
    longitude: 14,
    latitude: 13,
    height: Some(15),
    metadata: &[
        MetadataField::text("num_id", 0),
        MetadataField::text("created", 2),
        MetadataField::text("disappeared", 3),
        MetadataField::text("accuracy", 4),
        MetadataField::text("construction", 6),
        MetadataField::text("notes", 7),
        MetadataField::text("monolith_image", 8),
        MetadataField::text("monolith_image_second", 9),
        MetadataField::text("spotted", 10),
        MetadataField::text("main_link", 11),
        MetadataField::text("support_links", 12),
        MetadataField::text("geohash", 16),
    ],
};

pub static UNESCO_HERITAGE: DatasetFormat = DatasetFormat {
    id: "unesco-heritage",
    columns: 15,
    delimiter: DEFAULT_DELIMITER,
    name: NameRule::column(0),
    description: DescriptionRule::Column(1),
    longitude: 13,
    latitude: 12,
    height: Some(14),
    metadata: &[
        MetadataField::text("name", 0),
        MetadataField::text("description", 1),
        MetadataField::text("justification", 2),
        MetadataField::text("date_inscribed", 3),
        MetadataField::text("secondary_dates", 4),
        MetadataField::text("danger", 5),
        MetadataField::text("dated", 6),
        MetadataField::text("danger_list", 7),
        MetadataField::text("area_hectares", 8),
        MetadataField::text("states_name", 9),
        MetadataField::text("region", 10),
        MetadataField::text("category", 11),
    ],
};
