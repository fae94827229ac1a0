//! Settlement and infrastructure registries

use crate::source::format::{
    DatasetFormat, DescriptionRule, MetadataField, NameRule, Row, DEFAULT_DELIMITER,
    UNTITLED,
};

/// Cities export; rows without a name are dropped
pub static ALL_CITIES: DatasetFormat = DatasetFormat {
    id: "all-cities",
    columns: 8,
    delimiter: DEFAULT_DELIMITER,
    name: NameRule::required(0),
    // Alternate names
    description: DescriptionRule::Column(1),
    longitude: 6,
    latitude: 5,
    height: Some(7),
    metadata: &[
        MetadataField::integer("elevation", 2),
        MetadataField::text("country", 3),
        MetadataField::integer("population", 4),
    ],
};

fn country_or_untitled(row: &Row<'_>) -> String {
    row.text_or(0, UNTITLED).to_string()
}

pub static POWER_PLANTS: DatasetFormat = DatasetFormat {
    id: "power-plants",
    columns: 10,
    delimiter: DEFAULT_DELIMITER,
    name: NameRule::or_placeholder(1),
    description: DescriptionRule::Custom(country_or_untitled),
    longitude: 8,
    latitude: 7,
    height: Some(9),
    metadata: &[
        MetadataField::text_or("country", 0, UNTITLED),
        MetadataField::text("capacity_mw", 2),
        MetadataField::text("primary_fuel", 3),
        MetadataField::text("secondary_fuel", 4),
        MetadataField::text("commissioning_year", 5),
        MetadataField::text("owner", 6),
    ],
};

fn place_and_country(row: &Row<'_>) -> String {
    format!("{} ({})", row.text(2), row.text(0))
}

/// Postal code gazetteer; carries no height column
pub static POSTAL_CODES: DatasetFormat = DatasetFormat {
    id: "postal-codes",
    columns: 13,
    delimiter: DEFAULT_DELIMITER,
    name: NameRule::column(1),
    description: DescriptionRule::Custom(place_and_country),
    longitude: 10,
    latitude: 9,
    height: None,
    metadata: &[
        MetadataField::text("country_code", 0),
        MetadataField::text("postal_code", 1),
        MetadataField::text("place_name", 2),
        MetadataField::text("admin_name_1", 3),
        MetadataField::text("admin_code_1", 4),
        MetadataField::text("admin_name_2", 5),
        MetadataField::text("admin_code_2", 6),
        MetadataField::text("admin_name_3", 7),
        MetadataField::text("admin_code_3", 8),
        MetadataField::text("accuracy", 11),
        MetadataField::text("coordinates", 12),
    ],
};

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use csv::StringRecord;
    use serde_json::json;

    #[test]
    fn test_city_metadata_uses_integers() {
        let row = StringRecord::from(vec![
            "Quito", "San Francisco de Quito", "2850", "EC", "1399814", "-0.22985", "-78.52495", "0",
        ]);
        let raw = ALL_CITIES.parse_row(&row, "all-cities-with-a-population.csv", 2).unwrap();

        assert_eq!(raw.description, "San Francisco de Quito");
        assert_eq!((raw.longitude, raw.latitude), (-78.52495, -0.22985));
        assert_eq!(
            raw.metadata,
            json!({ "elevation": 2850, "country": "EC", "population": 1399814 })
        );
    }

    #[test]
    fn test_city_without_name_is_dropped() {
        let row = StringRecord::from(vec!["", "", "0", "EC", "0", "1", "2", "0"]);
        assert!(ALL_CITIES.parse_row(&row, "cities.csv", 3).is_none());
    }

    #[test]
    fn test_city_short_row_keeps_defaults() {
        let row = StringRecord::from(vec!["Cusco", "Qosqo"]);
        let raw = ALL_CITIES.parse_row(&row, "cities.csv", 4).unwrap();

        assert_eq!(raw.name, "Cusco");
        assert_eq!((raw.longitude, raw.latitude, raw.height), (0.0, 0.0, 0.0));
        assert_eq!(raw.metadata, json!({}));
    }

    #[test]
    fn test_power_plant_placeholders() {
        let row = StringRecord::from(vec!["", "", "100", "Hydro", "", "", "", "10.5", "20.5", "0"]);
        let raw = POWER_PLANTS.parse_row(&row, "plants.csv", 2).unwrap();

        assert_eq!(raw.name, UNTITLED);
        assert_eq!(raw.description, UNTITLED);
        assert_eq!(
            raw.metadata,
            json!({ "country": UNTITLED, "capacity_mw": "100", "primary_fuel": "Hydro" })
        );
    }

    #[test]
    fn test_power_plant_country_kept_in_metadata() {
        let row = StringRecord::from(vec!["Chile", "Rapel", "377", "Hydro", "", "1968", "Enel", "-34.03", "-71.59", "0"]);
        let raw = POWER_PLANTS.parse_row(&row, "plants.csv", 3).unwrap();

        assert_eq!(raw.description, "Chile");
        assert_eq!(raw.metadata["country"], "Chile");
        assert_eq!(raw.metadata["owner"], "Enel");
    }

    #[test]
    fn test_postal_code_description_and_height() {
        let row = StringRecord::from(vec![
            "DE", "10115", "Berlin", "Berlin", "BE", "", "", "", "", "52.5323", "13.3846", "4", "52.5323,13.3846",
        ]);
        let raw = POSTAL_CODES.parse_row(&row, "postal_codes.csv", 2).unwrap();

        assert_eq!(raw.name, "10115");
        assert_eq!(raw.description, "Berlin (DE)");
        assert_eq!(raw.height, 0.0);
        assert_eq!(raw.metadata["accuracy"], "4");
    }
}
