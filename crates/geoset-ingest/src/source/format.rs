//! Declarative column mapping for delimited dataset files
//!
//! A [`DatasetFormat`] describes one file shape: how many columns it has,
//! which columns carry the name, description and coordinates, and which
//! columns are copied into the metadata document. Parsing is best-effort:
//! an unparsable coordinate becomes `0.0` and the row still goes downstream.

use csv::StringRecord;
use geoset_common::RawRecord;
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// Delimiter used by every known dataset export
pub const DEFAULT_DELIMITER: u8 = b';';

/// Placeholder used when a format replaces an empty name
pub const UNTITLED: &str = "untitled";

/// What to do when the name column is empty
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyName {
    Keep,
    Placeholder(&'static str),
    Reject,
}

#[derive(Debug, Clone, Copy)]
pub struct NameRule {
    pub column: usize,
    pub on_empty: EmptyName,
}

impl NameRule {
    pub const fn column(column: usize) -> Self {
        Self {
            column,
            on_empty: EmptyName::Keep,
        }
    }

    pub const fn or_placeholder(column: usize) -> Self {
        Self {
            column,
            on_empty: EmptyName::Placeholder(UNTITLED),
        }
    }

    pub const fn required(column: usize) -> Self {
        Self {
            column,
            on_empty: EmptyName::Reject,
        }
    }
}

/// Source of the `description` field
#[derive(Debug, Clone, Copy)]
pub enum DescriptionRule {
    Column(usize),
    /// Non-empty cells of the listed columns joined with a separator
    Joined(&'static [usize], &'static str),
    Custom(fn(&Row<'_>) -> String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    /// Text with a fixed value standing in for an empty cell
    TextOr(&'static str),
    Integer,
}

/// One metadata key copied from a column; empty text and zero integers are omitted
#[derive(Debug, Clone, Copy)]
pub struct MetadataField {
    pub key: &'static str,
    pub column: usize,
    pub kind: FieldKind,
}

impl MetadataField {
    pub const fn text(key: &'static str, column: usize) -> Self {
        Self {
            key,
            column,
            kind: FieldKind::Text,
        }
    }

    pub const fn text_or(key: &'static str, column: usize, fallback: &'static str) -> Self {
        Self {
            key,
            column,
            kind: FieldKind::TextOr(fallback),
        }
    }

    pub const fn integer(key: &'static str, column: usize) -> Self {
        Self {
            key,
            column,
            kind: FieldKind::Integer,
        }
    }
}

/// Column layout of one dataset export
#[derive(Debug)]
pub struct DatasetFormat {
    /// Stable identifier used in logs and the `formats` listing
    pub id: &'static str,
    /// Expected number of columns per row; other widths are still parsed
    pub columns: usize,
    pub delimiter: u8,
    pub name: NameRule,
    pub description: DescriptionRule,
    pub longitude: usize,
    pub latitude: usize,
    /// Height column; formats without one report 0
    pub height: Option<usize>,
    pub metadata: &'static [MetadataField],
}

impl DatasetFormat {
    /// Map one data row to a raw record
    ///
    /// Missing columns read as empty. Returns `None` only when the format
    /// requires a name and the name cell is empty.
    pub fn parse_row(&self, record: &StringRecord, file: &str, line: u64) -> Option<RawRecord> {
        if record.len() != self.columns {
            debug!(
                file,
                line,
                expected = self.columns,
                found = record.len(),
                "Row has unexpected column count, parsing available columns"
            );
        }

        let row = Row { record, file, line };

        let name = match (row.text(self.name.column), self.name.on_empty) {
            ("", EmptyName::Reject) => {
                warn!(file, line, column = self.name.column, "Empty name, skipping row");
                return None;
            },
            ("", EmptyName::Placeholder(placeholder)) => {
                warn!(file, line, column = self.name.column, "Empty name, using placeholder");
                placeholder.to_string()
            },
            (value, _) => value.to_string(),
        };

        let description = match self.description {
            DescriptionRule::Column(column) => row.text(column).to_string(),
            DescriptionRule::Joined(columns, separator) => columns
                .iter()
                .map(|&column| row.text(column))
                .filter(|value| !value.is_empty())
                .collect::<Vec<_>>()
                .join(separator),
            DescriptionRule::Custom(describe) => describe(&row),
        };

        let height = self.height.map(|column| row.coordinate(column)).unwrap_or(0.0);

        Some(
            RawRecord::new(
                name,
                description,
                row.coordinate(self.longitude),
                row.coordinate(self.latitude),
                height,
            )
            .with_metadata(self.metadata_for(&row)),
        )
    }

    fn metadata_for(&self, row: &Row<'_>) -> Value {
        let mut map = Map::new();

        for field in self.metadata {
            match field.kind {
                FieldKind::Text => {
                    let value = row.text(field.column);
                    if !value.is_empty() {
                        map.insert(field.key.to_string(), Value::from(value));
                    }
                },
                FieldKind::TextOr(fallback) => {
                    map.insert(field.key.to_string(), Value::from(row.text_or(field.column, fallback)));
                },
                FieldKind::Integer => {
                    let value = row.integer(field.column);
                    if value != 0 {
                        map.insert(field.key.to_string(), Value::from(value));
                    }
                },
            }
        }

        Value::Object(map)
    }
}

/// Read access to one CSV row with best-effort conversions
pub struct Row<'a> {
    record: &'a StringRecord,
    file: &'a str,
    line: u64,
}

impl<'a> Row<'a> {
    /// Raw cell text; missing columns read as empty
    pub fn text(&self, column: usize) -> &'a str {
        self.record.get(column).unwrap_or("")
    }

    /// Cell text, or `fallback` when the cell is empty
    pub fn text_or(&self, column: usize, fallback: &'a str) -> &'a str {
        match self.text(column) {
            "" => fallback,
            value => value,
        }
    }

    /// Floating point cell, `0.0` when it does not parse
    pub fn coordinate(&self, column: usize) -> f64 {
        let value = self.text(column).trim();
        match value.parse::<f64>() {
            Ok(parsed) => parsed,
            Err(_) if value.is_empty() => {
                debug!(file = self.file, line = self.line, column, "Empty coordinate, defaulting to 0");
                0.0
            },
            Err(_) => {
                warn!(
                    file = self.file,
                    line = self.line,
                    column,
                    value,
                    "Coordinate is not a number, defaulting to 0"
                );
                0.0
            },
        }
    }

    /// Integer cell, `0` when it does not parse
    pub fn integer(&self, column: usize) -> i64 {
        self.text(column).trim().parse().unwrap_or(0)
    }
}
