//! File name to source adapter table
//!
//! The registry is plain data: an ordered list of descriptors, each pairing a
//! file name pattern with a constructor. [`SourceRegistry::builtin`] builds
//! the table for every known dataset export; callers may register more.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use regex::Regex;
use tracing::debug;

use crate::source::format::DatasetFormat;
use crate::source::formats;
use crate::source::{CsvSource, SourceAdapter, SourceError};

/// Builds an adapter for a concrete file
pub type SourceConstructor =
    Arc<dyn Fn(&Path) -> Result<Box<dyn SourceAdapter>, SourceError> + Send + Sync>;

/// How a descriptor matches file names
#[derive(Debug, Clone)]
pub enum FilePattern {
    Exact(String),
    Regex(Regex),
}

impl FilePattern {
    pub fn matches(&self, file_name: &str) -> bool {
        match self {
            FilePattern::Exact(name) => name == file_name,
            FilePattern::Regex(regex) => regex.is_match(file_name),
        }
    }
}

impl fmt::Display for FilePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilePattern::Exact(name) => write!(f, "{name}"),
            FilePattern::Regex(regex) => write!(f, "/{}/", regex.as_str()),
        }
    }
}

/// One row of the registry table
#[derive(Clone)]
pub struct SourceDescriptor {
    pub pattern: FilePattern,
    /// Human-readable adapter name, the format id for CSV formats
    pub label: String,
    pub constructor: SourceConstructor,
}

impl fmt::Debug for SourceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceDescriptor")
            .field("pattern", &self.pattern)
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

impl SourceDescriptor {
    /// Construct the adapter for `path`
    pub fn open(&self, path: &Path) -> Result<Box<dyn SourceAdapter>, SourceError> {
        (self.constructor)(path)
    }
}

/// Exported file names of the generic placemark sheets
const PLACEMARK_FILES: &[&str] = &[
    "All_ancient_human_dna.csv",
    "Ancient Locations al_sites.csv",
    "ANTARCTIC AGDC Dataset.csv",
    "archaeogeodesy.csv",
    "GPS System Objects.csv",
    "Historical Cities.csv",
    "Historical Objects.csv",
    "megalithic_earth_AJ.csv",
    "megalithic_earth_KZ.csv",
    "Rank 1 Archaeology Sites.csv",
    "World archaeology.csv",
    "Все вулканы мира.csv",
    "Древнееегипетские захоронения.csv",
    "Королевские резиденции.csv",
    "Полезные ископаемые мира.csv",
    "Полюса недоступности Земли.csv",
    "Православные Храмы.csv",
    "Атомные станции.csv",
];

/// Ordered file name to adapter table
#[derive(Debug, Clone, Default)]
pub struct SourceRegistry {
    descriptors: Vec<SourceDescriptor>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Table covering every built-in dataset export
    pub fn builtin() -> Result<Self, regex::Error> {
        let mut registry = Self::new();

        registry.register_format(FilePattern::Exact("all-bible-places.csv".into()), &formats::BIBLE_PLACES);
        registry.register_format(
            FilePattern::Exact("all-cities-with-a-population.csv".into()),
            &formats::ALL_CITIES,
        );
        for name in PLACEMARK_FILES {
            registry.register_format(FilePattern::Exact((*name).into()), &formats::PLACEMARKS);
        }
        registry.register_format(
            FilePattern::Exact("global_power_plant_database_github.csv".into()),
            &formats::POWER_PLANTS,
        );
        registry.register_format(
            FilePattern::Exact("globalterrorismdb_full_may2023.csv".into()),
            &formats::TERRORISM_INCIDENTS,
        );
        registry.register_format(FilePattern::Exact("monolith_tracker_parsed.csv".into()), &formats::MONOLITHS);
        registry.register_format(
            FilePattern::Exact("significant-earthquake-database-parsed.csv".into()),
            &formats::EARTHQUAKES,
        );
        registry.register_format(
            FilePattern::Exact("significant-volcanic-eruption-database-parsed.csv".into()),
            &formats::VOLCANIC_ERUPTIONS,
        );
        registry.register_format(FilePattern::Exact("UNESCO World Heritage.csv".into()), &formats::UNESCO_HERITAGE);

        registry.register_format(
            FilePattern::Regex(Regex::new(r"(?i)^impact[-_ ]?structures.*\.csv$")?),
            &formats::IMPACT_STRUCTURES,
        );
        registry.register_format(
            FilePattern::Regex(Regex::new(r"(?i)^.*postal[-_ ]?codes?.*\.csv$")?),
            &formats::POSTAL_CODES,
        );

        Ok(registry)
    }

    /// Append a descriptor; earlier registrations win on overlap
    pub fn register(&mut self, descriptor: SourceDescriptor) {
        self.descriptors.push(descriptor);
    }

    /// Register a CSV format under `pattern`
    pub fn register_format(&mut self, pattern: FilePattern, format: &'static DatasetFormat) {
        self.register(SourceDescriptor {
            pattern,
            label: format.id.to_string(),
            constructor: Arc::new(move |path: &Path| {
                let source = CsvSource::open(path, format)?;
                Ok(Box::new(source) as Box<dyn SourceAdapter>)
            }),
        });
    }

    /// First descriptor whose pattern matches `file_name`
    pub fn resolve(&self, file_name: &str) -> Option<&SourceDescriptor> {
        self.descriptors
            .iter()
            .find(|descriptor| descriptor.pattern.matches(file_name))
    }

    /// Resolve by the path's file name and construct the adapter
    pub fn open(&self, path: &Path) -> Result<Box<dyn SourceAdapter>, SourceError> {
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        let descriptor = self
            .resolve(&file_name)
            .ok_or_else(|| SourceError::Unsupported(file_name.clone()))?;

        debug!(file = %file_name, adapter = %descriptor.label, "Resolved source adapter");
        descriptor.open(path)
    }

    pub fn descriptors(&self) -> &[SourceDescriptor] {
        &self.descriptors
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn label_for(registry: &SourceRegistry, file_name: &str) -> Option<String> {
        registry.resolve(file_name).map(|d| d.label.clone())
    }

    #[test]
    fn test_builtin_exact_names() {
        let registry = SourceRegistry::builtin().unwrap();

        assert_eq!(label_for(&registry, "all-bible-places.csv").as_deref(), Some("bible-places"));
        assert_eq!(label_for(&registry, "Historical Cities.csv").as_deref(), Some("placemarks"));
        assert_eq!(label_for(&registry, "Атомные станции.csv").as_deref(), Some("placemarks"));
        assert_eq!(
            label_for(&registry, "significant-volcanic-eruption-database-parsed.csv").as_deref(),
            Some("volcanic-eruptions")
        );
        assert_eq!(label_for(&registry, "UNESCO World Heritage.csv").as_deref(), Some("unesco-heritage"));
    }

    #[test]
    fn test_exact_names_are_case_sensitive() {
        let registry = SourceRegistry::builtin().unwrap();
        assert!(registry.resolve("historical cities.csv").is_none());
    }

    #[test]
    fn test_builtin_patterns() {
        let registry = SourceRegistry::builtin().unwrap();

        assert_eq!(label_for(&registry, "Impact Structures 2024.csv").as_deref(), Some("impact-structures"));
        assert_eq!(label_for(&registry, "world_postal_codes.csv").as_deref(), Some("postal-codes"));
        assert!(registry.resolve("postal_codes.txt").is_none());
    }

    #[test]
    fn test_registration_order_wins() {
        let mut registry = SourceRegistry::new();
        registry.register_format(FilePattern::Regex(Regex::new(r"\.csv$").unwrap()), &formats::PLACEMARKS);
        registry.register_format(FilePattern::Exact("x.csv".into()), &formats::EARTHQUAKES);

        assert_eq!(label_for(&registry, "x.csv").as_deref(), Some("placemarks"));
    }

    #[test]
    fn test_open_unsupported() {
        let registry = SourceRegistry::builtin().unwrap();
        let err = registry.open(Path::new("data/notes.txt")).err().unwrap();
        assert!(matches!(err, SourceError::Unsupported(name) if name == "notes.txt"));
    }

    #[test]
    fn test_open_resolves_and_constructs() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("archaeogeodesy.csv");
        std::fs::write(&path, "Name;Description;Lon;Lat;Height\n").unwrap();

        let registry = SourceRegistry::builtin().unwrap();
        let adapter = registry.open(&path).unwrap();
        assert_eq!(adapter.name(), "archaeogeodesy.csv");
    }

    #[test]
    fn test_display_pattern() {
        assert_eq!(FilePattern::Exact("a.csv".into()).to_string(), "a.csv");
        assert_eq!(FilePattern::Regex(Regex::new("^a$").unwrap()).to_string(), "/^a$/");
    }
}
