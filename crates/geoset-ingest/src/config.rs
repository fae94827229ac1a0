//! Configuration management

use std::path::PathBuf;
use std::str::FromStr;

use geoset_common::{GeosetError, Result};
use serde::{Deserialize, Serialize};

use crate::driver::{DriverConfig, FlushThreshold};
use crate::pipeline::DEFAULT_RELAY_CAPACITY;

// ============================================================================
// Ingestion Configuration Constants
// ============================================================================

/// Default directory scanned for dataset files.
pub const DEFAULT_DATA_DIR: &str = "data";

/// Default reserved file name skipped during discovery.
pub const DEFAULT_MARKER_FILE: &str = ".gitignore";

/// Default number of entities per flushed batch.
pub const DEFAULT_BATCH_SIZE: usize = 3500;

/// Default database URL for local development.
pub const DEFAULT_DATABASE_URL: &str = "postgresql://localhost/geoset";

/// Default maximum database connections in the pool.
pub const DEFAULT_DATABASE_MAX_CONNECTIONS: u32 = 10;

/// Default minimum database connections in the pool.
pub const DEFAULT_DATABASE_MIN_CONNECTIONS: u32 = 2;

/// Default database connection timeout in seconds.
pub const DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default database idle timeout in seconds (10 minutes).
pub const DEFAULT_DATABASE_IDLE_TIMEOUT_SECS: u64 = 600;

/// Ingestion run configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    pub data_dir: PathBuf,
    pub marker_file: String,
    pub batch_size: usize,
    pub flush_threshold: FlushThreshold,
    pub relay_capacity: usize,
    pub database: DatabaseConfig,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_secs: u64,
    pub idle_timeout_secs: u64,
}

impl IngestConfig {
    /// Load configuration from `.env`, the environment and defaults
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self::from_env()?;
        config.validate()?;

        Ok(config)
    }

    /// Read environment variables over the defaults without validating
    pub fn from_env() -> Result<Self> {
        let flush_threshold = match std::env::var("GEOSET_FLUSH_THRESHOLD") {
            Ok(value) => FlushThreshold::from_str(&value).map_err(GeosetError::Config)?,
            Err(_) => FlushThreshold::default(),
        };

        Ok(Self {
            data_dir: std::env::var("GEOSET_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_DATA_DIR)),
            marker_file: std::env::var("GEOSET_MARKER_FILE")
                .unwrap_or_else(|_| DEFAULT_MARKER_FILE.to_string()),
            batch_size: env_parse("GEOSET_BATCH_SIZE", DEFAULT_BATCH_SIZE),
            flush_threshold,
            relay_capacity: env_parse("GEOSET_RELAY_CAPACITY", DEFAULT_RELAY_CAPACITY),
            database: DatabaseConfig {
                url: std::env::var("DATABASE_URL")
                    .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string()),
                max_connections: env_parse(
                    "DATABASE_MAX_CONNECTIONS",
                    DEFAULT_DATABASE_MAX_CONNECTIONS,
                ),
                min_connections: env_parse(
                    "DATABASE_MIN_CONNECTIONS",
                    DEFAULT_DATABASE_MIN_CONNECTIONS,
                ),
                connect_timeout_secs: env_parse(
                    "DATABASE_CONNECT_TIMEOUT",
                    DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS,
                ),
                idle_timeout_secs: env_parse(
                    "DATABASE_IDLE_TIMEOUT",
                    DEFAULT_DATABASE_IDLE_TIMEOUT_SECS,
                ),
            },
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(GeosetError::config("Batch size must be greater than 0"));
        }

        if self.flush_threshold == FlushThreshold::OneShort && self.batch_size < 2 {
            return Err(GeosetError::config(
                "Batch size must be at least 2 with the one-short flush threshold",
            ));
        }

        if self.relay_capacity == 0 {
            return Err(GeosetError::config("Relay capacity must be greater than 0"));
        }

        if self.marker_file.is_empty() {
            tracing::warn!("No marker file configured - every regular file will be considered");
        }

        self.database.validate()
    }

    pub fn driver_config(&self) -> DriverConfig {
        DriverConfig {
            batch_size: self.batch_size,
            threshold: self.flush_threshold,
        }
    }
}

impl DatabaseConfig {
    pub fn validate(&self) -> Result<()> {
        if self.url.is_empty() {
            return Err(GeosetError::config("Database URL cannot be empty"));
        }

        if self.max_connections == 0 {
            return Err(GeosetError::config(
                "Database max_connections must be greater than 0",
            ));
        }

        if self.min_connections > self.max_connections {
            return Err(GeosetError::Config(format!(
                "Database min_connections ({}) cannot be greater than max_connections ({})",
                self.min_connections, self.max_connections
            )));
        }

        Ok(())
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            marker_file: DEFAULT_MARKER_FILE.to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
            flush_threshold: FlushThreshold::default(),
            relay_capacity: DEFAULT_RELAY_CAPACITY,
            database: DatabaseConfig::default(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_DATABASE_URL.to_string(),
            max_connections: DEFAULT_DATABASE_MAX_CONNECTIONS,
            min_connections: DEFAULT_DATABASE_MIN_CONNECTIONS,
            connect_timeout_secs: DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS,
            idle_timeout_secs: DEFAULT_DATABASE_IDLE_TIMEOUT_SECS,
        }
    }
}

fn env_parse<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serial_test::serial;

    const KEYS: &[&str] = &[
        "GEOSET_DATA_DIR",
        "GEOSET_MARKER_FILE",
        "GEOSET_BATCH_SIZE",
        "GEOSET_FLUSH_THRESHOLD",
        "GEOSET_RELAY_CAPACITY",
        "DATABASE_URL",
        "DATABASE_MAX_CONNECTIONS",
        "DATABASE_MIN_CONNECTIONS",
    ];

    fn clear_env() {
        for key in KEYS {
            std::env::remove_var(key);
        }
    }

    #[test]
    fn test_default_config() {
        let config = IngestConfig::default();
        assert_eq!(config.data_dir, PathBuf::from("data"));
        assert_eq!(config.marker_file, ".gitignore");
        assert_eq!(config.batch_size, 3500);
        assert_eq!(config.flush_threshold, FlushThreshold::Full);
        assert_eq!(config.relay_capacity, 100);
        assert!(config.validate().is_ok());
    }

    #[test]
    #[serial]
    fn test_config_from_env() {
        clear_env();
        std::env::set_var("GEOSET_DATA_DIR", "/srv/datasets");
        std::env::set_var("GEOSET_BATCH_SIZE", "250");
        std::env::set_var("GEOSET_FLUSH_THRESHOLD", "one-short");
        std::env::set_var("DATABASE_MAX_CONNECTIONS", "4");

        let config = IngestConfig::from_env().unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/srv/datasets"));
        assert_eq!(config.batch_size, 250);
        assert_eq!(config.flush_threshold, FlushThreshold::OneShort);
        assert_eq!(config.database.max_connections, 4);
        assert_eq!(config.relay_capacity, DEFAULT_RELAY_CAPACITY);

        clear_env();
    }

    #[test]
    #[serial]
    fn test_invalid_threshold_is_rejected() {
        clear_env();
        std::env::set_var("GEOSET_FLUSH_THRESHOLD", "sometimes");

        assert!(matches!(IngestConfig::from_env(), Err(GeosetError::Config(_))));

        clear_env();
    }

    #[test]
    #[serial]
    fn test_unparsable_numbers_fall_back_to_defaults() {
        clear_env();
        std::env::set_var("GEOSET_BATCH_SIZE", "lots");

        let config = IngestConfig::from_env().unwrap();
        assert_eq!(config.batch_size, DEFAULT_BATCH_SIZE);

        clear_env();
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = IngestConfig {
            batch_size: 0,
            ..IngestConfig::default()
        };
        assert!(config.validate().is_err());

        let config = IngestConfig {
            batch_size: 1,
            flush_threshold: FlushThreshold::OneShort,
            ..IngestConfig::default()
        };
        assert!(config.validate().is_err());

        let config = IngestConfig {
            relay_capacity: 0,
            ..IngestConfig::default()
        };
        assert!(config.validate().is_err());

        let mut config = IngestConfig::default();
        config.database.min_connections = 20;
        assert!(config.validate().is_err());

        let mut config = IngestConfig::default();
        config.database.url.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_driver_config() {
        let config = IngestConfig {
            batch_size: 10,
            flush_threshold: FlushThreshold::OneShort,
            ..IngestConfig::default()
        };
        let driver = config.driver_config();
        assert_eq!(driver.batch_size, 10);
        assert_eq!(driver.threshold, FlushThreshold::OneShort);
    }
}
