//! Error types for geoset

use thiserror::Error;

/// Result type alias for geoset operations
pub type Result<T> = std::result::Result<T, GeosetError>;

/// Error type shared across the workspace
#[derive(Error, Debug)]
pub enum GeosetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl GeosetError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_message() {
        let err = GeosetError::config("Batch size must be greater than 0");
        assert_eq!(
            err.to_string(),
            "Configuration error: Batch size must be greater than 0"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "data");
        let err: GeosetError = io.into();
        assert!(matches!(err, GeosetError::Io(_)));
    }
}
