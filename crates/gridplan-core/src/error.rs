//! Error type shared by the planning crates.
//!
//! [`GridplanError`] covers everything that can go wrong before a model
//! reaches the solver: malformed codes and steps, inconsistent network data
//! and unreadable configuration.

use thiserror::Error;

/// Unified error type for network and configuration handling.
#[derive(Error, Debug)]
pub enum GridplanError {
    /// I/O errors (file access)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Parsing/deserialization errors
    #[error("Parse error: {0}")]
    Parse(String),

    /// Data validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic errors (for wrapping external errors)
    #[error("{0}")]
    Other(String),
}

/// Convenience type alias for Results using GridplanError.
pub type GridplanResult<T> = Result<T, GridplanError>;

impl From<anyhow::Error> for GridplanError {
    fn from(err: anyhow::Error) -> Self {
        GridplanError::Other(err.to_string())
    }
}

impl From<serde_json::Error> for GridplanError {
    fn from(err: serde_json::Error) -> Self {
        GridplanError::Parse(err.to_string())
    }
}

impl From<toml::de::Error> for GridplanError {
    fn from(err: toml::de::Error) -> Self {
        GridplanError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = GridplanError::Validation("code 'ELN' has 3 characters".into());
        assert_eq!(err.to_string(), "Validation error: code 'ELN' has 3 characters");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "network.json");
        let err: GridplanError = io_err.into();
        assert!(matches!(err, GridplanError::Io(_)));
    }

    #[test]
    fn test_json_error_conversion() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: GridplanError = parse_err.into();
        assert!(matches!(err, GridplanError::Parse(_)));
    }
}
