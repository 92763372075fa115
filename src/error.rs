use thiserror::Error;

use crate::checkpoint::StorageError;
use crate::lookup::LookupError;

#[derive(Debug, Error)]
pub enum CheckerError {
    #[error("Input error: {0}")]
    Input(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("No saved session found for key `{0}`.")]
    NoSession(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Lookup client error: {0}")]
    Lookup(#[from] LookupError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_and_config_errors_display() {
        assert_eq!(
            CheckerError::Input("no identifiers to check".into()).to_string(),
            "Input error: no identifiers to check"
        );
        assert_eq!(
            CheckerError::Config("min delay 9s exceeds max delay 3s".into()).to_string(),
            "Config error: min delay 9s exceeds max delay 3s"
        );
    }

    #[test]
    fn storage_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: CheckerError = StorageError::from(io).into();
        assert!(matches!(err, CheckerError::Storage(_)));
    }
}
