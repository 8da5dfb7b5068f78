use thiserror::Error;

/// Main error type for the BayesTune system
#[derive(Error, Debug)]
pub enum BtError {
    #[error("Acquisition error: {0}")]
    Acquisition(#[from] AcquisitionError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Acquisition-related errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AcquisitionError {
    #[error("{strategy} requires a run-local random source, but none was configured")]
    MissingRandomSource { strategy: String },
}

/// Result type alias for BayesTune operations
pub type BtResult<T> = Result<T, BtError>;

/// Macro for creating validation errors
#[macro_export]
macro_rules! validation_error {
    ($($arg:tt)*) => {
        $crate::BtError::Validation(format!($($arg)*))
    };
}

/// Macro for creating configuration errors
#[macro_export]
macro_rules! config_error {
    ($($arg:tt)*) => {
        $crate::BtError::Config(format!($($arg)*))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = AcquisitionError::MissingRandomSource {
            strategy: "thompson_sampling".to_string(),
        };

        assert!(error.to_string().contains("thompson_sampling"));
        assert!(error.to_string().contains("random source"));
    }

    #[test]
    fn test_error_conversion() {
        let acq_error = AcquisitionError::MissingRandomSource {
            strategy: "thompson_sampling".to_string(),
        };
        let bt_error: BtError = acq_error.into();

        match bt_error {
            BtError::Acquisition(_) => (),
            _ => panic!("Expected Acquisition error"),
        }
    }

    #[test]
    fn test_macros() {
        let validation_err = validation_error!("Invalid value: {}", 42);
        assert!(matches!(validation_err, BtError::Validation(ref m) if m == "Invalid value: 42"));

        let config_err = config_error!("Missing required field: {}", "iterations");
        assert_eq!(
            config_err.to_string(),
            "Configuration error: Missing required field: iterations"
        );
    }
}
