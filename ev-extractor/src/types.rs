//! Core error types for the EV extraction library
//!
//! The error taxonomy mirrors the boundaries of the pipeline: parse errors
//! while loading an events file, configuration errors in a condition spec,
//! data-integrity errors when resolved values are missing or non-numeric,
//! and unknown-task errors from the dispatcher. Empty grouping keys are not
//! errors and never surface here.

/// Result type for extraction operations
pub type Result<T> = std::result::Result<T, ExtractError>;

/// Errors that can occur during event loading and EV extraction
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("Failed to parse events file: {0}")]
    EventsParseError(String),

    #[error("Invalid condition spec: {0}")]
    ConfigError(String),

    #[error("Data integrity error: {0}")]
    DataIntegrityError(String),

    #[error("Unknown task: {0}")]
    UnknownTask(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl ExtractError {
    /// True if this error came from the static rule registry rather than
    /// the input data. Callers batching many (subject, task) units may want
    /// to abort on these instead of skipping the unit.
    pub fn is_config_error(&self) -> bool {
        matches!(self, ExtractError::ConfigError(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ExtractError::UnknownTask("Foo".to_string());
        assert_eq!(format!("{}", err), "Unknown task: Foo");

        let err = ExtractError::DataIntegrityError("bad column".to_string());
        assert!(format!("{}", err).contains("bad column"));
    }

    #[test]
    fn test_config_error_classification() {
        assert!(ExtractError::ConfigError("x".to_string()).is_config_error());
        assert!(!ExtractError::UnknownTask("x".to_string()).is_config_error());
    }
}
