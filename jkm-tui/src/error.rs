//! Error types for jkm-tui
//!
//! Provides TUI-specific error types that wrap mail library errors
//! and terminal/IO errors for unified error handling.

use thiserror::Error;

/// TUI-specific errors
#[derive(Error, Debug)]
pub enum TuiError {
    /// Mail library error
    #[error("Service error: {0}")]
    Service(#[from] libjkm::JkmError),

    /// Terminal/IO error
    #[error("Terminal error: {0}")]
    Terminal(#[from] std::io::Error),

    /// Application state error
    #[error("Application error: {0}")]
    Application(String),

    /// Event handling error
    #[error("Event error: {0}")]
    Event(String),
}

impl TuiError {
    /// Process exit code for this error; never zero
    pub fn exit_code(&self) -> i32 {
        match self {
            TuiError::Service(e) => e.exit_code(),
            _ => 1,
        }
    }
}

/// Result type for TUI operations
pub type Result<T> = std::result::Result<T, TuiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use libjkm::{ConfigError, JkmError};

    #[test]
    fn test_exit_codes_are_non_zero() {
        let errors = vec![
            TuiError::Terminal(std::io::Error::new(std::io::ErrorKind::Other, "tty")),
            TuiError::Application("boom".to_string()),
            TuiError::Event("closed".to_string()),
            TuiError::Service(JkmError::Config(ConfigError::MissingField("email".to_string()))),
        ];

        for err in errors {
            assert_ne!(err.exit_code(), 0, "{}", err);
        }
    }

    #[test]
    fn test_service_error_display() {
        let err: TuiError = JkmError::InvalidInput("bad".to_string()).into();
        assert!(err.to_string().starts_with("Service error:"));
        assert_eq!(err.exit_code(), 3);
    }
}
