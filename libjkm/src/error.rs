//! Error types for jkm

use thiserror::Error;

use crate::types::MessageId;

pub type Result<T> = std::result::Result<T, JkmError>;

#[derive(Error, Debug)]
pub enum JkmError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl JkmError {
    /// Returns the appropriate exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            JkmError::InvalidInput(_) => 3,
            JkmError::Transport(TransportError::Authentication(_)) => 2,
            JkmError::Transport(_) => 1,
            JkmError::Config(_) => 1,
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: '{value}'")]
    InvalidValue { field: String, value: String },
}

/// Failures at the mail-transport boundary.
///
/// Cloneable so a failure can be rendered into an event payload and still be
/// logged by the command that produced it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Message {0} not found")]
    NotFound(MessageId),

    #[error("Sending failed: {0}")]
    Send(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Mail transport is not connected")]
    NotConnected,
}
