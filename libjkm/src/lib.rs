//! jkm - a terminal mail client
//!
//! This library provides the mail-facing half of jkm: configuration,
//! domain types and the transport boundary used to list, read and send
//! messages over IMAP/SMTP (or an in-memory fixture).

pub mod config;
pub mod error;
pub mod logging;
pub mod transport;
pub mod types;

// Re-export commonly used types
pub use config::Config;
pub use error::{ConfigError, JkmError, Result, TransportError};
pub use transport::{MailTransport, TransportFactory};
pub use types::{Draft, Message, MessageHeader, MessageId, OutgoingMessage};
