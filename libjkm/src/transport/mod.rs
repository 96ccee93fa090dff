//! Mail-transport abstraction and implementations
//!
//! The client never speaks IMAP or SMTP itself. Everything it needs from the
//! mailbox goes through [`MailTransport`], which has two implementations:
//!
//! - [`imap::ImapSmtpTransport`]: a real network client
//! - [`fixture::FixtureTransport`]: fixed in-memory data for tests and demos
//!
//! The UI must behave identically under either.
//!
//! # Examples
//!
//! ```no_run
//! use libjkm::transport::{fixture::FixtureTransport, MailTransport};
//!
//! # async fn example() -> libjkm::error::Result<()> {
//! let transport = FixtureTransport::new();
//!
//! let headers = transport.list_headers(false).await?;
//! if let Some(newest) = headers.first() {
//!     let message = transport.read_body(newest.id).await?;
//!     println!("{}: {}", message.header.subject, message.body);
//! }
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::Config;
use crate::error::Result;
use crate::types::{Message, MessageId, MessageHeader, OutgoingMessage};

pub mod fixture;
pub mod imap;

/// Operations the client consumes from the mail server
///
/// All methods take `&self`; implementations serialize their own network
/// I/O. Callers share one handle across every view and background command.
#[async_trait]
pub trait MailTransport: Send + Sync {
    /// List inbox headers, newest first by server-assigned sequence
    ///
    /// Safe to call repeatedly. `force_refresh` discards any cached view of
    /// the mailbox before listing.
    async fn list_headers(&self, force_refresh: bool) -> Result<Vec<MessageHeader>>;

    /// Fetch one message with its body
    async fn read_body(&self, id: MessageId) -> Result<Message>;

    /// Send a message through SMTP
    async fn send(&self, message: &OutgoingMessage) -> Result<()>;

    /// Number of messages currently in the inbox
    async fn count_messages(&self) -> Result<usize>;

    /// Close any open connection
    async fn disconnect(&self) -> Result<()>;
}

/// Builds the transport handle for a configuration
///
/// The router keeps a factory so the handle can be created lazily (after
/// setup completes, for instance) and still at most once per process.
pub trait TransportFactory: Send + Sync {
    fn build(&self, config: &Config) -> Result<Arc<dyn MailTransport>>;
}

/// Factory for the real IMAP/SMTP client
#[derive(Debug, Default, Clone, Copy)]
pub struct ImapSmtpFactory;

impl TransportFactory for ImapSmtpFactory {
    fn build(&self, config: &Config) -> Result<Arc<dyn MailTransport>> {
        let transport = imap::ImapSmtpTransport::new(config)?;
        Ok(Arc::new(transport))
    }
}

/// Factory handing out a shared fixture transport
#[derive(Clone)]
pub struct FixtureFactory {
    transport: Arc<fixture::FixtureTransport>,
}

impl FixtureFactory {
    pub fn new(transport: Arc<fixture::FixtureTransport>) -> Self {
        Self { transport }
    }

    /// The fixture every built handle points to
    pub fn transport(&self) -> Arc<fixture::FixtureTransport> {
        Arc::clone(&self.transport)
    }
}

impl Default for FixtureFactory {
    fn default() -> Self {
        Self::new(Arc::new(fixture::FixtureTransport::new()))
    }
}

impl TransportFactory for FixtureFactory {
    fn build(&self, _config: &Config) -> Result<Arc<dyn MailTransport>> {
        self.transport.record_build();
        let transport: Arc<dyn MailTransport> = self.transport.clone();
        Ok(transport)
    }
}
