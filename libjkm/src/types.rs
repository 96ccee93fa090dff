//! Core domain types for jkm

use chrono::{DateTime, Utc};
use std::fmt;

/// Server-assigned message identifier (the IMAP UID).
///
/// Stable across refreshes, which is what makes it usable as the unit of
/// identity for list selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MessageId(pub u32);

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for MessageId {
    fn from(uid: u32) -> Self {
        Self(uid)
    }
}

/// Metadata-only summary of a message, used for list display
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageHeader {
    pub id: MessageId,
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub date: DateTime<Utc>,
}

impl MessageHeader {
    /// Recipients joined for display
    pub fn recipients(&self) -> String {
        self.to.join(", ")
    }

    pub fn matches(&self, id: MessageId) -> bool {
        self.id == id
    }
}

/// A header plus its (lazily fetched) body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub header: MessageHeader,
    pub body: String,
}

/// A message on its way out through SMTP
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub body: String,
}

/// The three fields captured by the compose flow
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Draft {
    pub recipient: String,
    pub subject: String,
    pub body: String,
}

impl Draft {
    pub fn new(
        recipient: impl Into<String>,
        subject: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            recipient: recipient.into(),
            subject: subject.into(),
            body: body.into(),
        }
    }

    /// Individual addresses from the comma-separated recipient field
    pub fn recipients(&self) -> Vec<String> {
        self.recipient
            .split(',')
            .map(str::trim)
            .filter(|addr| !addr.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Build the outgoing message, sent from `from`
    pub fn into_outgoing(self, from: impl Into<String>) -> OutgoingMessage {
        let to = self.recipients();
        OutgoingMessage {
            from: from.into(),
            to,
            subject: self.subject,
            body: self.body,
        }
    }
}
