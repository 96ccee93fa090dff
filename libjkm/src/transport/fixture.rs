//! In-memory transport for tests and offline demos
//!
//! Serves a fixed mailbox without any network access. Failures and latency
//! can be injected to exercise the client's error and concurrency paths,
//! and every call is counted so tests can assert on what was dispatched.

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::sleep;

use super::MailTransport;
use crate::error::{Result, TransportError};
use crate::types::{Message, MessageHeader, MessageId, OutgoingMessage};

pub const FIXTURE_BODY: &str =
    "This is a very real email.\nIt is also a very good email.\n\nAll the best,\n\t-Sender";

#[derive(Default)]
struct FixtureState {
    /// Newest first
    inbox: Vec<Message>,
    outbox: Vec<OutgoingMessage>,
    list_error: Option<TransportError>,
    read_error: Option<TransportError>,
    send_error: Option<TransportError>,
    delay: Duration,
}

/// Fixture mailbox
#[derive(Default)]
pub struct FixtureTransport {
    state: Mutex<FixtureState>,
    list_calls: AtomicUsize,
    read_calls: AtomicUsize,
    send_calls: AtomicUsize,
    disconnect_calls: AtomicUsize,
    builds: AtomicUsize,
}

impl FixtureTransport {
    /// A mailbox holding three sample messages
    pub fn new() -> Self {
        Self::with_headers(sample_headers())
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// A mailbox holding `headers` (kept in the given order), each with the
    /// stock fixture body
    pub fn with_headers(headers: Vec<MessageHeader>) -> Self {
        let inbox = headers
            .into_iter()
            .map(|header| Message {
                header,
                body: FIXTURE_BODY.to_string(),
            })
            .collect();
        Self {
            state: Mutex::new(FixtureState {
                inbox,
                ..FixtureState::default()
            }),
            ..Self::default()
        }
    }

    fn state(&self) -> MutexGuard<'_, FixtureState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Replace the mailbox contents (simulates external changes)
    pub fn set_messages(&self, messages: Vec<Message>) {
        self.state().inbox = messages;
    }

    /// Deliver a message at the top of the inbox
    pub fn deliver(&self, message: Message) {
        self.state().inbox.insert(0, message);
    }

    /// Remove a message (simulates deletion by another client)
    pub fn remove(&self, id: MessageId) {
        self.state().inbox.retain(|m| m.header.id != id);
    }

    pub fn set_list_error(&self, error: Option<TransportError>) {
        self.state().list_error = error;
    }

    pub fn set_read_error(&self, error: Option<TransportError>) {
        self.state().read_error = error;
    }

    pub fn set_send_error(&self, error: Option<TransportError>) {
        self.state().send_error = error;
    }

    /// Latency applied before every operation
    pub fn set_delay(&self, delay: Duration) {
        self.state().delay = delay;
    }

    pub fn outbox(&self) -> Vec<OutgoingMessage> {
        self.state().outbox.clone()
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn read_calls(&self) -> usize {
        self.read_calls.load(Ordering::SeqCst)
    }

    pub fn send_calls(&self) -> usize {
        self.send_calls.load(Ordering::SeqCst)
    }

    pub fn disconnect_calls(&self) -> usize {
        self.disconnect_calls.load(Ordering::SeqCst)
    }

    /// How many times a factory handed this fixture out
    pub fn builds(&self) -> usize {
        self.builds.load(Ordering::SeqCst)
    }

    pub(crate) fn record_build(&self) {
        self.builds.fetch_add(1, Ordering::SeqCst);
    }

    async fn simulate_latency(&self) {
        let delay = self.state().delay;
        if !delay.is_zero() {
            sleep(delay).await;
        }
    }
}

#[async_trait]
impl MailTransport for FixtureTransport {
    async fn list_headers(&self, _force_refresh: bool) -> Result<Vec<MessageHeader>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.simulate_latency().await;

        let state = self.state();
        if let Some(err) = &state.list_error {
            return Err(err.clone().into());
        }
        Ok(state.inbox.iter().map(|m| m.header.clone()).collect())
    }

    async fn read_body(&self, id: MessageId) -> Result<Message> {
        self.read_calls.fetch_add(1, Ordering::SeqCst);
        self.simulate_latency().await;

        let state = self.state();
        if let Some(err) = &state.read_error {
            return Err(err.clone().into());
        }
        state
            .inbox
            .iter()
            .find(|m| m.header.matches(id))
            .cloned()
            .ok_or_else(|| TransportError::NotFound(id).into())
    }

    async fn send(&self, message: &OutgoingMessage) -> Result<()> {
        self.send_calls.fetch_add(1, Ordering::SeqCst);
        self.simulate_latency().await;

        let mut state = self.state();
        if let Some(err) = &state.send_error {
            return Err(err.clone().into());
        }
        state.outbox.push(message.clone());
        tracing::debug!(to = ?message.to, subject = %message.subject, "fixture accepted message");
        Ok(())
    }

    async fn count_messages(&self) -> Result<usize> {
        Ok(self.state().inbox.len())
    }

    async fn disconnect(&self) -> Result<()> {
        self.disconnect_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// The stock fixture inbox, newest first
pub fn sample_headers() -> Vec<MessageHeader> {
    let now = Utc::now();
    vec![
        MessageHeader {
            id: MessageId(3),
            from: "bob@example.com".to_string(),
            to: vec!["alice@example.com".to_string()],
            subject: "Re: Hello World".to_string(),
            date: now - ChronoDuration::hours(6),
        },
        MessageHeader {
            id: MessageId(2),
            from: "carol@example.com".to_string(),
            to: vec!["alice@example.com".to_string(), "bob@example.com".to_string()],
            subject: "Meeting Tomorrow".to_string(),
            date: now - ChronoDuration::hours(12),
        },
        MessageHeader {
            id: MessageId(1),
            from: "alice@example.com".to_string(),
            to: vec!["bob@example.com".to_string()],
            subject: "Hello World".to_string(),
            date: now - ChronoDuration::hours(24),
        },
    ]
}
