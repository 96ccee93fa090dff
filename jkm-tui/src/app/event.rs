//! Event vocabulary
//!
//! Every input, timer firing and background completion reaches the router
//! as one of these. The event loop consumes them one at a time, in arrival
//! order.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use libjkm::{Config, Draft, Message, MessageHeader, MessageId};

/// Events that flow through the event loop
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    // === Terminal ===
    /// Keyboard input (press events only)
    Key(KeyEvent),

    /// Terminal resize
    Resize(u16, u16),

    // === Timers ===
    /// Periodic background refresh
    Tick,

    /// Sending view's spinner timer
    SpinnerTick,

    // === Mode changes ===
    ShowList,
    ShowCompose,
    ShowRead(MessageHeader),

    // === Data arrival ===
    ListRefreshed(Vec<MessageHeader>),
    BodyFetched { id: MessageId, body: String },
    FullMessageFetched(Message),

    // === Outbound send ===
    SendRequested(Draft),
    SendSucceeded,
    SendFailed(String),

    /// Setup completed with a new configuration
    Configured(Config),

    /// Any unrecoverable operation error
    Failure(String),
}

impl Event {
    /// Short name for log fields
    pub fn name(&self) -> &'static str {
        match self {
            Event::Key(_) => "key",
            Event::Resize(..) => "resize",
            Event::Tick => "tick",
            Event::SpinnerTick => "spinner_tick",
            Event::ShowList => "show_list",
            Event::ShowCompose => "show_compose",
            Event::ShowRead(_) => "show_read",
            Event::ListRefreshed(_) => "list_refreshed",
            Event::BodyFetched { .. } => "body_fetched",
            Event::FullMessageFetched(_) => "full_message_fetched",
            Event::SendRequested(_) => "send_requested",
            Event::SendSucceeded => "send_succeeded",
            Event::SendFailed(_) => "send_failed",
            Event::Configured(_) => "configured",
            Event::Failure(_) => "failure",
        }
    }

    /// Whether this is the global quit chord (Ctrl+C)
    pub fn is_quit_chord(&self) -> bool {
        matches!(
            self,
            Event::Key(KeyEvent {
                code: KeyCode::Char('c'),
                modifiers,
                ..
            }) if modifiers.contains(KeyModifiers::CONTROL)
        )
    }
}

impl From<KeyEvent> for Event {
    fn from(key: KeyEvent) -> Self {
        Event::Key(key)
    }
}
