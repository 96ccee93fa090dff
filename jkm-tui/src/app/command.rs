//! Commands: deferred work described as data
//!
//! Views and the router never perform I/O. They return a [`Command`] saying
//! what should happen next, and the executor (see `services.rs`) carries it
//! out. Every [`Task`] completes with exactly one [`Event`].

use std::sync::Arc;
use std::time::Duration;

use libjkm::{JkmError, MailTransport, MessageId, OutgoingMessage, TransportError};

use super::event::Event;

/// Spinner frame interval for the Sending view
pub const SPINNER_INTERVAL: Duration = Duration::from_millis(100);

/// Work returned from an event handler
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Nothing to do
    None,

    /// Exit the event loop
    Quit,

    /// Feed an event straight back into the loop
    Emit(Event),

    /// Run a transport task in the background
    Task(Task),

    /// Emit `Tick` after a delay
    ScheduleTick(Duration),

    /// Emit `SpinnerTick` after a delay
    ScheduleSpinner(Duration),

    /// Run children concurrently
    Batch(Vec<Command>),

    /// Run children one after another; their events arrive in order
    Sequence(Vec<Command>),
}

/// A unit of work against the mail transport
#[derive(Debug, Clone, PartialEq)]
pub enum Task {
    ListHeaders { force_refresh: bool },
    FetchBody(MessageId),
    FetchMessage(MessageId),
    Send(OutgoingMessage),
}

impl Command {
    /// Concurrent group, with `None` entries removed
    ///
    /// Collapses to `None` when empty and to the single child when only one
    /// remains.
    pub fn batch(commands: impl IntoIterator<Item = Command>) -> Command {
        Self::group(commands, Command::Batch)
    }

    /// Ordered group, with `None` entries removed
    pub fn sequence(commands: impl IntoIterator<Item = Command>) -> Command {
        Self::group(commands, Command::Sequence)
    }

    fn group(
        commands: impl IntoIterator<Item = Command>,
        wrap: fn(Vec<Command>) -> Command,
    ) -> Command {
        let mut commands: Vec<Command> = commands
            .into_iter()
            .filter(|c| !matches!(c, Command::None))
            .collect();
        match commands.len() {
            0 => Command::None,
            1 => commands.remove(0),
            _ => wrap(commands),
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Command::None)
    }

    /// All tasks in this command tree, depth-first
    pub fn tasks(&self) -> Vec<&Task> {
        let mut out = Vec::new();
        self.collect_tasks(&mut out);
        out
    }

    fn collect_tasks<'a>(&'a self, out: &mut Vec<&'a Task>) {
        match self {
            Command::Task(task) => out.push(task),
            Command::Batch(children) | Command::Sequence(children) => {
                for child in children {
                    child.collect_tasks(out);
                }
            }
            _ => {}
        }
    }

    /// Whether this command tree contains `Quit`
    pub fn quits(&self) -> bool {
        match self {
            Command::Quit => true,
            Command::Batch(children) | Command::Sequence(children) => {
                children.iter().any(Command::quits)
            }
            _ => false,
        }
    }
}

impl Task {
    pub fn name(&self) -> &'static str {
        match self {
            Task::ListHeaders { .. } => "list_headers",
            Task::FetchBody(_) => "fetch_body",
            Task::FetchMessage(_) => "fetch_message",
            Task::Send(_) => "send",
        }
    }
}

/// Run one task to completion and turn its outcome into an event
///
/// Never fails: transport errors become `Failure` (or `SendFailed` for a
/// send), and a missing transport handle is reported as not connected.
pub async fn perform(task: Task, transport: Option<Arc<dyn MailTransport>>) -> Event {
    let Some(transport) = transport else {
        tracing::warn!(task = task.name(), "task dispatched without a transport");
        let message = TransportError::NotConnected.to_string();
        return match task {
            Task::Send(_) => Event::SendFailed(message),
            _ => Event::Failure(message),
        };
    };

    let name = task.name();
    let event = match task {
        Task::ListHeaders { force_refresh } => match transport.list_headers(force_refresh).await {
            Ok(headers) => Event::ListRefreshed(headers),
            Err(e) => Event::Failure(describe(e)),
        },
        Task::FetchBody(id) => match transport.read_body(id).await {
            Ok(message) => Event::BodyFetched {
                id,
                body: message.body,
            },
            Err(e) => Event::Failure(describe(e)),
        },
        Task::FetchMessage(id) => match transport.read_body(id).await {
            Ok(message) => Event::FullMessageFetched(message),
            Err(e) => Event::Failure(describe(e)),
        },
        Task::Send(message) => match transport.send(&message).await {
            Ok(()) => Event::SendSucceeded,
            Err(e) => Event::SendFailed(describe(e)),
        },
    };

    match &event {
        Event::Failure(error) | Event::SendFailed(error) => {
            tracing::error!(task = name, error = %error, "task failed");
        }
        _ => tracing::debug!(task = name, event = event.name(), "task completed"),
    }
    event
}

/// User-facing text for a library error
fn describe(error: JkmError) -> String {
    match error {
        JkmError::Transport(e) => e.to_string(),
        other => other.to_string(),
    }
}
