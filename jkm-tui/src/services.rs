//! Command executor
//!
//! Bridges the synchronous event loop and async transport work.
//!
//! # Architecture
//!
//! - `ServiceHandle` owns a tokio runtime and the event loop's inbox, a
//!   crossbeam channel
//! - `dispatch` turns a [`Command`] into spawned work and returns at once
//! - every task re-enters the loop as exactly one [`Event`] on the inbox
//! - the terminal input thread feeds the same inbox via [`ServiceHandle::sender`]
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use jkm_tui::app::{Command, Task};
//! use jkm_tui::services::ServiceHandle;
//! use libjkm::transport::fixture::FixtureTransport;
//! use libjkm::MailTransport;
//!
//! # fn example() -> jkm_tui::error::Result<()> {
//! let services = ServiceHandle::new()?;
//! let transport: Arc<dyn MailTransport> = Arc::new(FixtureTransport::new());
//!
//! services.dispatch(
//!     Command::Task(Task::ListHeaders { force_refresh: true }),
//!     Some(transport),
//! );
//!
//! // In the event loop, drain the inbox
//! if let Some(event) = services.recv() {
//!     println!("{:?}", event);
//! }
//! # Ok(())
//! # }
//! ```

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use futures::future::BoxFuture;
use futures::FutureExt;

use libjkm::MailTransport;

use crate::app::command::{perform, Command, Task};
use crate::app::event::Event;
use crate::error::Result;

/// Service handle for TUI operations
///
/// Uses a tokio runtime to run transport work without blocking the UI.
pub struct ServiceHandle {
    runtime: tokio::runtime::Runtime,
    event_tx: Sender<Event>,
    event_rx: Receiver<Event>,
}

impl ServiceHandle {
    /// Create a new service handle
    ///
    /// # Errors
    ///
    /// Returns an error if the tokio runtime cannot be created.
    pub fn new() -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .thread_name("jkm-worker")
            .build()?;
        let (event_tx, event_rx) = unbounded();

        Ok(Self {
            runtime,
            event_tx,
            event_rx,
        })
    }

    /// Sender half of the inbox, for other event producers
    pub fn sender(&self) -> Sender<Event> {
        self.event_tx.clone()
    }

    /// Start executing `command`; never blocks
    pub fn dispatch(&self, command: Command, transport: Option<Arc<dyn MailTransport>>) {
        match command {
            Command::None | Command::Quit => {}
            Command::Emit(event) => self.emit(event),
            Command::Batch(children) => {
                for child in children {
                    self.dispatch(child, transport.clone());
                }
            }
            other => {
                let tx = self.event_tx.clone();
                self.runtime.spawn(run(other, transport, tx));
            }
        }
    }

    fn emit(&self, event: Event) {
        if self.event_tx.send(event).is_err() {
            tracing::warn!("event inbox closed");
        }
    }

    /// Block until the next event
    pub fn recv(&self) -> Option<Event> {
        self.event_rx.recv().ok()
    }

    pub fn try_recv(&self) -> Option<Event> {
        self.event_rx.try_recv().ok()
    }

    /// Wait up to `timeout` for the next event
    pub fn recv_timeout(&self, timeout: Duration) -> Result<Option<Event>> {
        match self.event_rx.recv_timeout(timeout) {
            Ok(event) => Ok(Some(event)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => {
                Err(crate::error::TuiError::Event("event inbox disconnected".to_string()))
            }
        }
    }

    /// Run a future to completion on the runtime (shutdown work)
    pub fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }
}

/// Execute a command inside the runtime, sending resulting events to `tx`
///
/// `Sequence` children are awaited in order so their events arrive in that
/// order; `Batch` children nested anywhere run concurrently.
fn run(
    command: Command,
    transport: Option<Arc<dyn MailTransport>>,
    tx: Sender<Event>,
) -> BoxFuture<'static, ()> {
    async move {
        match command {
            Command::None | Command::Quit => {}
            Command::Emit(event) => send(&tx, event),
            Command::Task(task) => send(&tx, perform_caught(task, transport).await),
            Command::ScheduleTick(delay) => {
                tokio::time::sleep(delay).await;
                send(&tx, Event::Tick);
            }
            Command::ScheduleSpinner(delay) => {
                tokio::time::sleep(delay).await;
                send(&tx, Event::SpinnerTick);
            }
            Command::Batch(children) => {
                let runs = children
                    .into_iter()
                    .map(|child| run(child, transport.clone(), tx.clone()));
                futures::future::join_all(runs).await;
            }
            Command::Sequence(children) => {
                for child in children {
                    run(child, transport.clone(), tx.clone()).await;
                }
            }
        }
    }
    .boxed()
}

/// [`perform`], with a panic in the transport turned into the task's
/// failure event so the loop always hears back
async fn perform_caught(task: Task, transport: Option<Arc<dyn MailTransport>>) -> Event {
    let name = task.name();
    let is_send = matches!(task, Task::Send(_));

    match AssertUnwindSafe(perform(task, transport)).catch_unwind().await {
        Ok(event) => event,
        Err(payload) => {
            let message = format!("{} panicked: {}", name, panic_message(payload.as_ref()));
            tracing::error!(task = name, error = %message, "task panicked");
            if is_send {
                Event::SendFailed(message)
            } else {
                Event::Failure(message)
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown panic"
    }
}

fn send(tx: &Sender<Event>, event: Event) {
    if tx.send(event).is_err() {
        tracing::debug!("event inbox closed, dropping completion");
    }
}
