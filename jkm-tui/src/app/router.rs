//! Router: the top-level state machine
//!
//! Owns the active mode and its view model, the shared transport handle and
//! the send-in-flight guard. Every event passes through [`Router::update`],
//! which either switches mode or forwards the event to the active view.
//!
//! # Transitions
//!
//! | Event | New mode | Command |
//! |---|---|---|
//! | `ShowList` | List | list fetch |
//! | `ShowRead(h)` | Read | body fetch for `h` |
//! | `ShowCompose` | Compose | none |
//! | `Failure(e)` | Error | none |
//! | `SendRequested(d)`, not sending | Sending | send + spinner |
//! | `SendRequested(d)`, sending | unchanged | none (dropped) |
//! | `SendSucceeded` from Sending/Compose | List | forced list fetch |
//! | `SendFailed(e)` | Error | none |
//! | `Configured(c)` | List | forced list fetch |
//! | `Tick` | unchanged | list fetch, next tick |
//! | Ctrl+C | unchanged | quit |
//!
//! Anything else goes to the active view unchanged.

use std::sync::Arc;

use ratatui::Frame;

use libjkm::{Config, Draft, MailTransport, TransportFactory};

use super::command::{Command, Task};
use super::event::Event;
use crate::error::Result;
use crate::views::{ComposeView, ErrorView, ListView, ReadView, SendingView, SetupView};

/// The single active top-level mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Setup,
    List,
    Read,
    Compose,
    Sending,
    Error,
}

/// The active view model, tagged by mode
pub enum View {
    Setup(SetupView),
    List(ListView),
    Read(ReadView),
    Compose(ComposeView),
    Sending(SendingView),
    Error(ErrorView),
}

impl View {
    pub fn mode(&self) -> Mode {
        match self {
            View::Setup(_) => Mode::Setup,
            View::List(_) => Mode::List,
            View::Read(_) => Mode::Read,
            View::Compose(_) => Mode::Compose,
            View::Sending(_) => Mode::Sending,
            View::Error(_) => Mode::Error,
        }
    }

    fn init(&self) -> Command {
        match self {
            View::Setup(v) => v.init(),
            View::List(v) => v.init(),
            View::Read(v) => v.init(),
            View::Compose(v) => v.init(),
            View::Sending(v) => v.init(),
            View::Error(v) => v.init(),
        }
    }

    fn update(&mut self, event: &Event) -> Command {
        match self {
            View::Setup(v) => v.update(event),
            View::List(v) => v.update(event),
            View::Read(v) => v.update(event),
            View::Compose(v) => v.update(event),
            View::Sending(v) => v.update(event),
            View::Error(v) => v.update(event),
        }
    }

    fn render(&self, frame: &mut Frame) {
        let area = frame.area();
        match self {
            View::Setup(v) => v.render(frame, area),
            View::List(v) => v.render(frame, area),
            View::Read(v) => v.render(frame, area),
            View::Compose(v) => v.render(frame, area),
            View::Sending(v) => v.render(frame, area),
            View::Error(v) => v.render(frame, area),
        }
    }
}

pub struct Router {
    config: Config,
    factory: Arc<dyn TransportFactory>,
    transport: Option<Arc<dyn MailTransport>>,
    /// Set once the factory has produced the handle
    transport_built: bool,
    view: View,
    /// Send-in-flight guard
    sending: bool,
    pending: Option<Draft>,
    should_quit: bool,
}

impl Router {
    /// Create the router for a loaded configuration
    ///
    /// Starts in Setup when the configuration is incomplete. Otherwise the
    /// transport is built now and the router starts in List; a build
    /// failure is returned.
    pub fn new(config: Config, factory: Arc<dyn TransportFactory>) -> Result<Self> {
        let view = if config.is_complete() {
            View::List(ListView::new())
        } else {
            View::Setup(SetupView::new(&config))
        };

        let mut router = Self {
            config,
            factory,
            transport: None,
            transport_built: false,
            view,
            sending: false,
            pending: None,
            should_quit: false,
        };

        if router.mode() == Mode::List {
            router.ensure_transport()?;
        }

        tracing::info!(mode = ?router.mode(), "router created");
        Ok(router)
    }

    /// Startup commands: the initial fetch (or setup) plus the first tick
    pub fn init(&self) -> Command {
        let startup = match &self.view {
            View::List(_) => Command::Task(Task::ListHeaders {
                force_refresh: true,
            }),
            other => other.init(),
        };
        Command::batch([startup, self.schedule_tick()])
    }

    /// Handle one event
    pub fn update(&mut self, event: Event) -> Command {
        if event.is_quit_chord() {
            tracing::info!(mode = ?self.mode(), "quit requested");
            self.should_quit = true;
            return Command::Quit;
        }

        match event {
            Event::ShowList => self.enter_list(false),
            Event::ShowRead(header) => self.enter(View::Read(ReadView::new(header))),
            Event::ShowCompose => self.enter(View::Compose(ComposeView::new())),
            Event::Failure(message) => self.enter_error(message),
            Event::Configured(config) => self.configure(config),
            Event::SendRequested(draft) => self.request_send(draft),
            Event::SendSucceeded => self.send_succeeded(),
            Event::SendFailed(message) => {
                tracing::warn!(error = %message, "send failed");
                self.sending = false;
                self.pending = None;
                self.enter_error(message)
            }
            Event::Tick => self.tick(),
            other => self.forward(&other),
        }
    }

    pub fn render(&self, frame: &mut Frame) {
        self.view.render(frame);
    }

    pub fn mode(&self) -> Mode {
        self.view.mode()
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn is_sending(&self) -> bool {
        self.sending
    }

    /// Draft held while a send is in flight
    pub fn pending_draft(&self) -> Option<&Draft> {
        self.pending.as_ref()
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// Shared transport handle for the executor
    pub fn transport(&self) -> Option<Arc<dyn MailTransport>> {
        self.transport.clone()
    }

    /// Take the transport for shutdown; `None` on every later call
    pub fn release_transport(&mut self) -> Option<Arc<dyn MailTransport>> {
        self.transport.take()
    }

    fn schedule_tick(&self) -> Command {
        Command::ScheduleTick(self.config.refresh_interval())
    }

    /// Build the transport unless it has been built already
    fn ensure_transport(&mut self) -> libjkm::Result<()> {
        if self.transport_built {
            return Ok(());
        }
        let transport = self.factory.build(&self.config)?;
        self.transport = Some(transport);
        self.transport_built = true;
        tracing::info!("mail transport created");
        Ok(())
    }

    /// Swap in a new view and run its startup command
    fn enter(&mut self, view: View) -> Command {
        let from = self.mode();
        self.view = view;
        let command = self.view.init();
        tracing::info!(
            from = ?from,
            to = ?self.mode(),
            tasks = command.tasks().len(),
            "mode transition"
        );
        command
    }

    fn enter_list(&mut self, force_refresh: bool) -> Command {
        if let Err(e) = self.ensure_transport() {
            tracing::error!(error = %e, "could not create mail transport");
            return self.enter_error(e.to_string());
        }

        let command = self.enter(View::List(ListView::new()));
        if force_refresh {
            Command::Task(Task::ListHeaders {
                force_refresh: true,
            })
        } else {
            command
        }
    }

    fn enter_error(&mut self, message: String) -> Command {
        tracing::error!(error = %message, mode = ?self.mode(), "entering error mode");
        self.enter(View::Error(ErrorView::new(message)))
    }

    fn configure(&mut self, config: Config) -> Command {
        tracing::info!(email = %config.email_address, "configuration updated");
        self.config = config;
        self.enter_list(true)
    }

    fn request_send(&mut self, draft: Draft) -> Command {
        if self.sending {
            tracing::debug!(to = %draft.recipient, "send already in flight, dropping request");
            return Command::None;
        }

        self.sending = true;
        self.pending = Some(draft.clone());
        let outgoing = draft.clone().into_outgoing(self.config.email_address.clone());
        tracing::info!(to = ?outgoing.to, subject = %outgoing.subject, "send accepted");

        let spinner = self.enter(View::Sending(SendingView::new(draft)));
        Command::batch([spinner, Command::Task(Task::Send(outgoing))])
    }

    fn send_succeeded(&mut self) -> Command {
        tracing::info!("send succeeded");
        self.sending = false;
        self.pending = None;
        match self.mode() {
            Mode::Sending | Mode::Compose => self.enter_list(true),
            _ => self.forward(&Event::SendSucceeded),
        }
    }

    fn tick(&mut self) -> Command {
        let refresh = if self.transport.is_some() {
            Command::Task(Task::ListHeaders {
                force_refresh: false,
            })
        } else {
            Command::None
        };
        Command::batch([refresh, self.schedule_tick()])
    }

    fn forward(&mut self, event: &Event) -> Command {
        let command = self.view.update(event);
        if command.quits() {
            tracing::info!(mode = ?self.mode(), "view requested quit");
            self.should_quit = true;
        }
        command
    }
}
