//! Shared helpers for router integration tests
//!
//! `Harness` drives a router synchronously: emitted events are fed straight
//! back in, tasks are recorded and only run when asked, timers are ignored.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use jkm_tui::app::{perform, Command, Event, Mode, Router, Task};
use libjkm::transport::fixture::FixtureTransport;
use libjkm::transport::FixtureFactory;
use libjkm::Config;

pub fn complete_config() -> Config {
    Config {
        imap_server: "imap.example.com".to_string(),
        smtp_server: "smtp.example.com".to_string(),
        email_address: "alice@example.com".to_string(),
        imap_password: "secret".to_string(),
        ..Config::default()
    }
}

pub fn key(code: KeyCode) -> Event {
    Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
}

pub fn ctrl(c: char) -> Event {
    Event::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL))
}

pub fn type_text(harness: &mut Harness, text: &str) {
    for c in text.chars() {
        harness.send(key(KeyCode::Char(c)));
    }
}

pub struct Harness {
    pub router: Router,
    pub fixture: Arc<FixtureTransport>,
    runtime: tokio::runtime::Runtime,
    pending: VecDeque<Task>,
    /// Every task dispatched so far, in order
    pub dispatched: Vec<Task>,
    pub quit: bool,
}

impl Harness {
    pub fn new(config: Config) -> Self {
        Self::with_fixture(config, FixtureTransport::new())
    }

    pub fn with_fixture(config: Config, fixture: FixtureTransport) -> Self {
        let fixture = Arc::new(fixture);
        let factory = Arc::new(FixtureFactory::new(fixture.clone()));
        let router = Router::new(config, factory).expect("router should build");
        Self {
            router,
            fixture,
            runtime: tokio::runtime::Runtime::new().expect("runtime"),
            pending: VecDeque::new(),
            dispatched: Vec::new(),
            quit: false,
        }
    }

    /// Run the router's startup commands
    pub fn start(&mut self) -> &mut Self {
        let command = self.router.init();
        self.absorb(command);
        self
    }

    /// Deliver one event and everything it emits
    pub fn send(&mut self, event: Event) -> &mut Self {
        let command = self.router.update(event);
        self.absorb(command);
        self
    }

    /// Run queued tasks against the fixture and deliver their completions
    pub fn run_tasks(&mut self) -> &mut Self {
        while let Some(task) = self.pending.pop_front() {
            let event = self.runtime.block_on(perform(task, self.router.transport()));
            self.send(event);
        }
        self
    }

    pub fn mode(&self) -> Mode {
        self.router.mode()
    }

    /// Drop recorded tasks, returning them
    pub fn take_dispatched(&mut self) -> Vec<Task> {
        self.pending.clear();
        std::mem::take(&mut self.dispatched)
    }

    pub fn list_fetches(&self) -> usize {
        self.dispatched
            .iter()
            .filter(|t| matches!(t, Task::ListHeaders { .. }))
            .count()
    }

    pub fn send_tasks(&self) -> usize {
        self.dispatched
            .iter()
            .filter(|t| matches!(t, Task::Send(_)))
            .count()
    }

    fn absorb(&mut self, command: Command) {
        match command {
            Command::None | Command::ScheduleTick(_) | Command::ScheduleSpinner(_) => {}
            Command::Quit => self.quit = true,
            Command::Emit(event) => {
                self.send(event);
            }
            Command::Task(task) => {
                self.dispatched.push(task.clone());
                self.pending.push_back(task);
            }
            Command::Batch(children) | Command::Sequence(children) => {
                for child in children {
                    self.absorb(child);
                }
            }
        }
    }
}
