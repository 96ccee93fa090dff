//! Terminal input
//!
//! Polls crossterm on a dedicated thread and forwards key presses and
//! resizes into the event loop's inbox, alongside background completions.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::Sender;
use crossterm::event::{self, Event as CrosstermEvent, KeyEventKind};

use super::event::Event;

/// Translate a terminal event; `None` for events the client ignores
pub fn translate(event: CrosstermEvent) -> Option<Event> {
    match event {
        CrosstermEvent::Key(key) if key.kind == KeyEventKind::Press => Some(Event::Key(key)),
        CrosstermEvent::Resize(w, h) => Some(Event::Resize(w, h)),
        _ => None,
    }
}

/// Event handler that polls for terminal events
pub struct EventHandler {
    poll_interval: Duration,
    running: Arc<AtomicBool>,
}

impl EventHandler {
    /// Create a new event handler with the specified poll interval
    pub fn new(poll_interval_ms: u64) -> Self {
        Self {
            poll_interval: Duration::from_millis(poll_interval_ms),
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Poll once, blocking up to the poll interval
    pub fn next(&self) -> std::io::Result<Option<Event>> {
        if event::poll(self.poll_interval)? {
            Ok(translate(event::read()?))
        } else {
            Ok(None)
        }
    }

    /// Forward input into `sender` until [`stop`](Self::stop) is called or
    /// the receiving side hangs up
    pub fn spawn(self, sender: Sender<Event>) -> InputThread {
        let running = self.running.clone();
        let handle = thread::spawn(move || {
            while self.running.load(Ordering::SeqCst) {
                match self.next() {
                    Ok(Some(event)) => {
                        if sender.send(event).is_err() {
                            break;
                        }
                    }
                    Ok(None) => {}
                    Err(e) => {
                        tracing::error!(error = %e, "terminal input failed");
                        break;
                    }
                }
            }
            tracing::debug!("input thread stopped");
        });

        InputThread { running, handle }
    }
}

/// Handle to the running input thread
pub struct InputThread {
    running: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

impl InputThread {
    /// Ask the thread to stop and wait for it
    pub fn stop(self) {
        self.running.store(false, Ordering::SeqCst);
        if self.handle.join().is_err() {
            tracing::warn!("input thread panicked");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyEvent, KeyEventState, KeyModifiers};

    #[test]
    fn test_event_handler_creation() {
        let handler = EventHandler::new(50);
        assert_eq!(handler.poll_interval, Duration::from_millis(50));
        assert!(handler.running.load(Ordering::SeqCst));
    }

    #[test]
    fn test_press_is_forwarded() {
        let key = KeyEvent::new(KeyCode::Char('j'), KeyModifiers::NONE);
        assert_eq!(translate(CrosstermEvent::Key(key)), Some(Event::Key(key)));
    }

    #[test]
    fn test_release_is_dropped() {
        let key = KeyEvent {
            code: KeyCode::Char('j'),
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Release,
            state: KeyEventState::NONE,
        };
        assert_eq!(translate(CrosstermEvent::Key(key)), None);
    }

    #[test]
    fn test_resize_is_forwarded() {
        assert_eq!(
            translate(CrosstermEvent::Resize(120, 40)),
            Some(Event::Resize(120, 40))
        );
        assert_eq!(translate(CrosstermEvent::FocusGained), None);
    }
}
