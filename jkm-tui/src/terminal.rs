//! Raw-mode terminal lifecycle for the jkm UI
//!
//! [`TerminalSession`] owns the ratatui terminal for the life of the event
//! loop. Leaving the alternate screen happens exactly once: through
//! [`TerminalSession::restore`], on drop, or from the panic hook.

use std::io::{self, Stdout};
use std::sync::atomic::{AtomicBool, Ordering};

use crossterm::{
    cursor::Show,
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use crate::error::Result;

pub type Tui = Terminal<CrosstermBackend<Stdout>>;

/// Set while the terminal is in raw mode on the alternate screen
static ACTIVE: AtomicBool = AtomicBool::new(false);

/// Put the terminal back the way the shell expects it.
///
/// No-op unless a session is active.
fn leave_screen() -> io::Result<()> {
    if !ACTIVE.swap(false, Ordering::SeqCst) {
        return Ok(());
    }
    let raw = disable_raw_mode();
    execute!(io::stdout(), LeaveAlternateScreen, Show)?;
    raw
}

pub struct TerminalSession {
    terminal: Tui,
}

impl TerminalSession {
    /// Enter raw mode and the alternate screen
    pub fn enter() -> Result<Self> {
        install_panic_hook();

        enable_raw_mode()?;
        ACTIVE.store(true, Ordering::SeqCst);

        let mut stdout = io::stdout();
        if let Err(e) = execute!(stdout, EnterAlternateScreen) {
            let _ = leave_screen();
            return Err(e.into());
        }

        let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;
        terminal.clear()?;

        tracing::debug!("terminal session started");
        Ok(Self { terminal })
    }

    pub fn terminal_mut(&mut self) -> &mut Tui {
        &mut self.terminal
    }

    /// Leave the alternate screen, reporting any failure
    pub fn restore(mut self) -> Result<()> {
        leave_screen()?;
        self.terminal.show_cursor()?;
        tracing::debug!("terminal session restored");
        Ok(())
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        let _ = leave_screen();
    }
}

/// Chain a hook that restores the terminal before the panic message prints
fn install_panic_hook() {
    static INSTALLED: AtomicBool = AtomicBool::new(false);
    if INSTALLED.swap(true, Ordering::SeqCst) {
        return;
    }

    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = leave_screen();
        original_hook(panic_info);
    }));
}
