//! View models, one per mode
//!
//! Each view owns its local state and key handling for one mode. Views never
//! touch the transport or change mode themselves: they return a
//! [`Command`](crate::app::Command), usually an event asking the router to
//! switch modes or a task for the executor.
//!
//! All views share the same shape:
//!
//! - `init() -> Command`: startup work when the mode is entered
//! - `update(&Event) -> Command`: react to one event
//! - `render(&self, frame, area)`: draw current state, no side effects

pub mod compose;
pub mod error;
pub mod list;
pub mod read;
pub mod sending;
pub mod setup;

pub use compose::{ComposeField, ComposeView};
pub use error::ErrorView;
pub use list::ListView;
pub use read::ReadView;
pub use sending::SendingView;
pub use setup::{SetupField, SetupView};

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders},
};

/// Bordered block, highlighted when it has focus
pub(crate) fn field_block(title: &str, focused: bool) -> Block<'static> {
    let style = if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    Block::default()
        .title(format!(" {} ", title))
        .borders(Borders::ALL)
        .border_style(style)
}

/// One-line key hint bar: `key: action | key: action`
pub(crate) fn hint_line(hints: &[(&str, &str)]) -> Line<'static> {
    let mut spans = Vec::new();
    for (i, (key, action)) in hints.iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled(" | ", Style::default().fg(Color::DarkGray)));
        }
        spans.push(Span::styled(
            key.to_string(),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ));
        spans.push(Span::styled(
            format!(": {}", action),
            Style::default().fg(Color::Gray),
        ));
    }
    Line::from(spans)
}

/// Helper to create centered rectangle
pub(crate) fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
