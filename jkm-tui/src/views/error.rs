//! Error view
//!
//! The single place failures are shown. Any key returns to the list, which
//! fetches fresh data.

use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use super::centered_rect;
use crate::app::command::Command;
use crate::app::event::Event;

pub const RETURN_HINT: &str = "Press any key to return to the list view...";

#[derive(Debug, Clone)]
pub struct ErrorView {
    message: String,
}

impl ErrorView {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn init(&self) -> Command {
        Command::None
    }

    pub fn update(&mut self, event: &Event) -> Command {
        match event {
            Event::Key(_) => Command::Emit(Event::ShowList),
            _ => Command::None,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let popup = centered_rect(70, 40, area);

        let text = vec![
            Line::from(Span::styled(
                format!("Error: '{}'", self.message),
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from(RETURN_HINT),
        ];

        let widget = Paragraph::new(text)
            .block(
                Block::default()
                    .title(" Error ")
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Red)),
            )
            .wrap(Wrap { trim: false })
            .alignment(Alignment::Center);

        frame.render_widget(Clear, popup);
        frame.render_widget(widget, popup);
    }
}
