//! Sending view: spinner shown while a send is in flight
//!
//! The spinner runs on its own timer, independent of the send task. The
//! router leaves this mode when the send resolves.

use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use libjkm::Draft;

use super::centered_rect;
use crate::app::command::{Command, SPINNER_INTERVAL};
use crate::app::event::Event;

pub const SPINNER_FRAMES: [char; 8] = ['⣾', '⣽', '⣻', '⢿', '⡿', '⣟', '⣯', '⣷'];

#[derive(Debug, Clone)]
pub struct SendingView {
    draft: Draft,
    frame: usize,
}

impl SendingView {
    pub fn new(draft: Draft) -> Self {
        Self { draft, frame: 0 }
    }

    pub fn init(&self) -> Command {
        Command::ScheduleSpinner(SPINNER_INTERVAL)
    }

    pub fn update(&mut self, event: &Event) -> Command {
        match event {
            Event::SpinnerTick => {
                self.frame = (self.frame + 1) % SPINNER_FRAMES.len();
                Command::ScheduleSpinner(SPINNER_INTERVAL)
            }
            _ => Command::None,
        }
    }

    pub fn spinner(&self) -> char {
        SPINNER_FRAMES[self.frame]
    }

    pub fn draft(&self) -> &Draft {
        &self.draft
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let popup = centered_rect(60, 40, area);

        let lines = vec![
            Line::from(""),
            Line::from(vec![
                Span::styled(
                    format!("{} ", self.spinner()),
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                ),
                Span::raw("Sending message..."),
            ]),
            Line::from(""),
            Line::from(format!("To: {}", self.draft.recipient)),
            Line::from(format!("Subject: {}", self.draft.subject)),
        ];

        let widget = Paragraph::new(lines)
            .block(
                Block::default()
                    .title(" Sending ")
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Yellow)),
            )
            .alignment(Alignment::Center);

        frame.render_widget(Clear, popup);
        frame.render_widget(widget, popup);
    }
}
