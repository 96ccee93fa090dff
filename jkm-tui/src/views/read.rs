//! Message reader view

use std::cell::Cell;

use crossterm::event::KeyCode;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use libjkm::MessageHeader;

use super::hint_line;
use crate::app::command::{Command, Task};
use crate::app::event::Event;

pub const LOADING_BODY: &str = "Loading message body...";
pub const EMPTY_BODY: &str = "[No message body available]";

const PAGE: u16 = 10;

/// Body width assumed until the first render (80 columns less borders)
const DEFAULT_WRAP_WIDTH: u16 = 78;

#[derive(Debug, Clone)]
pub struct ReadView {
    header: MessageHeader,
    body: Option<String>,
    scroll: u16,
    /// Inner width of the body pane at the last render
    wrap_width: Cell<u16>,
}

impl ReadView {
    pub fn new(header: MessageHeader) -> Self {
        Self {
            header,
            body: None,
            scroll: 0,
            wrap_width: Cell::new(DEFAULT_WRAP_WIDTH),
        }
    }

    pub fn init(&self) -> Command {
        Command::Task(Task::FetchBody(self.header.id))
    }

    pub fn update(&mut self, event: &Event) -> Command {
        match event {
            // A fetch for a message we've since left is stale
            Event::BodyFetched { id, body } if self.header.matches(*id) => {
                self.body = Some(body.clone());
                Command::None
            }
            Event::FullMessageFetched(message) if self.header.matches(message.header.id) => {
                self.header = message.header.clone();
                self.body = Some(message.body.clone());
                Command::None
            }
            Event::Key(key) => match key.code {
                KeyCode::Char('q') | KeyCode::Esc => Command::Emit(Event::ShowList),
                KeyCode::Char('R') => {
                    self.body = None;
                    Command::Task(Task::FetchMessage(self.header.id))
                }
                KeyCode::Char('j') | KeyCode::Down => {
                    self.scroll_to(self.scroll.saturating_add(1));
                    Command::None
                }
                KeyCode::Char('k') | KeyCode::Up => {
                    self.scroll = self.scroll.saturating_sub(1);
                    Command::None
                }
                KeyCode::PageDown => {
                    self.scroll_to(self.scroll.saturating_add(PAGE));
                    Command::None
                }
                KeyCode::PageUp => {
                    self.scroll = self.scroll.saturating_sub(PAGE);
                    Command::None
                }
                KeyCode::Char('g') | KeyCode::Home => {
                    self.scroll = 0;
                    Command::None
                }
                KeyCode::Char('G') | KeyCode::End => {
                    self.scroll = self.max_scroll();
                    Command::None
                }
                _ => Command::None,
            },
            _ => Command::None,
        }
    }

    pub fn header(&self) -> &MessageHeader {
        &self.header
    }

    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    pub fn scroll(&self) -> u16 {
        self.scroll
    }

    /// Body text as displayed, including placeholders
    pub fn body_text(&self) -> &str {
        match self.body.as_deref() {
            None => LOADING_BODY,
            Some(body) if body.trim().is_empty() => EMPTY_BODY,
            Some(body) => body,
        }
    }

    fn body_paragraph(&self) -> Paragraph<'_> {
        Paragraph::new(self.body_text()).wrap(Wrap { trim: false })
    }

    /// Rows the body occupies once wrapped to `width`
    fn wrapped_rows(&self, width: u16) -> usize {
        self.body_paragraph().line_count(width.max(1))
    }

    fn max_scroll(&self) -> u16 {
        let rows = self.wrapped_rows(self.wrap_width.get());
        u16::try_from(rows.saturating_sub(1)).unwrap_or(u16::MAX)
    }

    fn scroll_to(&mut self, offset: u16) {
        self.scroll = offset.min(self.max_scroll());
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Length(6),
                Constraint::Min(3),
                Constraint::Length(1),
            ])
            .split(area);

        let compact = Line::from(vec![
            Span::styled(
                self.header.from.clone(),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            ),
            Span::raw("  "),
            Span::raw(self.header.subject.clone()),
        ]);
        frame.render_widget(Paragraph::new(compact), chunks[0]);

        let label = Style::default().fg(Color::Yellow);
        let date = self
            .header
            .date
            .with_timezone(&chrono::Local)
            .format("%a, %d %b %Y %H:%M")
            .to_string();
        let details = vec![
            Line::from(vec![Span::styled("From:    ", label), Span::raw(self.header.from.clone())]),
            Line::from(vec![Span::styled("To:      ", label), Span::raw(self.header.recipients())]),
            Line::from(vec![Span::styled("Subject: ", label), Span::raw(self.header.subject.clone())]),
            Line::from(vec![Span::styled("Date:    ", label), Span::raw(date)]),
        ];
        frame.render_widget(
            Paragraph::new(details).block(Block::default().borders(Borders::ALL)),
            chunks[1],
        );

        let body_style = if self.body.is_none() {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default()
        };
        let body_block = Block::default().borders(Borders::ALL);
        self.wrap_width.set(body_block.inner(chunks[2]).width);
        // A wider pane can leave the offset past the last row
        let scroll = self.scroll.min(self.max_scroll());
        let body = self
            .body_paragraph()
            .style(body_style)
            .block(body_block)
            .scroll((scroll, 0));
        frame.render_widget(body, chunks[2]);

        let hints = Paragraph::new(hint_line(&[
            ("j/k", "scroll"),
            ("pgup/pgdn", "page"),
            ("R", "reload"),
            ("q", "back"),
        ]));
        frame.render_widget(hints, chunks[3]);
    }
}
