//! Compose view
//!
//! Guided capture of recipient, subject and body, then an explicit Send or
//! Cancel confirmation. Nothing is sent until Send is confirmed; cancelling
//! discards the draft.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use tui_textarea::TextArea;

use libjkm::Draft;

use super::{field_block, hint_line};
use crate::app::command::Command;
use crate::app::event::Event;

/// Field currently receiving input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComposeField {
    Recipient,
    Subject,
    Body,
    Confirm,
}

impl ComposeField {
    fn next(self) -> Self {
        match self {
            ComposeField::Recipient => ComposeField::Subject,
            ComposeField::Subject => ComposeField::Body,
            ComposeField::Body | ComposeField::Confirm => ComposeField::Confirm,
        }
    }

    fn previous(self) -> Self {
        match self {
            ComposeField::Recipient | ComposeField::Subject => ComposeField::Recipient,
            ComposeField::Body => ComposeField::Subject,
            ComposeField::Confirm => ComposeField::Body,
        }
    }
}

pub struct ComposeView {
    recipient: TextArea<'static>,
    subject: TextArea<'static>,
    body: TextArea<'static>,
    focus: ComposeField,
    /// Confirmation choice; true means Send
    confirm_send: bool,
    error: Option<String>,
}

impl Default for ComposeView {
    fn default() -> Self {
        Self::new()
    }
}

impl ComposeView {
    pub fn new() -> Self {
        let mut recipient = TextArea::default();
        recipient.set_placeholder_text("bob@example.com, carol@example.com");
        let mut subject = TextArea::default();
        subject.set_placeholder_text("Subject");
        let mut body = TextArea::default();
        body.set_placeholder_text("Write your message... (Ctrl+S when done)");

        let mut view = Self {
            recipient,
            subject,
            body,
            focus: ComposeField::Recipient,
            confirm_send: true,
            error: None,
        };
        view.restyle();
        view
    }

    pub fn init(&self) -> Command {
        Command::None
    }

    pub fn update(&mut self, event: &Event) -> Command {
        let Event::Key(key) = event else {
            return Command::None;
        };

        if key.code == KeyCode::Esc {
            tracing::debug!("compose cancelled");
            return Command::Emit(Event::ShowList);
        }

        match self.focus {
            ComposeField::Recipient | ComposeField::Subject => self.handle_line_key(*key),
            ComposeField::Body => self.handle_body_key(*key),
            ComposeField::Confirm => self.handle_confirm_key(*key),
        }
    }

    fn handle_line_key(&mut self, key: KeyEvent) -> Command {
        match key.code {
            KeyCode::Tab | KeyCode::Enter => self.advance(),
            KeyCode::BackTab => self.retreat(),
            _ => {
                let field = if self.focus == ComposeField::Recipient {
                    &mut self.recipient
                } else {
                    &mut self.subject
                };
                field.input(key);
            }
        }
        Command::None
    }

    fn handle_body_key(&mut self, key: KeyEvent) -> Command {
        match (key.code, key.modifiers) {
            (KeyCode::Tab, _) => self.advance(),
            (KeyCode::Char('s'), m) if m.contains(KeyModifiers::CONTROL) => self.advance(),
            (KeyCode::BackTab, _) => self.retreat(),
            _ => {
                self.body.input(key);
            }
        }
        Command::None
    }

    fn handle_confirm_key(&mut self, key: KeyEvent) -> Command {
        match key.code {
            KeyCode::Left | KeyCode::Right | KeyCode::Tab | KeyCode::Char('h') | KeyCode::Char('l') => {
                self.confirm_send = !self.confirm_send;
                Command::None
            }
            KeyCode::BackTab => {
                self.retreat();
                Command::None
            }
            KeyCode::Char('y') => self.finish(true),
            KeyCode::Char('n') => self.finish(false),
            KeyCode::Enter => self.finish(self.confirm_send),
            _ => Command::None,
        }
    }

    fn finish(&self, send: bool) -> Command {
        if send {
            Command::Emit(Event::SendRequested(self.draft()))
        } else {
            tracing::debug!("compose discarded at confirmation");
            Command::Emit(Event::ShowList)
        }
    }

    fn advance(&mut self) {
        if self.focus == ComposeField::Recipient {
            if let Err(message) = validate_recipients(&self.recipient_text()) {
                self.error = Some(message);
                return;
            }
        }
        self.error = None;
        self.focus = self.focus.next();
        self.restyle();
    }

    fn retreat(&mut self) {
        self.error = None;
        self.focus = self.focus.previous();
        self.restyle();
    }

    fn restyle(&mut self) {
        let focus = self.focus;
        for (field, area, title) in [
            (ComposeField::Recipient, &mut self.recipient, "To"),
            (ComposeField::Subject, &mut self.subject, "Subject"),
            (ComposeField::Body, &mut self.body, "Body"),
        ] {
            let focused = field == focus;
            area.set_block(field_block(title, focused));
            area.set_cursor_style(if focused {
                Style::default().add_modifier(Modifier::REVERSED)
            } else {
                Style::default()
            });
        }
    }

    fn recipient_text(&self) -> String {
        self.recipient.lines().join("").trim().to_string()
    }

    /// The draft as currently entered
    pub fn draft(&self) -> Draft {
        Draft::new(
            self.recipient_text(),
            self.subject.lines().join(" ").trim().to_string(),
            self.body.lines().join("\n"),
        )
    }

    pub fn focus(&self) -> ComposeField {
        self.focus
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn confirm_send(&self) -> bool {
        self.confirm_send
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Min(5),
                Constraint::Length(1),
                Constraint::Length(1),
            ])
            .split(area);

        frame.render_widget(&self.recipient, chunks[0]);
        frame.render_widget(&self.subject, chunks[1]);
        frame.render_widget(&self.body, chunks[2]);

        let status = if let Some(error) = &self.error {
            Line::from(Span::styled(error.clone(), Style::default().fg(Color::Red)))
        } else if self.focus == ComposeField::Confirm {
            let choice = |label: &'static str, selected: bool| {
                let style = if selected {
                    Style::default().fg(Color::Black).bg(Color::Cyan)
                } else {
                    Style::default().fg(Color::Gray)
                };
                Span::styled(format!(" {} ", label), style)
            };
            Line::from(vec![
                Span::raw("Send this message?  "),
                choice("Send", self.confirm_send),
                Span::raw(" "),
                choice("Cancel", !self.confirm_send),
            ])
        } else {
            Line::from("")
        };
        frame.render_widget(Paragraph::new(status).alignment(Alignment::Center), chunks[3]);

        let hints = match self.focus {
            ComposeField::Body => hint_line(&[
                ("tab/ctrl+s", "done"),
                ("shift+tab", "back"),
                ("esc", "cancel"),
            ]),
            ComposeField::Confirm => hint_line(&[
                ("←/→", "choose"),
                ("enter", "confirm"),
                ("shift+tab", "back"),
                ("esc", "cancel"),
            ]),
            _ => hint_line(&[
                ("tab/enter", "next"),
                ("shift+tab", "back"),
                ("esc", "cancel"),
            ]),
        };
        frame.render_widget(Paragraph::new(hints), chunks[4]);
    }
}

/// Check every comma-separated recipient looks like an address
pub fn validate_recipients(input: &str) -> Result<(), String> {
    if input.trim().is_empty() {
        return Err("At least one recipient is required".to_string());
    }
    for entry in input.split(',') {
        let entry = entry.trim();
        if entry.is_empty() {
            return Err("Empty recipient between commas".to_string());
        }
        if !entry.contains('@') {
            return Err(format!("Invalid email address: '{}'", entry));
        }
    }
    Ok(())
}
