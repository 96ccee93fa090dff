//! First-run setup view
//!
//! Shown when the loaded configuration cannot reach a mailbox. Collects the
//! connection fields, prefilled from whatever was loaded, and hands back a
//! complete [`Config`] for the session. Nothing is written to disk.

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use tui_textarea::TextArea;

use libjkm::Config;

use super::{field_block, hint_line};
use crate::app::command::Command;
use crate::app::event::Event;

const MASK: char = '\u{2022}';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupField {
    Email,
    ImapServer,
    ImapPort,
    ImapPassword,
    SmtpServer,
    SmtpPort,
    SmtpPassword,
}

impl SetupField {
    pub const ALL: [SetupField; 7] = [
        SetupField::Email,
        SetupField::ImapServer,
        SetupField::ImapPort,
        SetupField::ImapPassword,
        SetupField::SmtpServer,
        SetupField::SmtpPort,
        SetupField::SmtpPassword,
    ];

    pub fn label(self) -> &'static str {
        match self {
            SetupField::Email => "Email address",
            SetupField::ImapServer => "IMAP server",
            SetupField::ImapPort => "IMAP port",
            SetupField::ImapPassword => "IMAP password",
            SetupField::SmtpServer => "SMTP server",
            SetupField::SmtpPort => "SMTP port",
            SetupField::SmtpPassword => "SMTP password (blank = IMAP password)",
        }
    }

    fn is_secret(self) -> bool {
        matches!(self, SetupField::ImapPassword | SetupField::SmtpPassword)
    }
}

pub struct SetupView {
    base: Config,
    inputs: Vec<TextArea<'static>>,
    focus: usize,
    error: Option<String>,
}

impl SetupView {
    pub fn new(config: &Config) -> Self {
        let inputs = SetupField::ALL
            .iter()
            .map(|&field| {
                let value = match field {
                    SetupField::Email => config.email_address.clone(),
                    SetupField::ImapServer => config.imap_server.clone(),
                    SetupField::ImapPort => config.imap_port.to_string(),
                    SetupField::ImapPassword => config.imap_password.clone(),
                    SetupField::SmtpServer => config.smtp_server.clone(),
                    SetupField::SmtpPort => config.smtp_port.to_string(),
                    SetupField::SmtpPassword => config.smtp_password.clone(),
                };
                let mut input = TextArea::new(vec![value]);
                input.move_cursor(tui_textarea::CursorMove::End);
                if field.is_secret() {
                    input.set_mask_char(MASK);
                }
                input
            })
            .collect();

        let mut view = Self {
            base: config.clone(),
            inputs,
            focus: 0,
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
        self.handle_key(*key)
    }

    fn handle_key(&mut self, key: KeyEvent) -> Command {
        match key.code {
            KeyCode::Tab | KeyCode::Down => {
                self.focus_at((self.focus + 1) % self.inputs.len());
                Command::None
            }
            KeyCode::BackTab | KeyCode::Up => {
                self.focus_at((self.focus + self.inputs.len() - 1) % self.inputs.len());
                Command::None
            }
            KeyCode::Enter if self.focus + 1 < self.inputs.len() => {
                self.focus_at(self.focus + 1);
                Command::None
            }
            KeyCode::Enter => match self.build_config() {
                Ok(config) => {
                    tracing::info!(
                        email = %config.email_address,
                        imap_server = %config.imap_server,
                        "setup completed"
                    );
                    Command::Emit(Event::Configured(config))
                }
                Err(message) => {
                    self.error = Some(message);
                    Command::None
                }
            },
            _ => {
                self.inputs[self.focus].input(key);
                Command::None
            }
        }
    }

    fn focus_at(&mut self, index: usize) {
        self.focus = index;
        self.restyle();
    }

    fn restyle(&mut self) {
        for (i, (input, field)) in self.inputs.iter_mut().zip(SetupField::ALL).enumerate() {
            let focused = i == self.focus;
            input.set_block(field_block(field.label(), focused));
            input.set_cursor_style(if focused {
                Style::default().add_modifier(Modifier::REVERSED)
            } else {
                Style::default()
            });
        }
    }

    pub fn value(&self, field: SetupField) -> String {
        let index = SetupField::ALL
            .iter()
            .position(|&f| f == field)
            .unwrap_or_default();
        self.inputs[index].lines().join("").trim().to_string()
    }

    pub fn focus(&self) -> SetupField {
        SetupField::ALL[self.focus]
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Config from the entered values, or the first problem found
    pub fn build_config(&self) -> Result<Config, String> {
        let config = Config {
            email_address: self.value(SetupField::Email),
            imap_server: self.value(SetupField::ImapServer),
            imap_port: parse_port(SetupField::ImapPort, &self.value(SetupField::ImapPort))?,
            imap_password: self.value(SetupField::ImapPassword),
            smtp_server: self.value(SetupField::SmtpServer),
            smtp_port: parse_port(SetupField::SmtpPort, &self.value(SetupField::SmtpPort))?,
            smtp_password: self.value(SetupField::SmtpPassword),
            ..self.base.clone()
        };

        for (field, value) in [
            (SetupField::Email, &config.email_address),
            (SetupField::ImapServer, &config.imap_server),
            (SetupField::ImapPassword, &config.imap_password),
        ] {
            if value.is_empty() {
                return Err(format!("{} is required", field.label()));
            }
        }
        if !config.email_address.contains('@') {
            return Err(format!("Invalid email address: '{}'", config.email_address));
        }
        Ok(config)
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let mut constraints = vec![Constraint::Length(2)];
        constraints.extend(self.inputs.iter().map(|_| Constraint::Length(3)));
        constraints.push(Constraint::Length(1));
        constraints.push(Constraint::Min(0));
        constraints.push(Constraint::Length(1));

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(area);

        let title = Paragraph::new(Line::from(Span::styled(
            "jkm setup: enter your mail account details",
            Style::default().add_modifier(Modifier::BOLD),
        )));
        frame.render_widget(title, chunks[0]);

        for (i, input) in self.inputs.iter().enumerate() {
            frame.render_widget(input, chunks[i + 1]);
        }

        let status_row = self.inputs.len() + 1;
        if let Some(error) = &self.error {
            let line = Line::from(Span::styled(error.clone(), Style::default().fg(Color::Red)));
            frame.render_widget(Paragraph::new(line), chunks[status_row]);
        }

        let hints = Paragraph::new(hint_line(&[
            ("tab/↓", "next"),
            ("shift+tab/↑", "back"),
            ("enter", "next / finish"),
            ("ctrl+c", "quit"),
        ]));
        frame.render_widget(hints, chunks[status_row + 2]);
    }
}

fn parse_port(field: SetupField, value: &str) -> Result<u16, String> {
    match value.parse::<u16>() {
        Ok(port) if port > 0 => Ok(port),
        _ => Err(format!("{} must be a number between 1 and 65535", field.label())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn type_text(view: &mut SetupView, text: &str) {
        for c in text.chars() {
            view.update(&key(KeyCode::Char(c)));
        }
    }

    fn partial_config() -> Config {
        Config {
            email_address: "alice@example.com".to_string(),
            imap_server: "imap.example.com".to_string(),
            smtp_server: "smtp.example.com".to_string(),
            ..Config::default()
        }
    }

    #[test]
    fn test_prefills_from_config() {
        let view = SetupView::new(&partial_config());
        assert_eq!(view.value(SetupField::Email), "alice@example.com");
        assert_eq!(view.value(SetupField::ImapPort), "993");
        assert_eq!(view.value(SetupField::SmtpPort), "587");
        assert_eq!(view.focus(), SetupField::Email);
    }

    #[test]
    fn test_missing_password_is_reported() {
        let mut view = SetupView::new(&partial_config());
        for _ in 0..SetupField::ALL.len() {
            view.update(&key(KeyCode::Enter));
        }

        assert!(view.error().unwrap().contains("IMAP password is required"));
    }

    #[test]
    fn test_completion_emits_configured() {
        let mut view = SetupView::new(&partial_config());
        view.update(&key(KeyCode::Enter));
        view.update(&key(KeyCode::Enter));
        view.update(&key(KeyCode::Enter));
        assert_eq!(view.focus(), SetupField::ImapPassword);
        type_text(&mut view, "hunter2");

        let mut command = Command::None;
        while command.is_none() {
            command = view.update(&key(KeyCode::Enter));
        }

        let expected = Config {
            imap_password: "hunter2".to_string(),
            ..partial_config()
        };
        assert_eq!(command, Command::Emit(Event::Configured(expected)));
    }

    #[test]
    fn test_bad_port_is_rejected() {
        let mut view = SetupView::new(&Config {
            imap_password: "pw".to_string(),
            ..partial_config()
        });
        view.update(&key(KeyCode::Tab));
        view.update(&key(KeyCode::Tab));
        assert_eq!(view.focus(), SetupField::ImapPort);
        type_text(&mut view, "0000");

        assert!(view.build_config().unwrap_err().contains("IMAP port"));
    }

    #[test]
    fn test_focus_wraps_backwards() {
        let mut view = SetupView::new(&Config::default());
        view.update(&Event::Key(KeyEvent::new(KeyCode::BackTab, KeyModifiers::SHIFT)));
        assert_eq!(view.focus(), SetupField::SmtpPassword);
    }
}
