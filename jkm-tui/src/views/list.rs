//! Inbox list view
//!
//! Shows message headers newest first. The selection is held as a message
//! id so it survives background refreshes (see [`reconcile`]).
//!
//! `/` opens a filter over subject, sender and date. Enter keeps the filter
//! and returns to navigation; Esc clears it. Navigation, selection and
//! reconciliation all work on the filtered rows.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};
use tui_textarea::TextArea;

use libjkm::{MessageHeader, MessageId};

use super::hint_line;
use crate::app::command::{Command, Task};
use crate::app::event::Event;
use crate::app::reconcile::reconcile;

/// Date format shared by list rows and filter matching
const DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

#[derive(Debug, Clone, Default)]
pub struct ListView {
    headers: Vec<MessageHeader>,
    selected: Option<MessageId>,
    /// False until the first refresh arrives
    loaded: bool,
    filter: TextArea<'static>,
    /// Keys go to the filter input
    filtering: bool,
}

impl ListView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn init(&self) -> Command {
        Command::Task(Task::ListHeaders {
            force_refresh: false,
        })
    }

    pub fn update(&mut self, event: &Event) -> Command {
        match event {
            Event::ListRefreshed(headers) => {
                self.apply_refresh(headers.clone());
                Command::None
            }
            Event::Key(key) if self.filtering => {
                self.handle_filter_key(*key);
                Command::None
            }
            Event::Key(key) => match (key.code, key.modifiers) {
                (KeyCode::Char('q'), KeyModifiers::NONE) => Command::Quit,
                (KeyCode::Char('/'), _) => {
                    self.filtering = true;
                    Command::None
                }
                (KeyCode::Esc, _) if !self.query().is_empty() => {
                    self.clear_filter();
                    Command::None
                }
                (KeyCode::Char('j'), _) | (KeyCode::Down, _) => {
                    self.move_by(1);
                    Command::None
                }
                (KeyCode::Char('k'), _) | (KeyCode::Up, _) => {
                    self.move_by(-1);
                    Command::None
                }
                (KeyCode::Char('g'), KeyModifiers::NONE) | (KeyCode::Home, _) => {
                    self.selected = self.visible().first().map(|h| h.id);
                    Command::None
                }
                (KeyCode::Char('G'), _) | (KeyCode::End, _) => {
                    self.selected = self.visible().last().map(|h| h.id);
                    Command::None
                }
                (KeyCode::Enter, _) => match self.selected_header() {
                    Some(header) => Command::Emit(Event::ShowRead(header.clone())),
                    None => Command::None,
                },
                (KeyCode::Char('c'), KeyModifiers::NONE) => Command::Emit(Event::ShowCompose),
                (KeyCode::Char('r'), KeyModifiers::NONE) => Command::Task(Task::ListHeaders {
                    force_refresh: true,
                }),
                _ => Command::None,
            },
            _ => Command::None,
        }
    }

    fn handle_filter_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter => self.filtering = false,
            KeyCode::Esc => self.clear_filter(),
            _ => {
                if self.filter.input(key) {
                    self.keep_or_first();
                }
            }
        }
    }

    fn clear_filter(&mut self) {
        self.filter = TextArea::default();
        self.filtering = false;
        self.keep_or_first();
    }

    /// After a filter edit: keep a still-visible selection, else the first match
    fn keep_or_first(&mut self) {
        let visible = self.visible();
        let kept = self
            .selected
            .filter(|id| visible.iter().any(|h| h.matches(*id)));
        self.selected = kept.or_else(|| visible.first().map(|h| h.id));
    }

    /// Replace the displayed headers, keeping the selection where possible
    pub fn apply_refresh(&mut self, headers: Vec<MessageHeader>) {
        let previous: Vec<MessageHeader> = self.visible().into_iter().cloned().collect();
        self.headers = headers;
        self.loaded = true;
        let visible: Vec<MessageHeader> = self.visible().into_iter().cloned().collect();
        self.selected = reconcile(&previous, self.selected, &visible);
        tracing::debug!(
            count = self.headers.len(),
            selected = ?self.selected,
            "list refreshed"
        );
    }

    /// Every header from the last refresh, filter or not
    pub fn headers(&self) -> &[MessageHeader] {
        &self.headers
    }

    /// Headers matching the current filter, in display order
    pub fn visible(&self) -> Vec<&MessageHeader> {
        let query = self.query();
        self.headers
            .iter()
            .filter(|h| matches_filter(h, query))
            .collect()
    }

    pub fn query(&self) -> &str {
        self.filter.lines().first().map(String::as_str).unwrap_or("")
    }

    pub fn is_filtering(&self) -> bool {
        self.filtering
    }

    pub fn selected(&self) -> Option<MessageId> {
        self.selected
    }

    /// Position of the selection among the visible rows
    pub fn selected_index(&self) -> Option<usize> {
        let id = self.selected?;
        self.visible().iter().position(|h| h.matches(id))
    }

    pub fn selected_header(&self) -> Option<&MessageHeader> {
        let id = self.selected?;
        self.visible().into_iter().find(|h| h.matches(id))
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    fn move_by(&mut self, delta: isize) {
        let visible = self.visible();
        if visible.is_empty() {
            return;
        }
        let last = visible.len() as isize - 1;
        let next = match self.selected_index() {
            Some(current) => (current as isize + delta).clamp(0, last),
            None => 0,
        };
        self.selected = Some(visible[next as usize].id);
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let show_filter = self.filtering || !self.query().is_empty();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(if show_filter { 1 } else { 0 }),
                Constraint::Min(3),
                Constraint::Length(1),
            ])
            .split(area);

        if show_filter {
            let style = if self.filtering {
                Style::default().fg(Color::Yellow)
            } else {
                Style::default().fg(Color::Gray)
            };
            let cursor = if self.filtering { "_" } else { "" };
            let bar = Line::from(vec![
                Span::styled("Filter: ", style.add_modifier(Modifier::BOLD)),
                Span::styled(format!("{}{}", self.query(), cursor), style),
            ]);
            frame.render_widget(Paragraph::new(bar), chunks[0]);
        }

        let visible = self.visible();
        let title = if self.query().is_empty() {
            format!(" Inbox ({}) ", self.headers.len())
        } else {
            format!(" Inbox ({} of {}) ", visible.len(), self.headers.len())
        };
        let block = Block::default().title(title).borders(Borders::ALL);

        if visible.is_empty() {
            let text = if !self.loaded {
                "Loading messages..."
            } else if self.headers.is_empty() {
                "No messages"
            } else {
                "No matching messages"
            };
            let placeholder = Paragraph::new(Line::from(Span::styled(
                text,
                Style::default().fg(Color::DarkGray),
            )))
            .block(block)
            .alignment(Alignment::Center);
            frame.render_widget(placeholder, chunks[1]);
        } else {
            let items: Vec<ListItem> = visible.iter().map(|h| header_item(h)).collect();
            let list = List::new(items)
                .block(block)
                .highlight_style(
                    Style::default()
                        .bg(Color::DarkGray)
                        .add_modifier(Modifier::BOLD),
                )
                .highlight_symbol("> ");

            let mut state = ListState::default();
            state.select(self.selected_index());
            frame.render_stateful_widget(list, chunks[1], &mut state);
        }

        let hints = if self.filtering {
            hint_line(&[("enter", "apply"), ("esc", "clear")])
        } else {
            hint_line(&[
                ("j/k", "move"),
                ("enter", "read"),
                ("/", "filter"),
                ("c", "compose"),
                ("r", "refresh"),
                ("q", "quit"),
            ])
        };
        frame.render_widget(Paragraph::new(hints), chunks[2]);
    }
}

/// Text a filter query is matched against
fn filter_value(header: &MessageHeader) -> String {
    let date = header
        .date
        .with_timezone(&chrono::Local)
        .format(DATE_FORMAT);
    format!("{} {} {}", header.subject, header.from, date)
}

/// Case-insensitive; every whitespace-separated term must appear
fn matches_filter(header: &MessageHeader, query: &str) -> bool {
    if query.trim().is_empty() {
        return true;
    }
    let haystack = filter_value(header).to_lowercase();
    query
        .split_whitespace()
        .all(|term| haystack.contains(&term.to_lowercase()))
}

fn header_item(header: &MessageHeader) -> ListItem<'static> {
    let subject = if header.subject.is_empty() {
        "(no subject)".to_string()
    } else {
        header.subject.clone()
    };
    let date = header
        .date
        .with_timezone(&chrono::Local)
        .format(DATE_FORMAT)
        .to_string();

    ListItem::new(vec![
        Line::from(Span::styled(
            subject,
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            format!("{} | {}", header.from, date),
            Style::default().fg(Color::Gray),
        )),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEvent;
    use libjkm::transport::fixture::sample_headers;

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn loaded() -> ListView {
        let mut view = ListView::new();
        view.update(&Event::ListRefreshed(sample_headers()));
        view
    }

    #[test]
    fn test_init_fetches_list() {
        assert_eq!(
            ListView::new().init().tasks(),
            vec![&Task::ListHeaders {
                force_refresh: false
            }]
        );
    }

    #[test]
    fn test_first_refresh_selects_newest() {
        let view = loaded();
        assert!(view.is_loaded());
        assert_eq!(view.selected(), Some(MessageId(3)));
    }

    #[test]
    fn test_movement_is_clamped() {
        let mut view = loaded();
        view.update(&key(KeyCode::Char('k')));
        assert_eq!(view.selected_index(), Some(0));

        view.update(&key(KeyCode::Char('j')));
        view.update(&key(KeyCode::Down));
        view.update(&key(KeyCode::Down));
        assert_eq!(view.selected_index(), Some(2));

        view.update(&key(KeyCode::Char('g')));
        assert_eq!(view.selected_index(), Some(0));
        view.update(&key(KeyCode::End));
        assert_eq!(view.selected(), Some(MessageId(1)));
    }

    #[test]
    fn test_enter_opens_selected() {
        let mut view = loaded();
        view.update(&key(KeyCode::Down));

        let command = view.update(&key(KeyCode::Enter));

        let expected = view.headers()[1].clone();
        assert_eq!(command, Command::Emit(Event::ShowRead(expected)));
    }

    #[test]
    fn test_enter_on_empty_list_does_nothing() {
        let mut view = ListView::new();
        view.update(&Event::ListRefreshed(vec![]));
        assert_eq!(view.update(&key(KeyCode::Enter)), Command::None);
        assert_eq!(view.selected(), None);
    }

    #[test]
    fn test_keys_map_to_commands() {
        let mut view = loaded();
        assert_eq!(view.update(&key(KeyCode::Char('q'))), Command::Quit);
        assert_eq!(
            view.update(&key(KeyCode::Char('c'))),
            Command::Emit(Event::ShowCompose)
        );
        assert_eq!(
            view.update(&key(KeyCode::Char('r'))),
            Command::Task(Task::ListHeaders {
                force_refresh: true
            })
        );
    }

    #[test]
    fn test_selection_survives_refresh() {
        let mut view = loaded();
        view.update(&key(KeyCode::Down));
        assert_eq!(view.selected(), Some(MessageId(2)));

        let mut headers = sample_headers();
        headers.retain(|h| h.id != MessageId(3));
        view.update(&Event::ListRefreshed(headers));

        assert_eq!(view.selected(), Some(MessageId(2)));
        assert_eq!(view.selected_index(), Some(0));
    }

    fn type_query(view: &mut ListView, query: &str) {
        view.update(&key(KeyCode::Char('/')));
        for c in query.chars() {
            view.update(&key(KeyCode::Char(c)));
        }
    }

    fn visible_ids(view: &ListView) -> Vec<u32> {
        view.visible().iter().map(|h| h.id.0).collect()
    }

    #[test]
    fn test_filter_matches_subject_case_insensitively() {
        let mut view = loaded();
        type_query(&mut view, "HELLO");

        assert!(view.is_filtering());
        assert_eq!(view.query(), "HELLO");
        assert_eq!(visible_ids(&view), vec![3, 1]);
        assert_eq!(view.headers().len(), 3);
    }

    #[test]
    fn test_filter_matches_sender_and_all_terms() {
        let mut view = loaded();
        type_query(&mut view, "carol");
        assert_eq!(visible_ids(&view), vec![2]);

        let mut view = loaded();
        type_query(&mut view, "hello alice");
        assert_eq!(visible_ids(&view), vec![1]);
    }

    #[test]
    fn test_filter_matches_date() {
        let mut view = loaded();
        let date = view.headers()[1]
            .date
            .with_timezone(&chrono::Local)
            .format(DATE_FORMAT)
            .to_string();
        type_query(&mut view, &date);
        assert!(visible_ids(&view).contains(&2));
    }

    #[test]
    fn test_filter_keys_do_not_trigger_commands() {
        let mut view = loaded();
        view.update(&key(KeyCode::Char('/')));

        assert_eq!(view.update(&key(KeyCode::Char('q'))), Command::None);
        assert_eq!(view.update(&key(KeyCode::Char('c'))), Command::None);
        assert_eq!(view.query(), "qc");
    }

    #[test]
    fn test_hidden_selection_moves_to_first_match() {
        let mut view = loaded();
        view.update(&key(KeyCode::Down));
        assert_eq!(view.selected(), Some(MessageId(2)));

        type_query(&mut view, "hello");
        assert_eq!(view.selected(), Some(MessageId(3)));
        assert_eq!(view.selected_index(), Some(0));
    }

    #[test]
    fn test_navigation_stays_within_matches() {
        let mut view = loaded();
        type_query(&mut view, "hello");
        view.update(&key(KeyCode::Enter));
        assert!(!view.is_filtering());

        view.update(&key(KeyCode::Char('j')));
        view.update(&key(KeyCode::Char('j')));
        assert_eq!(view.selected(), Some(MessageId(1)));

        let command = view.update(&key(KeyCode::Enter));
        let expected = view.headers()[2].clone();
        assert_eq!(command, Command::Emit(Event::ShowRead(expected)));
    }

    #[test]
    fn test_esc_clears_filter_and_keeps_selection() {
        let mut view = loaded();
        type_query(&mut view, "hello");
        view.update(&key(KeyCode::Enter));
        view.update(&key(KeyCode::End));
        assert_eq!(view.selected(), Some(MessageId(1)));

        assert_eq!(view.update(&key(KeyCode::Esc)), Command::None);
        assert_eq!(view.query(), "");
        assert_eq!(visible_ids(&view), vec![3, 2, 1]);
        assert_eq!(view.selected(), Some(MessageId(1)));
    }

    #[test]
    fn test_refresh_under_filter_tracks_selection_by_id() {
        let mut view = loaded();
        type_query(&mut view, "hello");
        view.update(&key(KeyCode::Enter));
        view.update(&key(KeyCode::Down));
        assert_eq!(view.selected(), Some(MessageId(1)));

        let mut headers = sample_headers();
        let mut newer = headers[0].clone();
        newer.id = MessageId(4);
        newer.subject = "Hello again".to_string();
        headers.insert(0, newer);
        view.update(&Event::ListRefreshed(headers));

        assert_eq!(visible_ids(&view), vec![4, 3, 1]);
        assert_eq!(view.selected(), Some(MessageId(1)));
        assert_eq!(view.selected_index(), Some(2));
    }

    #[test]
    fn test_filter_with_no_matches_clears_selection() {
        let mut view = loaded();
        type_query(&mut view, "zzz");
        assert!(view.visible().is_empty());
        assert_eq!(view.selected(), None);
        assert_eq!(view.update(&key(KeyCode::Enter)), Command::None);
    }
}
