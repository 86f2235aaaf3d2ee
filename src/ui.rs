use crate::error::JournalError;
use crate::journal_entry::JournalEntry;
use crate::journal_state::EntryStore;
use chrono::{DateTime, Days, Local};
use color_eyre::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Frame, Terminal,
};
use std::{
    io::{stdout, Stdout},
    time::{Duration, Instant},
};
use unicode_width::UnicodeWidthChar;

pub enum Action {
    Write,
    History,
    Quit,
}

pub enum HistoryAction {
    Delete(i64),
    ClearAll,
    Back,
}

pub struct Notice {
    pub text: String,
    pub is_error: bool,
}

impl Notice {
    pub fn info(text: impl Into<String>) -> Self {
        Notice {
            text: text.into(),
            is_error: false,
        }
    }

    pub fn error(err: &JournalError) -> Self {
        Notice {
            text: describe_error(err).to_string(),
            is_error: true,
        }
    }
}

pub struct UI {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    cursor_position: usize,
    cursor_visible: bool,
    last_cursor_update: Instant,
}

impl UI {
    pub fn new() -> Result<Self> {
        enable_raw_mode()?;
        stdout().execute(EnterAlternateScreen)?;

        let backend = CrosstermBackend::new(stdout());
        let terminal = Terminal::new(backend)?;

        Ok(UI {
            terminal,
            cursor_position: 0,
            cursor_visible: true,
            last_cursor_update: Instant::now(),
        })
    }

    pub fn restore(&mut self) -> Result<()> {
        disable_raw_mode()?;
        stdout().execute(LeaveAlternateScreen)?;
        self.terminal.show_cursor()?;
        Ok(())
    }

    pub fn display(
        &mut self,
        store: &EntryStore,
        now: &DateTime<Local>,
        notice: Option<&Notice>,
    ) -> Result<()> {
        let today = store
            .latest_entry()
            .filter(|_| store.submitted_today(now))
            .cloned();
        let has_entries = !store.entries().is_empty();

        self.terminal.draw(|f| {
            let chunks = screen_layout(f.area(), 3);
            render_title(f, chunks[0], "Mood Journal");

            match &today {
                Some(entry) => render_entry_card(f, chunks[1], entry, "Today"),
                None => {
                    let prompt = Paragraph::new("How are you feeling today?")
                        .block(Block::default().borders(Borders::ALL).title("Today"))
                        .alignment(Alignment::Center);
                    f.render_widget(prompt, chunks[1]);
                }
            }

            render_notice(f, chunks[2], notice);

            let mut controls = vec![Span::raw("Press ")];
            if today.is_none() {
                controls.push(key_span("w"));
                controls.push(Span::raw(" to write, "));
            }
            if has_entries {
                controls.push(key_span("h"));
                controls.push(Span::raw(" for history, "));
            }
            controls.push(key_span("q"));
            controls.push(Span::raw(" to quit"));
            render_controls(f, chunks[3], Line::from(controls));
        })?;

        Ok(())
    }

    pub fn handle_input(&self, store: &EntryStore) -> Result<Option<Action>> {
        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                return Ok(None);
            }
            match key.code {
                KeyCode::Char('w') => Ok(Some(Action::Write)),
                KeyCode::Char('q') => Ok(Some(Action::Quit)),
                KeyCode::Char('h') if !store.entries().is_empty() => Ok(Some(Action::History)),
                _ => Ok(None),
            }
        } else {
            Ok(None)
        }
    }

    /// Returns `None` when the user cancels with Esc.
    pub fn get_new_entry(&mut self) -> Result<Option<String>> {
        let mut content = String::new();
        self.cursor_position = 0;

        loop {
            let now = Instant::now();
            if now.duration_since(self.last_cursor_update) >= Duration::from_millis(500) {
                self.cursor_visible = !self.cursor_visible;
                self.last_cursor_update = now;
            }

            let shown = if self.cursor_visible {
                let mut with_cursor = content.clone();
                with_cursor.insert(byte_index(&content, self.cursor_position), '|');
                with_cursor
            } else {
                content.clone()
            };

            self.terminal.draw(|f| {
                let chunks = screen_layout(f.area(), 3);
                render_title(f, chunks[0], "New Entry");

                let input = Paragraph::new(shown)
                    .wrap(Wrap { trim: false })
                    .block(Block::default().borders(Borders::ALL).title("How was your day?"));
                f.render_widget(input, chunks[1]);

                render_controls(f, chunks[3], Line::from("Enter: Submit, Esc: Cancel"));
            })?;

            if !event::poll(Duration::from_millis(50))? {
                continue;
            }
            let Event::Key(key) = event::read()? else {
                continue;
            };
            if key.kind != KeyEventKind::Press {
                continue;
            }
            let len = content.chars().count();
            match key.code {
                KeyCode::Esc => return Ok(None),
                KeyCode::Enter => {
                    if !content.trim().is_empty() {
                        return Ok(Some(content));
                    }
                }
                KeyCode::Char(c) => {
                    content.insert(byte_index(&content, self.cursor_position), c);
                    self.cursor_position += 1;
                }
                KeyCode::Backspace => {
                    if self.cursor_position > 0 {
                        self.cursor_position -= 1;
                        content.remove(byte_index(&content, self.cursor_position));
                    }
                }
                KeyCode::Delete => {
                    if self.cursor_position < len {
                        content.remove(byte_index(&content, self.cursor_position));
                    }
                }
                KeyCode::Left => self.cursor_position = self.cursor_position.saturating_sub(1),
                KeyCode::Right => self.cursor_position = (self.cursor_position + 1).min(len),
                KeyCode::Home => self.cursor_position = 0,
                KeyCode::End => self.cursor_position = len,
                _ => {}
            }
        }
    }

    pub fn show_loading(&mut self, text: &str) -> Result<()> {
        let text = text.to_string();
        self.terminal.draw(|f| {
            let chunks = screen_layout(f.area(), 3);
            render_title(f, chunks[0], "New Entry");
            let body = Paragraph::new(text)
                .wrap(Wrap { trim: false })
                .block(Block::default().borders(Borders::ALL).title("Your entry"));
            f.render_widget(body, chunks[1]);
            let loading = Paragraph::new("Reading your day...")
                .style(Style::default().fg(Color::Cyan))
                .alignment(Alignment::Center);
            f.render_widget(loading, chunks[2]);
        })?;
        Ok(())
    }

    pub fn history(
        &mut self,
        store: &EntryStore,
        notice: Option<&Notice>,
    ) -> Result<HistoryAction> {
        let entries = store.entries();
        let now = Local::now();
        let week_start = now
            .date_naive()
            .checked_sub_days(Days::new(6))
            .unwrap_or(now.date_naive());
        let this_week = store.entries_since(week_start, &Local).len();
        let mut selected_index = 0;

        loop {
            self.terminal.draw(|f| {
                let chunks = screen_layout(f.area(), 3);
                render_title(
                    f,
                    chunks[0],
                    &format!("History ({} this week, {} total)", this_week, entries.len()),
                );

                let width = chunks[1].width.saturating_sub(24) as usize;
                let items: Vec<ListItem> = entries
                    .iter()
                    .map(|e| {
                        ListItem::new(Line::from(vec![
                            Span::raw(format!("[{}] ", format_day(e))),
                            Span::styled(
                                format!("{:<13}", e.sentiment.label()),
                                Style::default()
                                    .fg(parse_color(e.display_color()))
                                    .add_modifier(Modifier::BOLD),
                            ),
                            Span::raw(truncate_to_width(
                                e.message.lines().next().unwrap_or(""),
                                width,
                            )),
                        ]))
                    })
                    .collect();

                let entries_list = List::new(items)
                    .block(Block::default().borders(Borders::ALL).title("Entries"))
                    .highlight_style(Style::default().add_modifier(Modifier::BOLD))
                    .highlight_symbol("> ");

                f.render_stateful_widget(
                    entries_list,
                    chunks[1],
                    &mut ListState::default().with_selected(Some(selected_index)),
                );

                render_notice(f, chunks[2], notice);
                render_controls(
                    f,
                    chunks[3],
                    Line::from("Up/Down: Navigate, Enter: View, d: Delete, c: Clear all, Esc: Back"),
                );
            })?;

            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                match key.code {
                    KeyCode::Up => selected_index = selected_index.saturating_sub(1),
                    KeyCode::Down => {
                        if selected_index + 1 < entries.len() {
                            selected_index += 1;
                        }
                    }
                    KeyCode::Enter => {
                        if let Some(entry) = entries.get(selected_index) {
                            self.view_full_entry(entry)?;
                        }
                    }
                    KeyCode::Char('d') => {
                        if let Some(entry) = entries.get(selected_index) {
                            if self.confirm("Delete this entry? (y/n)")? {
                                return Ok(HistoryAction::Delete(entry.id));
                            }
                        }
                    }
                    KeyCode::Char('c') => {
                        if self.confirm("Delete the whole history? (y/n)")? {
                            return Ok(HistoryAction::ClearAll);
                        }
                    }
                    KeyCode::Esc => return Ok(HistoryAction::Back),
                    _ => {}
                }
            }
        }
    }

    fn view_full_entry(&mut self, entry: &JournalEntry) -> Result<()> {
        self.terminal.draw(|f| {
            let chunks = screen_layout(f.area(), 1);
            render_title(f, chunks[0], &format!("Entry from {}", format_day(entry)));
            render_entry_card(f, chunks[1], entry, "Entry");
            render_controls(f, chunks[3], Line::from("Any key: Back"));
        })?;

        loop {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    return Ok(());
                }
            }
        }
    }

    fn confirm(&mut self, question: &str) -> Result<bool> {
        self.terminal.draw(|f| {
            let area = centered(f.area(), 50, 5);
            let dialog = Paragraph::new(question)
                .style(Style::default().fg(Color::Red))
                .alignment(Alignment::Center)
                .block(Block::default().borders(Borders::ALL).title("Confirm"));
            f.render_widget(ratatui::widgets::Clear, area);
            f.render_widget(dialog, area);
        })?;

        loop {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                return Ok(matches!(key.code, KeyCode::Char('y') | KeyCode::Char('Y')));
            }
        }
    }
}

impl Drop for UI {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = stdout().execute(LeaveAlternateScreen);
    }
}

/// User-facing message for each failure category.
pub fn describe_error(err: &JournalError) -> &'static str {
    match err {
        JournalError::Validation => "Please write something before submitting.",
        JournalError::Connectivity => "No internet connection. Check your network and try again.",
        JournalError::Inference(_) => "The analysis service failed. Please try again later.",
        JournalError::Timeout(_) => "The analysis took too long. Please try again.",
        JournalError::Persistence(_) => "Your journal could not be saved.",
        JournalError::AlreadySubmittedToday => "You already wrote today's entry. See you tomorrow!",
        JournalError::DuplicateEntry(_) => "This entry already exists.",
        JournalError::Config(_) => "The configuration file is invalid.",
    }
}

/// Maps a stored colour (`#rrggbb` or a name) to a terminal colour.
pub fn parse_color(color: &str) -> Color {
    if let Some(hex) = color.strip_prefix('#') {
        if hex.len() >= 6 && hex.is_ascii() {
            let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
            if let (Some(r), Some(g), Some(b)) = (channel(0), channel(2), channel(4)) {
                return Color::Rgb(r, g, b);
            }
        }
        return Color::Gray;
    }
    match color {
        "green" => Color::Green,
        "red" => Color::Red,
        _ => Color::Gray,
    }
}

/// Cuts `text` to at most `max` terminal columns, marking the cut with `…`.
pub fn truncate_to_width(text: &str, max: usize) -> String {
    let total: usize = text.chars().map(|c| c.width().unwrap_or(0)).sum();
    if total <= max {
        return text.to_string();
    }
    let mut out = String::new();
    let mut used = 0;
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w + 1 > max {
            break;
        }
        out.push(c);
        used += w;
    }
    if max > 0 {
        out.push('…');
    }
    out
}

fn byte_index(s: &str, char_index: usize) -> usize {
    s.char_indices()
        .nth(char_index)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

fn format_day(entry: &JournalEntry) -> String {
    entry
        .created_at()
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "unknown date".to_string())
}

fn screen_layout(area: Rect, notice_height: u16) -> std::rc::Rc<[Rect]> {
    Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(6),
            Constraint::Length(notice_height),
            Constraint::Length(3),
        ])
        .split(area)
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}

fn key_span(key: &str) -> Span<'_> {
    Span::styled(key, Style::default().add_modifier(Modifier::BOLD))
}

fn render_title(f: &mut Frame, area: Rect, title: &str) {
    let title = Paragraph::new(title.to_string())
        .style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .alignment(Alignment::Center);
    f.render_widget(title, area);
}

fn render_controls(f: &mut Frame, area: Rect, controls: Line) {
    let controls = Paragraph::new(controls)
        .style(Style::default().fg(Color::Yellow))
        .alignment(Alignment::Center);
    f.render_widget(controls, area);
}

fn render_notice(f: &mut Frame, area: Rect, notice: Option<&Notice>) {
    let Some(notice) = notice else {
        return;
    };
    let color = if notice.is_error { Color::Red } else { Color::Green };
    let paragraph = Paragraph::new(notice.text.clone())
        .style(Style::default().fg(color))
        .wrap(Wrap { trim: true })
        .alignment(Alignment::Center);
    f.render_widget(paragraph, area);
}

fn render_entry_card(f: &mut Frame, area: Rect, entry: &JournalEntry, title: &str) {
    let color = parse_color(entry.display_color());
    let label = Style::default().add_modifier(Modifier::BOLD);
    let lines = vec![
        Line::from(Span::styled(
            entry.sentiment.label(),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(vec![Span::styled("Message: ", label), Span::raw(entry.message.clone())]),
        Line::from(vec![Span::styled("Summary: ", label), Span::raw(entry.summary.clone())]),
        Line::from(vec![
            Span::styled("Suggestion: ", label),
            Span::raw(entry.suggestion.clone()),
        ]),
    ];
    let card = Paragraph::new(lines).wrap(Wrap { trim: false }).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(color))
            .title(title.to_string()),
    );
    f.render_widget(card, area);
}
