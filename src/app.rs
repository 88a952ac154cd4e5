use std::time::Instant;

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::model::autosave::Autosave;
use crate::model::config::AppConfig;
use crate::model::detail::{DetailView, Field, SaveStatus};
use crate::model::edit::{self, BULLET_PREFIX, CHECKED, TODO_PREFIX};
use crate::model::listing::{self, EMPTY_PREVIEW, NO_RESULTS};
use crate::model::mode::Mode;
use crate::model::notebook::Notebook;
use crate::model::storage::{FileStore, KeyValueStore, Persistence};
use crate::model::topic::{Topic, TopicId, UNTITLED};
use crate::msg::{Direction as MoveDir, Msg};
use crate::util::{format_timestamp, now_ms};

/// Rows each topic takes in the list panel.
const LIST_ENTRY_ROWS: usize = 2;

pub struct App {
    pub mode: Mode,
    notebook: Notebook,
    detail: DetailView,
    autosave: Autosave,
    search_query: String,
    list_selected: usize,
    pending_delete: Option<TopicId>,
    config: AppConfig,
    pub should_quit: bool,
}

impl App {
    pub fn new(config: AppConfig) -> Result<Self> {
        let data_dir = config.data_dir();
        std::fs::create_dir_all(&data_dir)?;

        let store = FileStore::new(data_dir);
        tracing::info!("notebook storage at {}", store.dir().display());

        Ok(Self::with_store(config, Box::new(store)))
    }

    pub fn with_store(config: AppConfig, store: Box<dyn KeyValueStore>) -> Self {
        let persistence = Persistence::new(store, config.general.storage_key.clone());
        let notebook = Notebook::open(persistence);

        let mut detail = DetailView::new();
        detail.note.viewport.scroll_off = config.editor.scroll_off;
        detail.sync(notebook.find_active());

        let mut app = Self {
            mode: Mode::Normal,
            notebook,
            detail,
            autosave: Autosave::new(config.auto_save_delay()),
            search_query: String::new(),
            list_selected: 0,
            pending_delete: None,
            config,
            should_quit: false,
        };
        app.follow_active_in_list();
        app
    }

    // ── MVU: Update ──────────────────────────────────────────────

    pub fn update(&mut self, msg: Msg) {
        match msg {
            Msg::Key(key) => self.handle_key(key),
            Msg::Resize(_w, h) => {
                // top bar + status bar + title box + note borders + meta line
                self.detail.note.viewport.height = h.saturating_sub(8).max(1);
                self.detail.note.scroll_to_cursor();
            }
            Msg::NewTopic => self.new_topic(),
            Msg::SelectTopic(id) => self.select_topic(&id),
            Msg::RequestDelete(id) => self.request_delete(id),
            Msg::ConfirmDelete => self.confirm_delete(),
            Msg::CancelDelete => self.cancel_delete(),
            Msg::FocusField(field) => self.focus(field),
            Msg::FieldChanged(field) => self.field_changed(field, Instant::now()),
            Msg::InsertBullet => self.insert_prefix(BULLET_PREFIX, Instant::now()),
            Msg::InsertTodo => self.insert_prefix(TODO_PREFIX, Instant::now()),
            Msg::ToggleTodo => self.toggle_todo(Instant::now()),
            Msg::SetSearch(query) => self.set_search(query),
            Msg::Tick => self.handle_tick(Instant::now()),
            Msg::Quit => {
                self.flush_autosave();
                self.should_quit = true;
            }
        }
    }

    fn handle_key(&mut self, key: KeyEvent) {
        match self.mode {
            Mode::Normal => self.handle_key_normal(key),
            Mode::EditTitle => self.handle_key_title(key),
            Mode::EditNote => self.handle_key_note(key),
            Mode::Search => self.handle_key_search(key),
            Mode::ConfirmDelete => self.handle_key_confirm_delete(key),
        }
    }

    fn handle_key_normal(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => self.update(Msg::Quit),
            KeyCode::Char('j') | KeyCode::Down => self.move_selection(1),
            KeyCode::Char('k') | KeyCode::Up => self.move_selection(-1),
            KeyCode::Enter => {
                if let Some(id) = self.selected_topic_id() {
                    self.update(Msg::SelectTopic(id));
                }
            }
            KeyCode::Char('n') => self.update(Msg::NewTopic),
            KeyCode::Char('d') => {
                if let Some(id) = self.selected_topic_id() {
                    self.update(Msg::RequestDelete(id));
                }
            }
            KeyCode::Char('/') => self.mode = Mode::Search,
            KeyCode::Char('t') => self.update(Msg::FocusField(Some(Field::Title))),
            KeyCode::Char('i') | KeyCode::Tab => self.update(Msg::FocusField(Some(Field::Note))),
            KeyCode::Char('b') => self.update(Msg::InsertBullet),
            KeyCode::Char('o') => self.update(Msg::InsertTodo),
            KeyCode::Char('x') => self.update(Msg::ToggleTodo),
            _ => {}
        }
    }

    fn handle_key_title(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.update(Msg::FocusField(None)),
            KeyCode::Enter | KeyCode::Tab => self.update(Msg::FocusField(Some(Field::Note))),
            KeyCode::Backspace => {
                if !self.detail.take_title_selection() {
                    self.detail.title.delete_char_before();
                }
                self.update(Msg::FieldChanged(Field::Title));
            }
            KeyCode::Char(ch) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.detail.take_title_selection();
                self.detail.title.insert_char(ch);
                self.update(Msg::FieldChanged(Field::Title));
            }
            KeyCode::Left => self.move_field_cursor(Field::Title, MoveDir::Left),
            KeyCode::Right => self.move_field_cursor(Field::Title, MoveDir::Right),
            KeyCode::Home => self.move_field_cursor(Field::Title, MoveDir::LineStart),
            KeyCode::End => self.move_field_cursor(Field::Title, MoveDir::LineEnd),
            _ => {}
        }
    }

    fn handle_key_note(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            match key.code {
                KeyCode::Char('b') => self.update(Msg::InsertBullet),
                KeyCode::Char('t') => self.update(Msg::InsertTodo),
                KeyCode::Char('d') => self.update(Msg::ToggleTodo),
                _ => {}
            }
            return;
        }

        match key.code {
            KeyCode::Esc => self.update(Msg::FocusField(None)),
            KeyCode::Enter => {
                self.detail.note.insert_newline();
                self.update(Msg::FieldChanged(Field::Note));
            }
            KeyCode::Backspace => {
                self.detail.note.delete_char_before();
                self.update(Msg::FieldChanged(Field::Note));
            }
            KeyCode::Char(ch) => {
                self.detail.note.insert_char(ch);
                self.update(Msg::FieldChanged(Field::Note));
            }
            KeyCode::Left => self.move_field_cursor(Field::Note, MoveDir::Left),
            KeyCode::Right => self.move_field_cursor(Field::Note, MoveDir::Right),
            KeyCode::Up => self.move_field_cursor(Field::Note, MoveDir::Up),
            KeyCode::Down => self.move_field_cursor(Field::Note, MoveDir::Down),
            KeyCode::Home => self.move_field_cursor(Field::Note, MoveDir::LineStart),
            KeyCode::End => self.move_field_cursor(Field::Note, MoveDir::LineEnd),
            _ => {}
        }
    }

    fn handle_key_search(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.update(Msg::SetSearch(String::new()));
                self.mode = Mode::Normal;
            }
            KeyCode::Enter => self.mode = Mode::Normal,
            KeyCode::Backspace => {
                let mut query = self.search_query.clone();
                query.pop();
                self.update(Msg::SetSearch(query));
            }
            KeyCode::Char(ch)
                if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT =>
            {
                let mut query = self.search_query.clone();
                query.push(ch);
                self.update(Msg::SetSearch(query));
            }
            _ => {}
        }
    }

    fn handle_key_confirm_delete(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') => self.update(Msg::ConfirmDelete),
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                self.update(Msg::CancelDelete)
            }
            _ => {}
        }
    }

    fn move_field_cursor(&mut self, field: Field, dir: MoveDir) {
        if field == Field::Title {
            self.detail.deselect_title();
        }
        self.detail.buffer_mut(field).move_cursor(dir);
    }

    // ── Commands ─────────────────────────────────────────────────

    fn new_topic(&mut self) {
        self.flush_autosave();
        self.notebook.create_new(now_ms());

        self.detail.focus = None;
        self.detail.sync(self.notebook.find_active());
        self.follow_active_in_list();

        self.focus(Some(Field::Title));
        self.detail.select_title();
    }

    fn select_topic(&mut self, id: &TopicId) {
        self.flush_autosave();
        if !self.notebook.select(id) {
            return;
        }

        self.detail.focus = None;
        self.mode = Mode::Normal;
        self.detail.sync(self.notebook.find_active());
        self.follow_active_in_list();
    }

    fn request_delete(&mut self, id: TopicId) {
        if !self.notebook.state().contains(&id) {
            return;
        }
        self.pending_delete = Some(id);
        self.mode = Mode::ConfirmDelete;
    }

    fn confirm_delete(&mut self) {
        self.mode = Mode::Normal;
        let Some(id) = self.pending_delete.take() else {
            return;
        };

        self.flush_autosave();
        if self.notebook.delete(&id) {
            self.detail.focus = None;
            self.detail.sync(self.notebook.find_active());
            self.follow_active_in_list();
        }
    }

    fn cancel_delete(&mut self) {
        self.pending_delete = None;
        self.mode = Mode::Normal;
    }

    fn focus(&mut self, field: Option<Field>) {
        self.mode = match field {
            Some(Field::Title) => Mode::EditTitle,
            Some(Field::Note) => Mode::EditNote,
            None => Mode::Normal,
        };
        self.detail.focus = self.mode.focused_field();

        match field {
            Some(Field::Note) => {
                self.detail.deselect_title();
                self.on_note_focus();
            }
            Some(Field::Title) => {}
            None => self.detail.deselect_title(),
        }
    }

    /// Entering the note gives a blank title the placeholder.
    fn on_note_focus(&mut self) {
        let now = now_ms();
        self.notebook.ensure_active(now);

        if self.detail.title.is_blank() {
            self.detail.title.set_text(UNTITLED);
            let topic = self.notebook.reset_title(now);
            self.detail.refresh_meta(topic);
        }
        self.follow_active_in_list();
    }

    fn field_changed(&mut self, field: Field, now: Instant) {
        let created = self.notebook.find_active().is_none();
        self.notebook.ensure_active(now_ms());
        if created {
            self.follow_active_in_list();
        }

        if field == Field::Note {
            self.detail.recount();
        }
        self.detail.status = SaveStatus::Saving;
        self.autosave.schedule(now);
    }

    fn insert_prefix(&mut self, prefix: &str, now: Instant) {
        self.notebook.ensure_active(now_ms());

        let text = self.detail.note.text();
        let (text, cursor) = edit::insert_prefix(&text, self.detail.note.cursor_offset(), prefix);
        self.detail.note.replace(&text, cursor);

        self.focus(Some(Field::Note));
        self.field_changed(Field::Note, now);
    }

    fn toggle_todo(&mut self, now: Instant) {
        let text = self.detail.note.text();
        let cursor = self.detail.note.cursor_offset();

        if let Some(toggled) = edit::toggle_line_marker(&text, cursor) {
            self.detail.note.replace(&toggled, cursor);
            self.field_changed(Field::Note, now);
        }
    }

    fn set_search(&mut self, query: String) {
        self.search_query = query;
        self.follow_active_in_list();
    }

    // ── Autosave ─────────────────────────────────────────────────

    fn handle_tick(&mut self, now: Instant) {
        if self.autosave.poll(now) {
            self.commit();
        }
    }

    /// Commits now if an autosave is owed.
    fn flush_autosave(&mut self) {
        if self.autosave.flush() {
            self.commit();
        }
    }

    fn commit(&mut self) {
        let title = self.detail.title.text();
        let note = self.detail.note.text();

        let topic = self.notebook.commit(&title, &note, now_ms());
        self.detail.mark_committed(topic);
        self.follow_active_in_list();
    }

    // ── Topic list ───────────────────────────────────────────────

    fn visible_topics(&self) -> Vec<&Topic> {
        listing::project(self.notebook.state(), &self.search_query)
    }

    fn selected_topic_id(&self) -> Option<TopicId> {
        self.visible_topics()
            .get(self.list_selected)
            .map(|t| t.id.clone())
    }

    fn move_selection(&mut self, delta: isize) {
        let len = self.visible_topics().len();
        if len == 0 {
            self.list_selected = 0;
            return;
        }

        let max = len.saturating_sub(1) as isize;
        let next = (self.list_selected as isize + delta).clamp(0, max);
        self.list_selected = next as usize;
    }

    /// Keep the list cursor on the active topic when it is visible.
    fn follow_active_in_list(&mut self) {
        let (position, len) = {
            let visible = self.visible_topics();
            let active = self.notebook.active_id();
            (
                visible.iter().position(|t| Some(&t.id) == active),
                visible.len(),
            )
        };

        self.list_selected = match position {
            Some(pos) => pos,
            None => self.list_selected.min(len.saturating_sub(1)),
        };
    }

    // ── MVU: View ────────────────────────────────────────────────

    pub fn view(&mut self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // top bar
                Constraint::Min(1),    // body
                Constraint::Length(1), // status bar
            ])
            .split(frame.area());

        self.render_top_bar(frame, chunks[0]);

        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(32), Constraint::Min(1)])
            .split(chunks[1]);

        self.render_list(frame, body[0]);
        self.render_detail(frame, body[1]);
        self.render_status_bar(frame, chunks[2]);
    }

    fn render_top_bar(&self, frame: &mut Frame, area: Rect) {
        let spans = vec![
            Span::styled(
                format!(" {} ", self.detail.top_title()),
                Style::default()
                    .bg(Color::Rgb(30, 30, 45))
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                "  n: New  Enter: Open  d: Delete  /: Search  t: Title  i: Note  b: Bullet  o: Todo  x: Toggle  q: Quit ",
                Style::default()
                    .bg(Color::Rgb(20, 20, 30))
                    .fg(Color::DarkGray),
            ),
        ];

        frame.render_widget(
            Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Rgb(20, 20, 30))),
            area,
        );
    }

    fn render_list(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .title(" Topics ")
            .borders(Borders::RIGHT)
            .style(Style::default().bg(Color::Rgb(12, 12, 18)));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Min(1)])
            .split(inner);

        let search_style = if self.mode == Mode::Search {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        let search_line = format!("/ {}", self.search_query);
        frame.render_widget(Paragraph::new(Span::styled(search_line, search_style)), chunks[0]);

        if self.mode == Mode::Search {
            let x = chunks[0].x + Span::raw(format!("/ {}", self.search_query)).width() as u16;
            frame.set_cursor_position((x, chunks[0].y));
        }

        let topics = self.visible_topics();
        if topics.is_empty() {
            frame.render_widget(
                Paragraph::new(Span::styled(NO_RESULTS, Style::default().fg(Color::DarkGray))),
                chunks[1],
            );
            return;
        }

        let active = self.notebook.active_id();
        let preview_chars = self.config.list.preview_chars;
        let lines: Vec<Line> = topics
            .iter()
            .enumerate()
            .flat_map(|(idx, topic)| {
                let marker = if Some(&topic.id) == active { "● " } else { "  " };
                let title_style = if idx == self.list_selected {
                    Style::default().fg(Color::Black).bg(Color::Cyan)
                } else if Some(&topic.id) == active {
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(Color::Gray)
                };

                let mut preview = listing::preview(&topic.note, preview_chars);
                if preview.is_empty() {
                    preview = EMPTY_PREVIEW.to_string();
                }

                [
                    Line::from(Span::styled(
                        format!("{marker}{}", topic.display_title()),
                        title_style,
                    )),
                    Line::from(vec![
                        Span::styled(
                            format!("  {} ", format_timestamp(topic.updated_at)),
                            Style::default().fg(Color::DarkGray),
                        ),
                        Span::styled(preview, Style::default().fg(Color::Gray)),
                    ]),
                ]
            })
            .collect();

        let visible_rows = chunks[1].height as usize;
        let selected_bottom = (self.list_selected + 1) * LIST_ENTRY_ROWS;
        let scroll = selected_bottom.saturating_sub(visible_rows) as u16;

        frame.render_widget(Paragraph::new(lines).scroll((scroll, 0)), chunks[1]);
    }

    fn render_detail(&mut self, frame: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // title
                Constraint::Min(1),    // note
                Constraint::Length(1), // meta
            ])
            .split(area);

        let focused = Style::default().fg(Color::Cyan);
        let unfocused = Style::default().fg(Color::DarkGray);

        let title_style = if self.detail.is_title_selected() {
            Style::default().fg(Color::Black).bg(Color::Cyan)
        } else {
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD)
        };
        let title = Paragraph::new(Span::styled(self.detail.title.text(), title_style)).block(
            Block::default()
                .title(" Title ")
                .borders(Borders::ALL)
                .border_style(if self.mode == Mode::EditTitle {
                    focused
                } else {
                    unfocused
                }),
        );
        frame.render_widget(title, chunks[0]);

        let note_block = Block::default()
            .title(" Note ")
            .borders(Borders::ALL)
            .border_style(if self.mode == Mode::EditNote {
                focused
            } else {
                unfocused
            });
        let note_area = note_block.inner(chunks[1]);

        let note = &mut self.detail.note;
        if note.viewport.height != note_area.height.max(1) {
            note.viewport.height = note_area.height.max(1);
            note.scroll_to_cursor();
        }

        let top = note.viewport.top_line;
        let bottom = (top + note_area.height as usize).min(note.line_count());
        let lines: Vec<Line> = (top..bottom)
            .map(|i| {
                let text = note.line_text(i).unwrap_or_default();
                let style = note_line_style(&text);
                Line::from(Span::styled(text, style))
            })
            .collect();
        frame.render_widget(Paragraph::new(lines).block(note_block), chunks[1]);

        let meta = Line::from(vec![
            Span::styled(
                format!(" {}", self.detail.char_count_label()),
                Style::default().fg(Color::Gray),
            ),
            Span::styled(
                format!("  {}", self.detail.updated_label()),
                Style::default().fg(Color::DarkGray),
            ),
        ]);
        frame.render_widget(Paragraph::new(meta), chunks[2]);

        match self.mode {
            Mode::EditTitle => {
                let buf = &self.detail.title;
                let before: String = buf.text().chars().take(buf.cursor.col).collect();
                let x = title_cursor_x(chunks[0], &before);
                frame.set_cursor_position((x, chunks[0].y + 1));
            }
            Mode::EditNote => {
                let buf = &self.detail.note;
                let line = buf.line_text(buf.cursor.row).unwrap_or_default();
                let before: String = line.chars().take(buf.cursor.col).collect();
                let x = note_area.x + Span::raw(before).width() as u16;
                let y = buf.cursor.row.saturating_sub(buf.viewport.top_line) as u16 + note_area.y;
                if y < note_area.y + note_area.height {
                    frame.set_cursor_position((x, y));
                }
            }
            _ => {}
        }
    }

    fn render_status_bar(&self, frame: &mut Frame, area: Rect) {
        let mode_style = match self.mode {
            Mode::Normal => Style::default()
                .fg(Color::Black)
                .bg(Color::Magenta)
                .add_modifier(Modifier::BOLD),
            Mode::EditTitle | Mode::EditNote => Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            _ => Style::default()
                .fg(Color::Black)
                .bg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        };

        let mode_span = Span::styled(format!(" {} ", self.mode.label()), mode_style);

        let suffix = match self.mode {
            Mode::ConfirmDelete => {
                let name = self
                    .pending_delete
                    .as_ref()
                    .and_then(|id| self.notebook.state().find(id))
                    .map_or(UNTITLED, Topic::display_title);
                format!(" | delete \"{name}\"? (y/n)")
            }
            Mode::Search => format!(" | search: {}", self.search_query),
            Mode::EditNote => " | Ctrl+B bullet  Ctrl+T todo  Ctrl+D toggle  Esc list".to_string(),
            _ => String::new(),
        };

        let info = Span::styled(
            format!(" {}{} ", self.detail.status.label(), suffix),
            Style::default().fg(Color::Gray).bg(Color::DarkGray),
        );

        let bar = Line::from(vec![mode_span, info]);
        let status = Paragraph::new(bar).style(Style::default().bg(Color::DarkGray));
        frame.render_widget(status, area);
    }
}

/// Cursor column inside the bordered title box, pinned to its last inner cell.
fn title_cursor_x(area: Rect, before: &str) -> u16 {
    let x = area.x + 1 + Span::raw(before).width() as u16;
    x.min(area.x + area.width.saturating_sub(2))
}

fn note_line_style(text: &str) -> Style {
    let trimmed = text.trim_start();
    if trimmed.contains(CHECKED) {
        Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::CROSSED_OUT)
    } else if trimmed.starts_with(edit::UNCHECKED) {
        Style::default().fg(Color::Yellow)
    } else if trimmed.starts_with(BULLET_PREFIX) {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::White)
    }
}
