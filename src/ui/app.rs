//! Event loop and key bindings for the interactive editor.

use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Paragraph, Wrap};
use ratatui::{Frame, Terminal};
use tracing::{error, info};

use crate::config::Config;
use crate::error::EditError;
use crate::json;
use crate::outline::editor::TocEditor;
use crate::outline::{NodePath, Outline};
use crate::pdf::{save_outline, save_outline_as, PdfDocument};
use crate::ui::tree_view::TreeViewState;

const TICK_RATE: Duration = Duration::from_millis(120);

/// What typed characters currently feed into.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Mode {
    Normal,
    Rename(NodePath),
    Page(NodePath),
    Command,
}

pub struct EditorApp {
    path: PathBuf,
    page_count: u32,
    config: Config,
    editor: TocEditor,
    view: TreeViewState,
    mode: Mode,
    input: String,
    status: Option<StatusMessage>,
    should_quit: bool,
}

impl EditorApp {
    pub fn new(doc: PdfDocument, config: Config) -> Result<Self> {
        let outline = doc.outline()?;
        info!(
            path = %doc.path.display(),
            pages = doc.page_count(),
            entries = outline.len(),
            "loaded outline"
        );
        let mut app = Self::with_outline(doc.path.clone(), doc.page_count(), outline, config);
        app.set_status(
            StatusLevel::Info,
            format!(
                "Loaded {} · {} pages · {} entries",
                app.path.display(),
                app.page_count,
                app.editor.outline().len()
            ),
        );
        Ok(app)
    }

    pub fn with_outline(path: PathBuf, page_count: u32, outline: Outline, config: Config) -> Self {
        let view = TreeViewState::from_outline(&outline);
        let editor = TocEditor::new(outline, config.editor_options());
        Self {
            path,
            page_count,
            config,
            editor,
            view,
            mode: Mode::Normal,
            input: String::new(),
            status: None,
            should_quit: false,
        }
    }

    /// Launch the terminal UI and enter the event loop.
    pub fn run(&mut self) -> Result<()> {
        enable_raw_mode().context("failed to enable raw mode")?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;

        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).context("failed to initialize terminal")?;
        terminal.hide_cursor().ok();

        let event_loop_result = self.event_loop(&mut terminal);

        disable_raw_mode().ok();
        let _ = execute!(terminal.backend_mut(), LeaveAlternateScreen);
        let _ = terminal.show_cursor();

        event_loop_result
    }

    fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
        loop {
            terminal.draw(|frame| self.render(frame))?;
            self.tick();

            if self.should_quit {
                break;
            }

            if event::poll(TICK_RATE)? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key);
                    }
                }
            }
        }
        Ok(())
    }

    pub fn is_dirty(&self) -> bool {
        self.editor.is_dirty()
    }

    #[cfg(test)]
    fn outline(&self) -> &Outline {
        self.editor.outline()
    }

    #[cfg(test)]
    fn view(&self) -> &TreeViewState {
        &self.view
    }

    #[cfg(test)]
    fn should_quit(&self) -> bool {
        self.should_quit
    }

    #[cfg(test)]
    fn status_text(&self) -> Option<&str> {
        self.status.as_ref().map(|s| s.text.as_str())
    }

    fn render(&mut self, frame: &mut Frame<'_>) {
        let size = frame.size();
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(3),
                Constraint::Length(1),
                Constraint::Length(2),
            ])
            .split(size);

        let file_name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.path.display().to_string());
        let title = format!(
            " {}{} · {} entries · {} pages ",
            file_name,
            if self.is_dirty() { " [+]" } else { "" },
            self.editor.outline().len(),
            self.page_count
        );
        self.view
            .render(frame, layout[0], &title, self.mode == Mode::Normal);

        self.render_status(frame, layout[1]);

        let key = |k: &'static str| Span::styled(k, Style::default().fg(Color::Cyan));
        let history = self.editor.history();
        let undo_redo = match (history.can_undo(), history.can_redo()) {
            (true, true) => format!(" undo ({}) / redo · ", history.undo_depth()),
            (true, false) => format!(" undo ({}) · ", history.undo_depth()),
            (false, true) => " redo · ".to_string(),
            (false, false) => " undo/redo · ".to_string(),
        };
        let hints = Paragraph::new(Line::from(vec![
            key("a/A"),
            Span::raw(" add sibling/child · "),
            key("r"),
            Span::raw(" rename · "),
            key("p"),
            Span::raw(" page · "),
            key("del"),
            Span::raw(" delete · "),
            key("ctrl+↑/↓"),
            Span::raw(" move · "),
            key("tab/⇧tab"),
            Span::raw(" indent · "),
            key("ctrl+z/y"),
            Span::raw(undo_redo),
            key("ctrl+a"),
            Span::raw(" select all · "),
            key("ctrl+s"),
            Span::raw(" save · "),
            key(":"),
            Span::raw(" command"),
        ]))
        .wrap(Wrap { trim: true })
        .style(Style::default().fg(Color::Gray));
        frame.render_widget(hints, layout[2]);
    }

    fn render_status(&self, frame: &mut Frame<'_>, area: Rect) {
        let prompt = match &self.mode {
            Mode::Normal => None,
            Mode::Rename(_) => Some("Title: "),
            Mode::Page(_) => Some("Page (n or start-end): "),
            Mode::Command => Some(":"),
        };

        let line = if let Some(prompt) = prompt {
            Line::from(vec![
                Span::styled(prompt, Style::default().fg(Color::Cyan)),
                Span::styled(
                    format!("{}▏", self.input),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
            ])
        } else if let Some(status) = &self.status {
            let style = match status.level {
                StatusLevel::Info => Style::default().fg(Color::Gray),
                StatusLevel::Success => Style::default().fg(Color::Green),
                StatusLevel::Error => Style::default().fg(Color::Red),
            };
            Line::styled(status.text.clone(), style)
        } else {
            Line::styled(
                "Ready · press : for commands",
                Style::default().fg(Color::DarkGray),
            )
        };
        frame.render_widget(Paragraph::new(line), area);
    }

    fn tick(&mut self) {
        if let Some(status) = &self.status {
            if status.is_expired() {
                self.status = None;
            }
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        match self.mode.clone() {
            Mode::Normal => self.handle_normal_key(key),
            Mode::Rename(path) => {
                if let Some(text) = self.handle_input_key(key) {
                    let result = self.editor.rename(&path, &text).map(|_| path);
                    self.after_edit(result, "Renamed");
                }
            }
            Mode::Page(path) => {
                if let Some(text) = self.handle_input_key(key) {
                    match self.editor.set_target(&path, &text) {
                        Ok(target) => {
                            self.view.refresh(self.editor.outline(), Some(&path));
                            match target.start_page() {
                                Some(page) if page > self.page_count => self.set_status(
                                    StatusLevel::Error,
                                    format!(
                                        "Page {} is past the last page ({}); it will be saved without a destination",
                                        page, self.page_count
                                    ),
                                ),
                                _ => self.set_status(StatusLevel::Success, format!("Page set to {}", target)),
                            }
                        }
                        Err(err) => {
                            // Keep the prompt open so the value can be fixed.
                            self.mode = Mode::Page(path);
                            self.set_status(StatusLevel::Error, err.to_string());
                        }
                    }
                }
            }
            Mode::Command => {
                if let Some(text) = self.handle_input_key(key) {
                    if let Err(err) = self.execute_command(text.trim()) {
                        error!(error = %err, "command failed");
                        self.set_status(StatusLevel::Error, format!("{:#}", err));
                    }
                }
            }
        }
    }

    /// Feed a key into the input line. Returns the text once Enter is pressed.
    fn handle_input_key(&mut self, key: KeyEvent) -> Option<String> {
        match key.code {
            KeyCode::Esc => {
                self.mode = Mode::Normal;
                self.input.clear();
                None
            }
            KeyCode::Enter => {
                self.mode = Mode::Normal;
                Some(std::mem::take(&mut self.input))
            }
            KeyCode::Backspace => {
                self.input.pop();
                None
            }
            KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.input.clear();
                None
            }
            KeyCode::Char(ch) => {
                if !key
                    .modifiers
                    .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT)
                {
                    self.input.push(ch);
                }
                None
            }
            _ => None,
        }
    }

    fn handle_normal_key(&mut self, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let alt = key.modifiers.contains(KeyModifiers::ALT);

        if ctrl {
            match key.code {
                KeyCode::Char('c') | KeyCode::Char('q') => self.request_quit(false),
                KeyCode::Char('a') => {
                    self.view.select_all();
                    self.set_status(
                        StatusLevel::Info,
                        format!("Selected {} entries", self.view.selection_len()),
                    );
                }
                KeyCode::Char('s') => self.save(None),
                KeyCode::Char('z') => self.undo(),
                KeyCode::Char('y') => self.redo(),
                KeyCode::Char('d') => {
                    let result = self.editor.clear();
                    if let Ok(removed) = &result {
                        info!(removed, "deleted all entries");
                    }
                    self.after_edit(result.map(|_| NodePath::top(0)), "All TOC entries deleted");
                }
                KeyCode::Up => self.move_cursor_node(true),
                KeyCode::Down => self.move_cursor_node(false),
                _ => {}
            }
            return;
        }

        if alt {
            match key.code {
                KeyCode::Up => self.move_cursor_node(true),
                KeyCode::Down => self.move_cursor_node(false),
                _ => {}
            }
            return;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => {
                if self.view.selection_len() > 0 && key.code == KeyCode::Esc {
                    self.view.clear_selection();
                } else {
                    self.request_quit(false);
                }
            }
            KeyCode::Char('j') | KeyCode::Down => self.view.select_next(),
            KeyCode::Char('k') | KeyCode::Up => self.view.select_previous(),
            KeyCode::Home | KeyCode::Char('g') => self.view.select_first(),
            KeyCode::End | KeyCode::Char('G') => self.view.select_last(),
            KeyCode::Char(' ') => self.view.toggle_selected(),
            KeyCode::Char('a') => {
                let cursor = self.view.cursor_path();
                let result = self.editor.add_sibling(cursor.as_ref());
                self.after_add(result);
            }
            KeyCode::Char('A') => match self.view.cursor_path() {
                Some(parent) => {
                    let result = self.editor.add_child(&parent);
                    self.after_add(result);
                }
                None => self.set_status(StatusLevel::Error, EditError::NothingSelected.to_string()),
            },
            KeyCode::Char('r') | KeyCode::Enter | KeyCode::F(2) => {
                if let Some(row) = self.view.cursor_row() {
                    self.input = row.title.clone();
                    self.mode = Mode::Rename(row.path.clone());
                }
            }
            KeyCode::Char('p') => {
                if let Some(row) = self.view.cursor_row() {
                    self.input = match row.target.start_page() {
                        Some(_) => row.target.to_string(),
                        None => String::new(),
                    };
                    self.mode = Mode::Page(row.path.clone());
                }
            }
            KeyCode::Delete | KeyCode::Char('x') => self.delete_selected(),
            KeyCode::Tab => {
                if let Some(path) = self.view.cursor_path() {
                    let result = self.editor.indent(&path);
                    self.after_edit(result, "Indented");
                }
            }
            KeyCode::BackTab => {
                if let Some(path) = self.view.cursor_path() {
                    let result = self.editor.outdent(&path);
                    self.after_edit(result, "Outdented");
                }
            }
            KeyCode::Char('u') => self.undo(),
            KeyCode::Char(':') => {
                self.input.clear();
                self.mode = Mode::Command;
            }
            _ => {}
        }
    }

    fn after_edit(&mut self, result: Result<NodePath, EditError>, message: &str) {
        match result {
            Ok(focus) => {
                self.view.refresh(self.editor.outline(), Some(&focus));
                self.set_status(StatusLevel::Success, message);
            }
            Err(err) => self.set_status(StatusLevel::Error, err.to_string()),
        }
    }

    /// New entries open straight into the title prompt.
    fn after_add(&mut self, result: Result<NodePath, EditError>) {
        match result {
            Ok(path) => {
                self.view.refresh(self.editor.outline(), Some(&path));
                self.input = self
                    .editor
                    .outline()
                    .get(&path)
                    .map(|n| n.title.clone())
                    .unwrap_or_default();
                self.mode = Mode::Rename(path);
            }
            Err(err) => self.set_status(StatusLevel::Error, err.to_string()),
        }
    }

    fn move_cursor_node(&mut self, up: bool) {
        let Some(path) = self.view.cursor_path() else {
            return;
        };
        let result = if up {
            self.editor.move_up(&path)
        } else {
            self.editor.move_down(&path)
        };
        self.after_edit(result, if up { "Moved up" } else { "Moved down" });
    }

    fn delete_selected(&mut self) {
        let targets = self.view.targets();
        let focus = targets.first().cloned();
        let result = match targets.as_slice() {
            [single] => self.editor.delete(single).map(|node| {
                format!(
                    "Deleted '{}'{}",
                    node.title,
                    match node.descendant_count() {
                        0 => String::new(),
                        n => format!(" and {} nested entries", n),
                    }
                )
            }),
            _ => self
                .editor
                .delete_many(&targets)
                .map(|removed| format!("Deleted {} entries", removed)),
        };
        match result {
            Ok(message) => {
                self.view.refresh(self.editor.outline(), focus.as_ref());
                self.set_status(StatusLevel::Success, message);
            }
            Err(err) => self.set_status(StatusLevel::Error, err.to_string()),
        }
    }

    fn undo(&mut self) {
        match self.editor.undo() {
            Ok(true) => {
                self.view.refresh(self.editor.outline(), None);
                self.set_status(StatusLevel::Info, "Undo");
            }
            Ok(false) => self.set_status(StatusLevel::Info, "Nothing to undo"),
            Err(err) => self.set_status(StatusLevel::Error, err.to_string()),
        }
    }

    fn redo(&mut self) {
        match self.editor.redo() {
            Ok(true) => {
                self.view.refresh(self.editor.outline(), None);
                self.set_status(StatusLevel::Info, "Redo");
            }
            Ok(false) => self.set_status(StatusLevel::Info, "Nothing to redo"),
            Err(err) => self.set_status(StatusLevel::Error, err.to_string()),
        }
    }

    /// Save in place, or to a copy when `target` is given.
    fn save(&mut self, target: Option<&Path>) {
        let result = match target {
            Some(dest) => save_outline_as(&self.path, dest, self.editor.outline()),
            None => save_outline(&self.path, self.editor.outline()),
        };

        match result {
            Ok(summary) => {
                let written = target.unwrap_or(&self.path).display().to_string();
                if target.is_none() {
                    self.editor.mark_saved();
                }
                let mut message = format!("Saved {} entries to {}", summary.entries, written);
                if summary.without_destination > 0 {
                    message.push_str(&format!(
                        " ({} without a page in this document)",
                        summary.without_destination
                    ));
                }
                self.set_status(StatusLevel::Success, message);
            }
            Err(err) => {
                error!(error = %err, "save failed");
                self.set_status(StatusLevel::Error, format!("Could not save PDF: {:#}", err));
            }
        }
    }

    fn request_quit(&mut self, force: bool) {
        if force || !self.is_dirty() {
            self.should_quit = true;
        } else {
            self.set_status(
                StatusLevel::Error,
                "Unsaved changes · ctrl+s to save, :q! to discard",
            );
        }
    }

    fn execute_command(&mut self, command: &str) -> Result<()> {
        let (name, arg) = match command.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, Some(rest.trim()).filter(|r| !r.is_empty())),
            None => (command, None),
        };

        match (name, arg) {
            ("w", None) | ("write", None) => self.save(None),
            ("w", Some(dest)) | ("write", Some(dest)) | ("saveas", Some(dest)) => {
                self.save(Some(Path::new(dest)))
            }
            ("wq", None) => {
                self.save(None);
                if !self.is_dirty() {
                    self.should_quit = true;
                }
            }
            ("q", None) | ("quit", None) => self.request_quit(false),
            ("q!", None) => self.request_quit(true),
            ("import", Some(file)) => {
                let outline = json::import_file(file)?;
                let count = outline.len();
                self.editor.replace(outline)?;
                self.view.refresh(self.editor.outline(), Some(&NodePath::top(0)));
                self.set_status(StatusLevel::Success, format!("Imported {} entries from {}", count, file));
            }
            ("export", Some(file)) => {
                if self.editor.outline().is_empty() {
                    self.set_status(StatusLevel::Info, "No TOC entries to export");
                    return Ok(());
                }
                json::export_file(file, self.editor.outline(), self.config.json.pretty)?;
                self.set_status(StatusLevel::Success, format!("Exported TOC to {}", file));
            }
            ("undo", None) => self.undo(),
            ("redo", None) => self.redo(),
            ("", None) => {}
            _ => anyhow::bail!("Unknown command: {}", command),
        }
        Ok(())
    }

    fn set_status<S: Into<String>>(&mut self, level: StatusLevel, message: S) {
        self.status = Some(StatusMessage::new(level, message.into()));
    }
}

struct StatusMessage {
    level: StatusLevel,
    text: String,
    expires_at: Instant,
}

impl StatusMessage {
    fn new(level: StatusLevel, text: String) -> Self {
        Self {
            level,
            text,
            expires_at: Instant::now() + Duration::from_secs(5),
        }
    }

    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

#[derive(Debug, Clone, Copy)]
enum StatusLevel {
    Info,
    Success,
    Error,
}
