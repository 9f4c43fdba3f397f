//! Viewer state and key handling
//!
//! The viewer holds the latest publication: its records flattened into
//! styled lines for display, plus the snapshot they came from so a selected
//! `path:line` token can be resolved back to a file on disk.

use std::path::PathBuf;

use anyhow::Result;
use crossterm::event::{KeyCode, KeyModifiers};
use ratatui::prelude::*;
use ratatui::widgets::{List, ListItem, ListState, Paragraph};

use super::event::{Event, EventHandler};
use super::ui::Terminal;
use crate::index::TaskIndex;
use crate::render::{DisplayRecord, Publication, Style as RecordStyle};
use crate::render::RenderReceiver;

/// One display line, assembled from record fragments
#[derive(Debug, Clone, Default)]
struct ViewLine {
    spans: Vec<(String, RecordStyle)>,

    /// The `path:line` token, present only on task lines
    location: Option<String>,
}

/// Application state
pub struct App {
    /// Flattened lines of the newest publication
    lines: Vec<ViewLine>,

    /// Snapshot behind those lines, for selection resolution
    snapshot: TaskIndex,

    /// Total tasks in the snapshot, for the status bar
    task_count: usize,

    /// Selected line index
    selected: usize,

    /// List scroll state
    list_state: ListState,

    /// Editor command from the config, if any
    editor: Option<String>,

    /// Status message to display
    status_message: Option<String>,

    /// Whether to quit
    should_quit: bool,

    /// Pending edit action (file to open)
    pending_edit: Option<PathBuf>,
}

impl App {
    pub fn new(editor: Option<String>) -> Self {
        Self {
            lines: Vec::new(),
            snapshot: TaskIndex::new(),
            task_count: 0,
            selected: 0,
            list_state: ListState::default(),
            editor,
            status_message: None,
            should_quit: false,
            pending_edit: None,
        }
    }

    /// Swaps in a new publication, keeping the selection in range
    pub fn apply(&mut self, publication: Publication) {
        self.lines = build_lines(&publication.records);
        self.task_count = publication.snapshot.task_count();
        self.snapshot = publication.snapshot;

        if self.selected >= self.lines.len() {
            self.selected = self.lines.len().saturating_sub(1);
        }
    }

    /// Run the main viewer loop
    pub fn run(
        &mut self,
        terminal: &mut Terminal,
        events: EventHandler,
        updates: &RenderReceiver,
    ) -> Result<()> {
        while !self.should_quit {
            if let Some(path) = self.pending_edit.take() {
                self.execute_editor(terminal, &path)?;
                continue;
            }

            terminal.draw(|frame| self.draw(frame))?;

            match events.next()? {
                Event::Key(key) => self.handle_key(key),
                Event::Resize(_, _) => {}
                Event::Tick => {
                    if let Some(publication) = updates.latest() {
                        self.apply(publication);
                    }
                }
            }
        }

        Ok(())
    }

    /// Execute the editor and reinitialize the terminal afterwards
    fn execute_editor(&mut self, terminal: &mut Terminal, path: &std::path::Path) -> Result<()> {
        let editor = self
            .editor
            .clone()
            .or_else(|| std::env::var("EDITOR").ok())
            .unwrap_or_else(|| "vi".to_string());

        super::ui::restore_terminal()?;

        let status = std::process::Command::new(&editor).arg(path).status();

        // Reinitialize regardless of how the editor exited.
        *terminal = super::ui::init_terminal()?;

        match status {
            Ok(exit_status) => {
                if !exit_status.success() {
                    self.status_message =
                        Some(format!("Editor exited with code: {:?}", exit_status.code()));
                }
            }
            Err(e) => {
                self.status_message = Some(format!("Failed to run editor: {}", e));
            }
        }

        Ok(())
    }

    fn draw(&mut self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(1), Constraint::Length(1)])
            .split(frame.area());

        let items: Vec<ListItem> = self
            .lines
            .iter()
            .map(|line| {
                let spans: Vec<Span> = line
                    .spans
                    .iter()
                    .map(|(text, style)| Span::styled(text.clone(), style_for(*style)))
                    .collect();
                ListItem::new(Line::from(spans))
            })
            .collect();

        let list = List::new(items)
            .highlight_style(ratatui::style::Style::default().add_modifier(Modifier::REVERSED));

        self.list_state
            .select((!self.lines.is_empty()).then_some(self.selected));
        frame.render_stateful_widget(list, chunks[0], &mut self.list_state);

        let status = self.status_message.clone().unwrap_or_else(|| {
            format!(
                "{} tasks   j/k move   Enter open   q quit",
                self.task_count
            )
        });
        frame.render_widget(
            Paragraph::new(status).style(ratatui::style::Style::default().add_modifier(Modifier::DIM)),
            chunks[1],
        );
    }

    fn handle_key(&mut self, key: crossterm::event::KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }

        match key.code {
            KeyCode::Char('q') => {
                self.should_quit = true;
            }

            KeyCode::Char('j') | KeyCode::Down => {
                if self.selected + 1 < self.lines.len() {
                    self.selected += 1;
                }
                self.status_message = None;
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.selected = self.selected.saturating_sub(1);
                self.status_message = None;
            }
            KeyCode::Char('g') => {
                self.selected = 0;
            }
            KeyCode::Char('G') => {
                self.selected = self.lines.len().saturating_sub(1);
            }

            KeyCode::Enter => {
                self.open_selected();
            }

            _ => {}
        }
    }

    /// Resolves the selected line's `path:line` token and queues the editor
    fn open_selected(&mut self) {
        let Some(location) = self
            .lines
            .get(self.selected)
            .and_then(|line| line.location.as_deref())
        else {
            self.status_message = Some("No task on this line".to_string());
            return;
        };

        let relative = location.rsplit_once(':').map(|(path, _)| path).unwrap_or(location);

        match self.snapshot.resolve(relative) {
            Some(path) => self.pending_edit = Some(path),
            None => {
                self.status_message = Some(format!("Cannot resolve {}", relative));
            }
        }
    }
}

/// Flattens record fragments into display lines, carrying the `path:line`
/// token of each task row
fn build_lines(records: &[DisplayRecord]) -> Vec<ViewLine> {
    let mut lines = Vec::new();
    let mut current = ViewLine::default();

    for record in records {
        let mut parts = record.text.split('\n');

        if let Some(first) = parts.next() {
            if !first.is_empty() {
                if record.style == RecordStyle::Italic {
                    current.location = Some(first.to_string());
                }
                current.spans.push((first.to_string(), record.style));
            }
        }

        // Each remaining part sits behind a newline boundary.
        for part in parts {
            lines.push(std::mem::take(&mut current));
            if !part.is_empty() {
                current.spans.push((part.to_string(), record.style));
            }
        }
    }

    if !current.spans.is_empty() {
        lines.push(current);
    }

    lines
}

fn style_for(style: RecordStyle) -> ratatui::style::Style {
    let base = ratatui::style::Style::default();
    match style {
        RecordStyle::Heading => base.add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
        RecordStyle::Bold => base.add_modifier(Modifier::BOLD),
        RecordStyle::Italic => base.add_modifier(Modifier::ITALIC),
        RecordStyle::Plain => base,
    }
}
