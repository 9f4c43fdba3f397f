//! Snapshot rendering and the display handoff queue
//!
//! Rendering is a pure function of the snapshot: the same index always
//! produces the same record sequence. The handoff is a fire-and-forget
//! channel; the consumer drains it on its own schedule and only the newest
//! publication matters.

use std::sync::mpsc;

use crate::engine::Directory;
use crate::index::{Task, TaskIndex};
use crate::scan::PatternSet;

/// Text style of one display record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    Plain,
    Bold,
    Italic,
    Heading,
}

/// One fragment of rendered output
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayRecord {
    pub text: String,
    pub style: Style,
}

impl DisplayRecord {
    fn new(text: impl Into<String>, style: Style) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }
}

/// One publication: the rendered records plus the snapshot they came from,
/// so the consumer can resolve a selected `path:line` back to a file
#[derive(Debug, Clone)]
pub struct Publication {
    pub records: Vec<DisplayRecord>,
    pub snapshot: TaskIndex,
}

/// Converts a snapshot into the ordered display-record sequence
///
/// Directories render in configured order; within a directory, patterns in
/// pattern-set order, each aggregating the tasks of every file (files in
/// sorted relative-path order, since the walker promises no order). Column
/// padding for the task text derives from the longest `path:line` string in
/// the entire snapshot so the whole display lines up.
pub fn render(
    snapshot: &TaskIndex,
    directories: &[Directory],
    patterns: &PatternSet,
) -> Vec<DisplayRecord> {
    let max_len = longest_location(snapshot);
    let mut records = Vec::new();

    for dir in directories {
        let Some(files) = snapshot.files(&dir.root) else {
            continue;
        };

        records.push(DisplayRecord::new(
            format!("DIRECTORY: {}\n", dir.root.display()),
            Style::Heading,
        ));

        let mut paths: Vec<&String> = files.keys().collect();
        paths.sort();

        for pattern in patterns.names() {
            let tasks: Vec<&Task> = paths
                .iter()
                .flat_map(|path| files[*path].tasks_for(pattern))
                .collect();

            if tasks.is_empty() {
                continue;
            }

            records.push(DisplayRecord::new(format!("{}\n", pattern), Style::Bold));

            for (i, task) in tasks.iter().enumerate() {
                let number = i + 1;
                let numbering = if number < 10 {
                    format!("{}.  ", number)
                } else {
                    format!("{}. ", number)
                };
                records.push(DisplayRecord::new(numbering, Style::Bold));

                let location = format!("{}:{}", task.path, task.line);
                records.push(DisplayRecord::new(location.clone(), Style::Italic));
                records.push(DisplayRecord::new(
                    format!("{}{}\n", gap(max_len, &location), task.text),
                    Style::Plain,
                ));
            }

            records.push(DisplayRecord::new("\n", Style::Plain));
        }

        records.push(DisplayRecord::new("\n", Style::Plain));
    }

    records
}

/// Longest `path:line` string across the whole snapshot
fn longest_location(snapshot: &TaskIndex) -> usize {
    snapshot
        .iter()
        .flat_map(|(_, files)| files.values())
        .flat_map(|entry| entry.tasks())
        .map(|task| format!("{}:{}", task.path, task.line).len())
        .max()
        .unwrap_or(0)
}

/// Spacing between the location column and the task text: every row pads to
/// the global maximum plus four
fn gap(max_len: usize, location: &str) -> String {
    " ".repeat(max_len - location.len() + 4)
}

/// Producer half of the handoff
#[derive(Debug)]
pub struct RenderQueue {
    tx: mpsc::Sender<Publication>,
}

impl RenderQueue {
    /// Fire-and-forget publish; never blocks the reconciler, even with the
    /// consumer gone
    pub fn publish(&self, publication: Publication) {
        let _ = self.tx.send(publication);
    }
}

/// Consumer half of the handoff
pub struct RenderReceiver {
    rx: mpsc::Receiver<Publication>,
}

impl RenderReceiver {
    /// Drains everything currently queued and keeps only the newest
    /// publication. Replace semantics: a consumer that polls slowly never
    /// sees stale intermediate renders.
    pub fn latest(&self) -> Option<Publication> {
        self.rx.try_iter().last()
    }
}

/// Creates the connected producer/consumer pair
pub fn render_channel() -> (RenderQueue, RenderReceiver) {
    let (tx, rx) = mpsc::channel();
    (RenderQueue { tx }, RenderReceiver { rx })
}
