//! The update reconciler
//!
//! Owns the task index for the process lifetime: a full scan of every
//! configured directory before any event is accepted, then a strictly
//! sequential loop that re-scans exactly one file per change event and
//! patches the index. Nothing else ever writes to the index, so it needs no
//! locking; readers get snapshots through the render queue.

use std::path::{Path, PathBuf};
use std::sync::mpsc;

use crate::config::{Config, ConfigError, DirectoryConfig};
use crate::index::TaskIndex;
use crate::render::{render, Publication, RenderQueue};
use crate::scan::{full_scan, scan_file, IgnoreFilter, PatternSet, ScanOutcome};
use crate::watch::ChangeEvent;

/// Runtime form of one configured directory
#[derive(Debug, Clone)]
pub struct Directory {
    /// Informational label from the config
    pub name: String,

    /// Absolute root of the tree
    pub root: PathBuf,

    /// This directory's exclusion rules
    pub filter: IgnoreFilter,
}

impl Directory {
    pub fn from_config(cfg: &DirectoryConfig) -> Self {
        Self {
            name: cfg.name.clone(),
            root: cfg.path.clone(),
            filter: IgnoreFilter::new(cfg.ignore_paths.clone(), cfg.ignore_types.clone()),
        }
    }

    /// Relative path of `path` under this root, by literal string-prefix
    /// match. The same match routes change events to their owner.
    pub fn relative_of(&self, path: &Path) -> Option<String> {
        let root = self.root.to_string_lossy();
        let path = path.to_string_lossy();

        path.strip_prefix(root.as_ref())
            .map(|rest| rest.trim_start_matches('/').to_string())
    }
}

/// The scan-and-index engine
#[derive(Debug)]
pub struct Engine {
    directories: Vec<Directory>,
    patterns: PatternSet,
    index: TaskIndex,
    queue: RenderQueue,
}

impl Engine {
    /// Builds the engine, compiling patterns and checking that every
    /// configured root exists. Any failure here is fatal to startup.
    pub fn from_config(config: &Config, queue: RenderQueue) -> Result<Self, ConfigError> {
        let patterns = PatternSet::compile(&config.patterns, &config.fences)?;

        let mut directories = Vec::with_capacity(config.directories.len());
        for cfg in &config.directories {
            if !cfg.path.is_dir() {
                return Err(ConfigError::MissingDirectory(cfg.path.clone()));
            }
            directories.push(Directory::from_config(cfg));
        }

        Ok(Self {
            directories,
            patterns,
            index: TaskIndex::new(),
            queue,
        })
    }

    pub fn directories(&self) -> &[Directory] {
        &self.directories
    }

    pub fn index(&self) -> &TaskIndex {
        &self.index
    }

    /// Full scan of every configured directory, then the first publication.
    /// Runs to completion before any change event is accepted, so there is
    /// no concurrent-write window at startup.
    pub fn initial_scan(&mut self) {
        for dir in &self.directories {
            let files = full_scan(&dir.root, &dir.filter, &self.patterns);
            self.index.replace_directory(&dir.root, files);
        }

        tracing::debug!(tasks = self.index.task_count(), "initial scan complete");
        self.publish();
    }

    /// Routes and applies one change event
    ///
    /// Events with no owning directory, directory-level events, and ignored
    /// paths are discarded without a scan. Directory churn surfaces through
    /// the events of the files inside, which avoids tree-wide rescans.
    pub fn handle_event(&mut self, event: &ChangeEvent) {
        let Some((owner, relative)) = self.owner_of(&event.path) else {
            return;
        };

        if event.is_dir {
            return;
        }

        let dir = &self.directories[owner];
        if dir.filter.should_ignore_dir(&relative) || dir.filter.should_ignore_file(&relative) {
            return;
        }
        let root = dir.root.clone();

        match scan_file(&event.path, &relative, &self.patterns) {
            Ok(ScanOutcome::Tasks(entry)) => {
                self.index.apply_file_update(&root, &relative, Some(entry));
            }
            Ok(ScanOutcome::Undecodable) => {
                // Not "zero tasks": the previous entry, if any, stays.
                tracing::debug!(path = %event.path.display(), "content is not text; keeping previous entries");
            }
            Err(e) => {
                tracing::warn!(path = %event.path.display(), error = %e, "scan failed; keeping previous entries");
            }
        }

        self.publish();
    }

    /// Sequential event loop: one event is fully applied and published
    /// before the next is read. Ends when the notifier side hangs up.
    pub fn run(mut self, events: mpsc::Receiver<ChangeEvent>) {
        while let Ok(event) = events.recv() {
            self.handle_event(&event);
        }
    }

    /// First configured directory whose root is a literal prefix of `path`
    fn owner_of(&self, path: &Path) -> Option<(usize, String)> {
        self.directories
            .iter()
            .enumerate()
            .find_map(|(i, dir)| dir.relative_of(path).map(|rel| (i, rel)))
    }

    fn publish(&self) {
        let snapshot = self.index.snapshot();
        let records = render(&snapshot, &self.directories, &self.patterns);
        self.queue.publish(Publication { records, snapshot });
    }
}
