//! The in-memory task index
//!
//! Three typed levels: directory root → relative file path → pattern name →
//! ordered task list. Built empty at startup, filled by the initial full
//! scan, then patched one file at a time for the rest of the process. Never
//! persisted.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Serialize;

/// One matched annotation occurrence
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Task {
    /// 1-based line number
    pub line: usize,

    /// Trimmed, fence-stripped task text
    pub text: String,

    /// Path relative to the owning directory root
    pub path: String,
}

/// Tasks of one file, grouped by pattern name
///
/// Task order within a pattern is discovery order: top to bottom, left to
/// right within a line. An entry with no tasks never belongs in the index.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FileEntry {
    by_pattern: HashMap<String, Vec<Task>>,
}

impl FileEntry {
    pub fn push(&mut self, pattern: &str, task: Task) {
        self.by_pattern
            .entry(pattern.to_string())
            .or_default()
            .push(task);
    }

    pub fn is_empty(&self) -> bool {
        self.by_pattern.is_empty()
    }

    /// Tasks recorded for one pattern, in discovery order
    pub fn tasks_for(&self, pattern: &str) -> &[Task] {
        self.by_pattern
            .get(pattern)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Every task in the entry, pattern grouping ignored
    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.by_pattern.values().flatten()
    }
}

/// The mutable store: directory root → relative path → [`FileEntry`]
///
/// A directory key exists only while it has at least one file with at least
/// one task, and a file key only while that file has tasks. Exactly one
/// writer mutates the index after startup; everyone else reads clones taken
/// at publish points.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct TaskIndex {
    directories: HashMap<PathBuf, HashMap<String, FileEntry>>,
}

impl TaskIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces one directory's whole slice of the index
    ///
    /// An empty map removes the directory key: a root is only present while
    /// it has tasks.
    pub fn replace_directory(&mut self, root: &Path, files: HashMap<String, FileEntry>) {
        if files.is_empty() {
            self.directories.remove(root);
        } else {
            self.directories.insert(root.to_path_buf(), files);
        }
    }

    /// Patches a single file without touching any other
    ///
    /// `None` or an empty entry removes the file key, and the directory key
    /// with it once the last file is gone.
    pub fn apply_file_update(&mut self, root: &Path, relative: &str, entry: Option<FileEntry>) {
        match entry {
            Some(entry) if !entry.is_empty() => {
                self.directories
                    .entry(root.to_path_buf())
                    .or_default()
                    .insert(relative.to_string(), entry);
            }
            _ => {
                if let Some(files) = self.directories.get_mut(root) {
                    files.remove(relative);
                    if files.is_empty() {
                        self.directories.remove(root);
                    }
                }
            }
        }
    }

    /// Point-in-time copy for rendering. An update is visible in a snapshot
    /// fully or not at all.
    pub fn snapshot(&self) -> TaskIndex {
        self.clone()
    }

    /// Files of one directory, if it currently has any tasks
    pub fn files(&self, root: &Path) -> Option<&HashMap<String, FileEntry>> {
        self.directories.get(root)
    }

    /// All (root, files) pairs, in no particular order
    pub fn iter(&self) -> impl Iterator<Item = (&PathBuf, &HashMap<String, FileEntry>)> {
        self.directories.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.directories.is_empty()
    }

    /// Total task count across the whole index
    pub fn task_count(&self) -> usize {
        self.directories
            .values()
            .flat_map(|files| files.values())
            .map(|entry| entry.tasks().count())
            .sum()
    }

    /// Resolves a rendered relative path back to an absolute one: the first
    /// directory key (sorted, for determinism) whose map contains it
    pub fn resolve(&self, relative: &str) -> Option<PathBuf> {
        let mut roots: Vec<_> = self.directories.keys().collect();
        roots.sort();

        roots
            .into_iter()
            .find(|root| self.directories[*root].contains_key(relative))
            .map(|root| root.join(relative))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(line: usize, text: &str, path: &str) -> Task {
        Task {
            line,
            text: text.to_string(),
            path: path.to_string(),
        }
    }

    fn entry_with(pattern: &str, tasks: &[Task]) -> FileEntry {
        let mut entry = FileEntry::default();
        for t in tasks {
            entry.push(pattern, t.clone());
        }
        entry
    }

    #[test]
    fn replace_directory_with_empty_map_removes_key() {
        let mut index = TaskIndex::new();
        let root = Path::new("/p");

        let mut files = HashMap::new();
        files.insert(
            "a.py".to_string(),
            entry_with("TODO", &[task(1, "x", "a.py")]),
        );
        index.replace_directory(root, files);
        assert!(index.files(root).is_some());

        index.replace_directory(root, HashMap::new());
        assert!(index.files(root).is_none());
        assert!(index.is_empty());
    }

    #[test]
    fn apply_file_update_inserts_and_replaces() {
        let mut index = TaskIndex::new();
        let root = Path::new("/p");

        index.apply_file_update(root, "a.py", Some(entry_with("TODO", &[task(1, "one", "a.py")])));
        assert_eq!(index.files(root).unwrap()["a.py"].tasks_for("TODO")[0].text, "one");

        index.apply_file_update(root, "a.py", Some(entry_with("TODO", &[task(2, "two", "a.py")])));
        let tasks = index.files(root).unwrap()["a.py"].tasks_for("TODO");
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].text, "two");
    }

    #[test]
    fn empty_update_removes_file_and_directory_keys() {
        let mut index = TaskIndex::new();
        let root = Path::new("/p");

        index.apply_file_update(root, "a.py", Some(entry_with("TODO", &[task(1, "x", "a.py")])));
        index.apply_file_update(root, "a.py", Some(FileEntry::default()));

        assert!(index.files(root).is_none());
        assert!(index.is_empty());
    }

    #[test]
    fn absent_update_behaves_like_empty() {
        let mut index = TaskIndex::new();
        let root = Path::new("/p");

        index.apply_file_update(root, "a.py", Some(entry_with("TODO", &[task(1, "x", "a.py")])));
        index.apply_file_update(root, "a.py", None);

        assert!(index.is_empty());
    }

    #[test]
    fn removing_one_file_keeps_the_rest() {
        let mut index = TaskIndex::new();
        let root = Path::new("/p");

        index.apply_file_update(root, "a.py", Some(entry_with("TODO", &[task(1, "a", "a.py")])));
        index.apply_file_update(root, "b.py", Some(entry_with("TODO", &[task(2, "b", "b.py")])));

        index.apply_file_update(root, "a.py", None);

        let files = index.files(root).unwrap();
        assert!(!files.contains_key("a.py"));
        assert!(files.contains_key("b.py"));
    }

    #[test]
    fn snapshot_is_independent_of_later_updates() {
        let mut index = TaskIndex::new();
        let root = Path::new("/p");

        index.apply_file_update(root, "a.py", Some(entry_with("TODO", &[task(1, "x", "a.py")])));
        let snapshot = index.snapshot();

        index.apply_file_update(root, "a.py", None);

        assert!(index.is_empty());
        assert!(!snapshot.is_empty());
        assert_eq!(snapshot.task_count(), 1);
    }

    #[test]
    fn resolve_joins_root_and_relative_path() {
        let mut index = TaskIndex::new();

        index.apply_file_update(
            Path::new("/p"),
            "src/a.py",
            Some(entry_with("TODO", &[task(1, "x", "src/a.py")])),
        );

        assert_eq!(index.resolve("src/a.py"), Some(PathBuf::from("/p/src/a.py")));
        assert_eq!(index.resolve("missing.py"), None);
    }

    #[test]
    fn resolve_prefers_the_first_sorted_root() {
        let mut index = TaskIndex::new();
        let entry = entry_with("TODO", &[task(1, "x", "a.py")]);

        index.apply_file_update(Path::new("/b"), "a.py", Some(entry.clone()));
        index.apply_file_update(Path::new("/a"), "a.py", Some(entry));

        assert_eq!(index.resolve("a.py"), Some(PathBuf::from("/a/a.py")));
    }

    #[test]
    fn serializes_as_nested_maps() {
        let mut index = TaskIndex::new();
        index.apply_file_update(
            Path::new("/p"),
            "a.py",
            Some(entry_with("TODO", &[task(3, "fix X", "a.py")])),
        );

        let json = serde_json::to_value(&index).unwrap();
        assert_eq!(json["/p"]["a.py"]["TODO"][0]["line"], 3);
        assert_eq!(json["/p"]["a.py"]["TODO"][0]["text"], "fix X");
    }
}
