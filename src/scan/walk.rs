//! Full directory-tree scanning

use std::collections::HashMap;
use std::path::Path;

use walkdir::WalkDir;

use crate::index::FileEntry;

use super::file::{scan_file, ScanOutcome};
use super::ignore::IgnoreFilter;
use super::pattern::PatternSet;

/// Recursively scans one tree, returning relative path → tasks for every
/// file with at least one match
///
/// Ignored subtrees are pruned without descending; ignored files are
/// skipped; unreadable or undecodable files are logged and left out.
/// Traversal order is not part of the contract: callers re-sort.
pub fn full_scan(
    root: &Path,
    filter: &IgnoreFilter,
    patterns: &PatternSet,
) -> HashMap<String, FileEntry> {
    let mut files = HashMap::new();

    let walker = WalkDir::new(root).into_iter().filter_entry(|entry| {
        if !entry.file_type().is_dir() {
            return true;
        }
        match entry.path().strip_prefix(root) {
            // The root itself has an empty relative path; always descend.
            Ok(rel) if rel.as_os_str().is_empty() => true,
            Ok(rel) => !filter.should_ignore_dir(&rel.to_string_lossy()),
            Err(_) => true,
        }
    });

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(error = %e, "walk error; skipping");
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        let relative = match entry.path().strip_prefix(root) {
            Ok(rel) => rel.to_string_lossy().into_owned(),
            Err(_) => continue,
        };

        if filter.should_ignore_file(&relative) {
            continue;
        }

        match scan_file(entry.path(), &relative, patterns) {
            Ok(ScanOutcome::Tasks(tasks)) if !tasks.is_empty() => {
                files.insert(relative, tasks);
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(path = %entry.path().display(), error = %e, "skipping unreadable file");
            }
        }
    }

    files
}
