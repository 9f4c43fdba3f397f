//! Single-file scanning

use std::fs;
use std::io;
use std::path::Path;

use crate::index::{FileEntry, Task};

use super::pattern::PatternSet;

/// Result of scanning one file
#[derive(Debug)]
pub enum ScanOutcome {
    /// Tasks found, possibly none. Safe to apply as a wholesale replacement
    /// of the file's index entry.
    Tasks(FileEntry),

    /// The content is not text. The caller must not treat this as "zero
    /// tasks": any prior entry for the file stays as it was.
    Undecodable,
}

/// Scans one file for annotation matches, 1-indexed by line
///
/// A file that no longer exists yields an empty entry: the scan may run
/// after the file was deleted, and an empty result is exactly what removes
/// it from the index. Other read failures propagate for the caller to log
/// and absorb.
pub fn scan_file(path: &Path, relative: &str, patterns: &PatternSet) -> io::Result<ScanOutcome> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Ok(ScanOutcome::Tasks(FileEntry::default()))
        }
        Err(e) => return Err(e),
    };

    let text = match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(_) => return Ok(ScanOutcome::Undecodable),
    };

    let extension = extension_of(relative);
    let mut entry = FileEntry::default();

    for (i, line) in text.lines().enumerate() {
        for (name, captured) in patterns.extract(line) {
            let stripped = patterns.strip_fence(extension, &captured);
            entry.push(
                name,
                Task {
                    line: i + 1,
                    text: stripped.trim().to_string(),
                    path: relative.to_string(),
                },
            );
        }
    }

    Ok(ScanOutcome::Tasks(entry))
}

/// Everything after the last `.` in the path. No dot, no extension, and so
/// no fence rule can apply.
fn extension_of(path: &str) -> Option<&str> {
    path.rsplit_once('.').map(|(_, ext)| ext)
}
