//! Path exclusion rules for one watched directory

/// Pure exclusion predicate over one directory's ignore rules
///
/// Both checks work on paths relative to the directory root, with no
/// leading separator.
#[derive(Debug, Clone, Default)]
pub struct IgnoreFilter {
    ignore_paths: Vec<String>,
    ignore_types: Vec<String>,
}

impl IgnoreFilter {
    pub fn new(ignore_paths: Vec<String>, ignore_types: Vec<String>) -> Self {
        Self {
            ignore_paths,
            ignore_types,
        }
    }

    /// Literal string-prefix match, not segment-aware: the prefix "build"
    /// also covers "build2".
    pub fn should_ignore_dir(&self, relative_dir: &str) -> bool {
        self.ignore_paths
            .iter()
            .any(|prefix| relative_dir.starts_with(prefix.as_str()))
    }

    /// Suffix match against the ignore-type list
    pub fn should_ignore_file(&self, relative_path: &str) -> bool {
        self.ignore_types
            .iter()
            .any(|suffix| relative_path.ends_with(suffix.as_str()))
    }
}
