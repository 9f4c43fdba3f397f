//! Configuration handling for tagscan
//!
//! Configuration lives in `tagscan.toml`, found in the current directory or
//! any parent, or in the user config directory (`~/.config/tagscan/`). The
//! loaded configuration is an immutable snapshot for the process lifetime.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Name of the config file looked up in the working directory and above.
pub const CONFIG_FILE_NAME: &str = "tagscan.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse configuration: {0}")]
    Parse(String),

    #[error("Pattern '{name}' is not a valid regex: {message}")]
    InvalidRegex { name: String, message: String },

    #[error("Pattern '{name}' needs a capture group for the task text")]
    MissingCaptureGroup { name: String },

    #[error("Watched directory does not exist: {0}")]
    MissingDirectory(PathBuf),
}

/// General settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// How often the display consumer polls the render queue, in milliseconds
    pub poll_interval_ms: u64,

    /// Editor command for opening a task's file from the viewer
    pub editor: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            poll_interval_ms: 500,
            editor: None,
        }
    }
}

/// One watched directory tree
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryConfig {
    /// Informational label
    pub name: String,

    /// Absolute root of the tree
    pub path: PathBuf,

    /// Relative-path prefixes to prune (literal string prefixes)
    #[serde(default)]
    pub ignore_paths: Vec<String>,

    /// Path suffixes to skip (e.g. ".log")
    #[serde(default)]
    pub ignore_types: Vec<String>,
}

/// One named annotation pattern
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternConfig {
    /// Pattern label shown in the output (e.g. "TODO")
    pub name: String,

    /// Regex with one capture group yielding the task text
    pub regex: String,
}

/// Full configuration
///
/// Directories and patterns are arrays of tables so their configured order
/// is preserved: event routing and rendering both follow it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub settings: Settings,

    pub directories: Vec<DirectoryConfig>,

    pub patterns: Vec<PatternConfig>,

    /// File extension (without the dot) to closing comment fence, stripped
    /// from captured text for that file type
    pub fences: HashMap<String, String>,
}

impl Config {
    /// Loads configuration from an explicit path, or from the default
    /// lookup locations
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => Self::find().ok_or_else(|| {
                anyhow::anyhow!("No {} found. Run 'tagscan init' first.", CONFIG_FILE_NAME)
            })?,
        };
        Self::load_from(&path)
    }

    /// Loads and parses a specific config file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;

        toml::from_str(&content)
            .map_err(|e| ConfigError::Parse(e.to_string()))
            .with_context(|| format!("Failed to parse config: {}", path.display()))
    }

    /// Finds the nearest config file: current directory upward, then the
    /// user config directory
    pub fn find() -> Option<PathBuf> {
        let cwd = std::env::current_dir().ok()?;
        if let Some(found) = Self::find_above(&cwd) {
            return Some(found);
        }

        let global = Self::global_config_dir()?.join(CONFIG_FILE_NAME);
        global.is_file().then_some(global)
    }

    /// Walks from `start` toward the filesystem root looking for a config
    pub fn find_above(start: &Path) -> Option<PathBuf> {
        let mut current = start.to_path_buf();

        loop {
            let candidate = current.join(CONFIG_FILE_NAME);
            if candidate.is_file() {
                return Some(candidate);
            }

            if !current.pop() {
                return None;
            }
        }
    }

    /// Returns the user-level config directory
    pub fn global_config_dir() -> Option<PathBuf> {
        ProjectDirs::from("dev", "tagscan", "tagscan").map(|dirs| dirs.config_dir().to_path_buf())
    }
}

/// Template written by `tagscan init`
pub const STARTER_CONFIG: &str = r#"# tagscan configuration.
#
# Add one [[directories]] block per tree to scan.

[settings]
# How often the display refreshes while watching, in milliseconds.
poll_interval_ms = 500
# Editor command used when opening a task from the viewer.
# Falls back to $EDITOR, then vi.
# editor = "subl"

# [[directories]]
# name = "projects"
# path = "/home/me/projects"
# ignore_paths = ["target", ".git"]
# ignore_types = [".log", ".lock"]

[[patterns]]
name = "TODO"
regex = "TODO:(.*)"

[[patterns]]
name = "FIX"
regex = "FIX:(.*)"

[[patterns]]
name = "NOTE"
regex = "NOTE:(.*)"

[fences]
c = "*/"
h = "*/"
css = "*/"
html = "-->"
"#;
