//! Named annotation patterns and comment-fence stripping

use std::collections::HashMap;

use regex::{Regex, RegexBuilder};

use crate::config::{ConfigError, PatternConfig};

/// One compiled annotation rule
#[derive(Debug)]
struct Pattern {
    name: String,
    regex: Regex,
}

/// The full compiled pattern set, shared read-only by every scan
///
/// Extraction applies patterns in configured order; that order also drives
/// the grouping of the rendered output.
#[derive(Debug)]
pub struct PatternSet {
    patterns: Vec<Pattern>,
    fences: HashMap<String, String>,
}

impl PatternSet {
    /// Compiles the configured patterns, case-insensitively
    ///
    /// Every regex must have a capture group: group 1 is the task text.
    pub fn compile(
        patterns: &[PatternConfig],
        fences: &HashMap<String, String>,
    ) -> Result<Self, ConfigError> {
        let mut compiled = Vec::with_capacity(patterns.len());

        for cfg in patterns {
            let regex = RegexBuilder::new(&cfg.regex)
                .case_insensitive(true)
                .build()
                .map_err(|e| ConfigError::InvalidRegex {
                    name: cfg.name.clone(),
                    message: e.to_string(),
                })?;

            if regex.captures_len() < 2 {
                return Err(ConfigError::MissingCaptureGroup {
                    name: cfg.name.clone(),
                });
            }

            compiled.push(Pattern {
                name: cfg.name.clone(),
                regex,
            });
        }

        Ok(Self {
            patterns: compiled,
            fences: fences.clone(),
        })
    }

    /// Pattern names in configured order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.patterns.iter().map(|p| p.name.as_str())
    }

    /// Applies every pattern to one line
    ///
    /// Results come out in pattern order, and within a pattern in
    /// left-to-right non-overlapping match order.
    pub fn extract(&self, line: &str) -> Vec<(&str, String)> {
        let mut out = Vec::new();

        for pattern in &self.patterns {
            for caps in pattern.regex.captures_iter(line) {
                if let Some(text) = caps.get(1) {
                    out.push((pattern.name.as_str(), text.as_str().to_string()));
                }
            }
        }

        out
    }

    /// Strips the closing comment fence configured for a file extension
    ///
    /// With a fence rule the fence is removed as an exact trailing suffix
    /// and the result trimmed. Without one the text comes back exactly as
    /// captured.
    pub fn strip_fence(&self, extension: Option<&str>, text: &str) -> String {
        match extension.and_then(|ext| self.fences.get(ext)) {
            Some(fence) => text
                .strip_suffix(fence.as_str())
                .unwrap_or(text)
                .trim()
                .to_string(),
            None => text.to_string(),
        }
    }
}
