//! Filesystem change notification
//!
//! Thin wrapper over the `notify` watcher: every change surfaces as one
//! [`ChangeEvent`] per affected path on a plain mpsc channel, and the
//! reconciler consumes them strictly one at a time. No debouncing and no
//! coalescing; correctness over per-event latency.

use std::path::PathBuf;
use std::sync::mpsc;

use anyhow::{Context, Result};
use notify::{RecommendedWatcher, RecursiveMode, Watcher};

/// One filesystem change, as delivered to the reconciler
///
/// `is_dir` reflects the path's state at delivery time; a deleted path
/// reads as a file, which is what lets the scan-to-empty removal work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub path: PathBuf,
    pub is_dir: bool,
}

/// Watches the configured roots and forwards per-path events
///
/// Dropping the notifier stops delivery; the reconciler loop then drains
/// out once its channel disconnects.
pub struct Notifier {
    _watcher: RecommendedWatcher,
}

impl Notifier {
    /// Starts recursive watches on every root
    ///
    /// Event delivery is best effort: duplicates and misses are possible
    /// and the receiving side must tolerate both.
    pub fn start(roots: &[PathBuf], tx: mpsc::Sender<ChangeEvent>) -> Result<Self> {
        let mut watcher =
            notify::recommended_watcher(move |res: notify::Result<notify::Event>| match res {
                Ok(event) => {
                    for path in event.paths {
                        let is_dir = path.is_dir();
                        if tx.send(ChangeEvent { path, is_dir }).is_err() {
                            // Reconciler is gone; nothing left to notify.
                            return;
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "watch error");
                }
            })
            .context("Failed to create filesystem watcher")?;

        for root in roots {
            watcher
                .watch(root, RecursiveMode::Recursive)
                .with_context(|| format!("Failed to watch directory: {}", root.display()))?;
        }

        Ok(Self { _watcher: watcher })
    }
}
