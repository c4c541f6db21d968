//! Watches the open file for changes made outside the previewer

use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver};

use anyhow::{Context, Result};
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};

/// Watcher for a single file
pub struct FileWatcher {
    path: PathBuf,
    // Dropping the watcher stops the notify thread
    _watcher: RecommendedWatcher,
    events: Receiver<()>,
}

impl FileWatcher {
    /// Start watching `path`; `on_change` runs on the watcher thread
    ///
    /// The parent directory is watched rather than the file itself, so
    /// saves that write a temporary file and rename it over the original
    /// keep being reported.
    pub fn new<F>(path: &Path, on_change: F) -> Result<Self>
    where
        F: Fn() + Send + 'static,
    {
        let file_name = path
            .file_name()
            .with_context(|| format!("Not a file: {}", path.display()))?
            .to_os_string();
        let dir = path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .unwrap_or(Path::new("."));

        let (tx, rx) = channel();

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
            Ok(event) if event.kind.is_modify() || event.kind.is_create() => {
                let touches_file = event
                    .paths
                    .iter()
                    .any(|changed| changed.file_name() == Some(file_name.as_os_str()));
                if touches_file && tx.send(()).is_ok() {
                    on_change();
                }
            }
            Ok(_) => {}
            Err(e) => tracing::warn!("File watcher error: {}", e),
        })
        .context("Failed to create file watcher")?;

        watcher
            .watch(dir, RecursiveMode::NonRecursive)
            .with_context(|| format!("Failed to watch {}", path.display()))?;

        tracing::info!("Watching {}", path.display());

        Ok(Self {
            path: path.to_path_buf(),
            _watcher: watcher,
            events: rx,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the file changed since the last call
    pub fn poll_changed(&self) -> bool {
        let mut changed = false;
        while self.events.try_recv().is_ok() {
            changed = true;
        }
        changed
    }
}
