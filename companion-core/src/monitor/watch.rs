//! Platform file watches.
//!
//! Each [`WatchHandle`] owns one `notify` watcher whose callback translates
//! events into [`RawChange`]s and sends them, stamped with the time they
//! were observed, over a channel. The callback runs on notify's thread and
//! never touches coalescer state. Dropping the handle cancels the watch.

use super::classify::{changes_from_event, RawChange, WatchSource};
use crate::error::{Error, Result};
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use std::time::Instant;

/// A raw change and when it was observed.
#[derive(Debug, Clone)]
pub struct TimedChange {
    pub at: Instant,
    pub change: RawChange,
}

/// A filesystem location to observe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchTarget {
    /// A single file, observed through its parent directory so atomic
    /// rename-over writes keep being seen.
    File(PathBuf),
    /// A directory's direct children
    Directory(PathBuf),
}

impl WatchTarget {
    pub fn path(&self) -> &Path {
        match self {
            WatchTarget::File(path) | WatchTarget::Directory(path) => path,
        }
    }

    pub fn exists(&self) -> bool {
        match self {
            WatchTarget::File(path) => path.is_file(),
            WatchTarget::Directory(path) => path.is_dir(),
        }
    }
}

/// An active watch. Dropping it cancels the watch.
pub struct WatchHandle {
    _watcher: RecommendedWatcher,
    target: WatchTarget,
    source: WatchSource,
}

impl WatchHandle {
    pub fn target(&self) -> &WatchTarget {
        &self.target
    }

    pub fn source(&self) -> WatchSource {
        self.source
    }
}

impl std::fmt::Debug for WatchHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchHandle")
            .field("target", &self.target)
            .field("source", &self.source)
            .finish()
    }
}

/// Start watching `target`, delivering changes for `source` to `tx`.
///
/// Only working-tree watches report moves; every other source sees them as
/// creations and deletions.
pub fn watch(
    target: WatchTarget,
    source: WatchSource,
    tx: Sender<TimedChange>,
) -> Result<WatchHandle> {
    let (watch_path, file_name) = match &target {
        WatchTarget::Directory(dir) => (dir.clone(), None),
        WatchTarget::File(file) => {
            let invalid = |reason: &str| {
                Error::Watch(notify::Error::generic(reason).add_path(file.clone()))
            };
            let parent = file
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .ok_or_else(|| invalid("file target has no parent directory"))?;
            let name = file
                .file_name()
                .map(OsString::from)
                .ok_or_else(|| invalid("file target has no file name"))?;
            (parent.to_path_buf(), Some(name))
        }
    };
    let report_moves = source == WatchSource::WorkingTree;

    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<notify::Event>| {
            let event = match res {
                Ok(event) => event,
                Err(e) => {
                    tracing::debug!(error = %e, ?source, "File watcher error");
                    return;
                }
            };
            let at = Instant::now();

            for (kind, path) in changes_from_event(&event) {
                if let Some(name) = &file_name {
                    let matches = path
                        .as_deref()
                        .and_then(Path::file_name)
                        .is_some_and(|n| n == name.as_os_str());
                    if !matches {
                        continue;
                    }
                }

                let kind = if report_moves {
                    kind
                } else {
                    kind.without_moves()
                };

                // The receiver is gone once the monitor shuts down
                let _ = tx.send(TimedChange {
                    at,
                    change: RawChange::new(source, kind, path),
                });
            }
        },
        notify::Config::default(),
    )?;

    watcher.watch(&watch_path, RecursiveMode::NonRecursive)?;

    tracing::debug!(
        path = %target.path().display(),
        ?source,
        "Watch installed"
    );

    Ok(WatchHandle {
        _watcher: watcher,
        target,
        source,
    })
}
