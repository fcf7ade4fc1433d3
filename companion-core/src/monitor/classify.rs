//! Raw change filtering.
//!
//! Maps a raw change from one watched source to the signal keys it should
//! schedule. Most of the coalescer's policy lives here: which change kinds
//! count for which source, the log fan-out, the `.git` exclusion for the
//! working tree, and the task file name filter.

use super::signal::SignalKey;
use crate::config::MonitorConfig;
use notify::event::{EventKind, ModifyKind, RenameMode};
use std::path::{Component, Path, PathBuf};

/// What a watch is observing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WatchSource {
    /// `.git/index`
    GitIndex,
    /// `.git/refs/heads/`
    GitRefs,
    /// `.git/HEAD`
    GitHead,
    /// `.git/logs/HEAD`
    GitLog,
    Notes,
    Tasks,
    WorkingTree,
}

/// Kind of a raw filesystem change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    Created,
    Changed,
    Deleted,
    MovedIn,
    MovedOut,
    Renamed,
    AttributeChanged,
}

impl ChangeKind {
    /// Fold moves into create/delete for watches that do not track moves.
    pub fn without_moves(self) -> ChangeKind {
        match self {
            ChangeKind::MovedIn | ChangeKind::Renamed => ChangeKind::Created,
            ChangeKind::MovedOut => ChangeKind::Deleted,
            other => other,
        }
    }

    fn is_content_change(self) -> bool {
        matches!(self, ChangeKind::Changed | ChangeKind::Created)
    }

    fn is_content_or_removal(self) -> bool {
        matches!(
            self,
            ChangeKind::Changed | ChangeKind::Created | ChangeKind::Deleted
        )
    }
}

/// One raw change as delivered by a watch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawChange {
    pub source: WatchSource,
    pub kind: ChangeKind,
    pub path: Option<PathBuf>,
}

impl RawChange {
    pub fn new(source: WatchSource, kind: ChangeKind, path: Option<PathBuf>) -> Self {
        Self { source, kind, path }
    }
}

/// Signal keys a raw change schedules. Empty when the change is filtered out.
pub fn classify(change: &RawChange, config: &MonitorConfig) -> Vec<SignalKey> {
    let kind = change.kind;
    match change.source {
        // The index briefly disappears during atomic rewrites
        WatchSource::GitIndex if kind.is_content_change() => vec![SignalKey::GitStatus],
        WatchSource::GitRefs | WatchSource::GitHead if kind.is_content_or_removal() => {
            vec![SignalKey::GitHistory]
        }
        // A commit touches both what is staged and what is in history
        WatchSource::GitLog if kind.is_content_or_removal() => {
            vec![SignalKey::GitStatus, SignalKey::GitHistory]
        }
        WatchSource::Notes if kind.is_content_or_removal() => vec![SignalKey::Notes],
        WatchSource::Tasks if kind.is_content_or_removal() => {
            let is_task_file = change.path.as_deref().map_or(true, |path| {
                path.file_name()
                    .is_some_and(|name| name == config.tasks_file.as_str())
            });
            if is_task_file {
                vec![SignalKey::Tasks]
            } else {
                Vec::new()
            }
        }
        WatchSource::WorkingTree if kind != ChangeKind::AttributeChanged => {
            match change.path.as_deref() {
                Some(path) if !has_git_component(path) => {
                    vec![SignalKey::WorkingTree(path.to_path_buf())]
                }
                _ => Vec::new(),
            }
        }
        _ => Vec::new(),
    }
}

/// True if any component of `path` is the `.git` directory.
pub fn has_git_component(path: &Path) -> bool {
    path.components()
        .any(|c| matches!(c, Component::Normal(name) if name == ".git"))
}

/// Translate a `notify` event into `(kind, path)` pairs.
///
/// Access events and backend-specific `Other` events are ignored. A rename
/// reported with both ends becomes a move out of the old path and a move
/// into the new one.
pub fn changes_from_event(event: &notify::Event) -> Vec<(ChangeKind, Option<PathBuf>)> {
    let kind = match event.kind {
        EventKind::Create(_) => ChangeKind::Created,
        EventKind::Remove(_) => ChangeKind::Deleted,
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => ChangeKind::MovedOut,
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => ChangeKind::MovedIn,
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) if event.paths.len() == 2 => {
            return vec![
                (ChangeKind::MovedOut, Some(event.paths[0].clone())),
                (ChangeKind::MovedIn, Some(event.paths[1].clone())),
            ];
        }
        EventKind::Modify(ModifyKind::Name(_)) => ChangeKind::Renamed,
        EventKind::Modify(ModifyKind::Metadata(_)) => ChangeKind::AttributeChanged,
        EventKind::Modify(_) | EventKind::Any => ChangeKind::Changed,
        EventKind::Access(_) | EventKind::Other => return Vec::new(),
    };

    if event.paths.is_empty() {
        return vec![(kind, None)];
    }
    event
        .paths
        .iter()
        .map(|path| (kind, Some(path.clone())))
        .collect()
}
