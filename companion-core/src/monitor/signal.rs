//! Notification categories, signal keys and emitted notifications.

use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// Semantic category of a change notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    GitStatus,
    GitHistory,
    WorkingTree,
    Notes,
    Tasks,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::GitStatus,
        Category::GitHistory,
        Category::WorkingTree,
        Category::Notes,
        Category::Tasks,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::GitStatus => "git-status",
            Category::GitHistory => "git-history",
            Category::WorkingTree => "working-tree",
            Category::Notes => "notes",
            Category::Tasks => "tasks",
        }
    }

    /// Name of the notification channel subscribers connect to
    pub fn channel_name(&self) -> &'static str {
        match self {
            Category::GitStatus => "git-status-changed",
            Category::GitHistory => "git-history-changed",
            Category::WorkingTree => "working-tree-changed",
            Category::Notes => "notes-changed",
            Category::Tasks => "tasks-changed",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Key of a pending signal: one per category, or one per path for the working tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SignalKey {
    GitStatus,
    GitHistory,
    WorkingTree(PathBuf),
    Notes,
    Tasks,
}

impl SignalKey {
    pub fn category(&self) -> Category {
        match self {
            SignalKey::GitStatus => Category::GitStatus,
            SignalKey::GitHistory => Category::GitHistory,
            SignalKey::WorkingTree(_) => Category::WorkingTree,
            SignalKey::Notes => Category::Notes,
            SignalKey::Tasks => Category::Tasks,
        }
    }

    /// The notification emitted when this key's window expires.
    pub fn into_notification(self) -> Notification {
        match self {
            SignalKey::GitStatus => Notification::GitStatusChanged,
            SignalKey::GitHistory => Notification::GitHistoryChanged,
            SignalKey::WorkingTree(path) => Notification::WorkingTreeChanged(path),
            SignalKey::Notes => Notification::NotesChanged,
            SignalKey::Tasks => Notification::TasksChanged,
        }
    }
}

impl fmt::Display for SignalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalKey::WorkingTree(path) => write!(f, "working-tree:{}", path.display()),
            other => f.write_str(other.category().as_str()),
        }
    }
}

/// A coalesced change notification.
///
/// Only working-tree changes carry a payload; every other category just
/// says "something changed, re-query".
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "signal", content = "path", rename_all = "kebab-case")]
pub enum Notification {
    GitStatusChanged,
    GitHistoryChanged,
    WorkingTreeChanged(PathBuf),
    NotesChanged,
    TasksChanged,
}

impl Notification {
    pub fn category(&self) -> Category {
        match self {
            Notification::GitStatusChanged => Category::GitStatus,
            Notification::GitHistoryChanged => Category::GitHistory,
            Notification::WorkingTreeChanged(_) => Category::WorkingTree,
            Notification::NotesChanged => Category::Notes,
            Notification::TasksChanged => Category::Tasks,
        }
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            Notification::WorkingTreeChanged(path) => Some(path),
            _ => None,
        }
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let channel = self.category().channel_name();
        match self.path() {
            Some(path) => write!(f, "{} {}", channel, path.display()),
            None => f.write_str(channel),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_display() {
        assert_eq!(SignalKey::GitStatus.to_string(), "git-status");
        assert_eq!(
            SignalKey::WorkingTree(PathBuf::from("/proj/a.py")).to_string(),
            "working-tree:/proj/a.py"
        );
    }

    #[test]
    fn test_key_to_notification_keeps_category() {
        for key in [
            SignalKey::GitStatus,
            SignalKey::GitHistory,
            SignalKey::WorkingTree(PathBuf::from("/x")),
            SignalKey::Notes,
            SignalKey::Tasks,
        ] {
            let category = key.category();
            assert_eq!(key.into_notification().category(), category);
        }
    }

    #[test]
    fn test_notification_display() {
        assert_eq!(Notification::NotesChanged.to_string(), "notes-changed");
        assert_eq!(
            Notification::WorkingTreeChanged(PathBuf::from("/p/b.py")).to_string(),
            "working-tree-changed /p/b.py"
        );
    }
}
