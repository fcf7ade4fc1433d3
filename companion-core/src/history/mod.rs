//! Session history for AI coding assistants
//!
//! Reads the append-only session logs an assistant CLI leaves on disk and
//! turns them into [`Session`] listings and full [`Message`] transcripts.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────┐     ┌──────────────────┐     ┌──────────────────┐
//! │    Session files     │ ──► │ HistoryProvider  │ ──► │ Session listing  │
//! │ (~/.claude/projects) │     │  └─ ClaudeHistory│     │ Vec<Message>     │
//! └──────────────────────┘     └──────────────────┘     └──────────────────┘
//!                                       │
//!                                       ▼
//!                          scan_metadata / load_full
//! ```
//!
//! Everything here is synchronous and keeps no state between calls, so
//! callers that must not block can run it on a worker thread and hand the
//! result back.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use companion_core::history::{provider_for, HistoryProvider};
//! use std::path::Path;
//!
//! let provider = provider_for("claude").expect("claude provider is built in");
//! for session in provider.sessions_for_path(Path::new("/home/me/project")) {
//!     let messages = provider.load_session(&session);
//!     println!("{}: {} messages", session, messages.len());
//! }
//! ```

pub mod paths;
mod reconstruct;
mod record;
pub mod timestamp;

pub use paths::{decode_project_path, encode_project_path};
pub use reconstruct::{load_full, scan_metadata, session_id_from_path, Reconstructor};
pub use timestamp::parse_timestamp;

use crate::config::{home_dir, HistoryConfig};
use crate::error::{Error, Result};
use crate::types::{Message, Session};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Trait implemented by every assistant history backend.
///
/// Listing is cheap (metadata scan only); transcripts are loaded on demand.
pub trait HistoryProvider: Send + Sync {
    /// Display name (e.g. "Claude Code")
    fn name(&self) -> &'static str;

    /// Command that launches the assistant CLI
    fn cli_command(&self) -> &'static str;

    /// Root directory for this assistant's data (e.g. ~/.claude)
    fn config_dir(&self) -> PathBuf;

    /// Check if this assistant is installed (config dir exists)
    fn is_available(&self) -> bool {
        self.config_dir().exists()
    }

    /// History directory holding the sessions of one project, if any.
    fn find_project_history_dir(&self, project_path: &Path) -> Option<PathBuf>;

    /// Projects with recorded history, recovered from history directory names.
    fn projects(&self) -> Vec<PathBuf>;

    /// Sessions recorded for a project, most recent first.
    fn sessions_for_path(&self, project_path: &Path) -> Vec<Session>;

    /// Full transcript of a session, in file order.
    fn load_session(&self, session: &Session) -> Vec<Message>;
}

/// Claude Code history under `~/.claude/projects/<encoded-path>/*.jsonl`.
pub struct ClaudeHistory {
    root: PathBuf,
}

impl ClaudeHistory {
    /// Create a provider with the default root path (~/.claude).
    pub fn new() -> Self {
        Self {
            root: home_dir().join(".claude"),
        }
    }

    /// Create a provider with a custom root path.
    pub fn with_root(root: PathBuf) -> Self {
        Self { root }
    }

    /// Create a provider honoring `history.claude_dir`.
    pub fn from_config(config: &HistoryConfig) -> Self {
        match &config.claude_dir {
            Some(dir) => Self::with_root(dir.clone()),
            None => Self::new(),
        }
    }

    fn projects_dir(&self) -> PathBuf {
        self.root.join("projects")
    }

    /// `*.jsonl` files in a history directory, most recently modified first.
    pub fn session_files(&self, history_dir: &Path) -> Vec<PathBuf> {
        if !history_dir.is_dir() {
            return Vec::new();
        }

        let pattern = format!(
            "{}/*.jsonl",
            glob::Pattern::escape(&history_dir.to_string_lossy())
        );

        let entries = match glob::glob(&pattern) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(
                    dir = %history_dir.display(),
                    error = %e,
                    "Invalid session glob pattern"
                );
                return Vec::new();
            }
        };

        let mut files: Vec<(SystemTime, PathBuf)> = entries
            .flatten()
            .map(|path| {
                let modified = std::fs::metadata(&path)
                    .and_then(|m| m.modified())
                    .unwrap_or(SystemTime::UNIX_EPOCH);
                (modified, path)
            })
            .collect();

        files.sort_by(|a, b| b.0.cmp(&a.0));
        files.into_iter().map(|(_, path)| path).collect()
    }
}

impl Default for ClaudeHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl HistoryProvider for ClaudeHistory {
    fn name(&self) -> &'static str {
        "Claude Code"
    }

    fn cli_command(&self) -> &'static str {
        "claude"
    }

    fn config_dir(&self) -> PathBuf {
        self.root.clone()
    }

    fn find_project_history_dir(&self, project_path: &Path) -> Option<PathBuf> {
        let projects_dir = self.projects_dir();
        if !projects_dir.exists() {
            return None;
        }

        let history_dir = projects_dir.join(encode_project_path(project_path));
        history_dir.exists().then_some(history_dir)
    }

    fn projects(&self) -> Vec<PathBuf> {
        let entries = match std::fs::read_dir(self.projects_dir()) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::debug!(error = %e, "No projects directory");
                return Vec::new();
            }
        };

        let mut projects: Vec<PathBuf> = entries
            .flatten()
            .filter(|entry| entry.file_type().is_ok_and(|t| t.is_dir()))
            .map(|entry| decode_project_path(&entry.file_name().to_string_lossy()))
            .collect();
        projects.sort();
        projects
    }

    fn sessions_for_path(&self, project_path: &Path) -> Vec<Session> {
        let Some(history_dir) = self.find_project_history_dir(project_path) else {
            tracing::debug!(
                project = %project_path.display(),
                "No history directory for project"
            );
            return Vec::new();
        };

        let mut sessions: Vec<Session> = self
            .session_files(&history_dir)
            .iter()
            .filter_map(|file| scan_metadata(file))
            .collect();

        // Most recent first; sessions without a timestamp sort last
        sessions.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

        tracing::debug!(
            project = %project_path.display(),
            count = sessions.len(),
            "Listed sessions"
        );
        sessions
    }

    fn load_session(&self, session: &Session) -> Vec<Message> {
        load_full(&session.path)
    }
}

/// Provider ids known to [`provider_for`], with display names.
const PROVIDERS: &[(&str, &str)] = &[("claude", "Claude Code")];

/// Get a provider by id (e.g. "claude").
pub fn provider_for(id: &str) -> Result<Box<dyn HistoryProvider>> {
    match id {
        "claude" => Ok(Box::new(ClaudeHistory::new())),
        _ => Err(Error::UnknownProvider(id.to_string())),
    }
}

/// Get the provider selected in the configuration.
pub fn provider_from_config(config: &HistoryConfig) -> Result<Box<dyn HistoryProvider>> {
    match config.provider.as_str() {
        "claude" => Ok(Box::new(ClaudeHistory::from_config(config))),
        other => Err(Error::UnknownProvider(other.to_string())),
    }
}

/// All registered providers as `(id, display name)`.
pub fn all_providers() -> Vec<(&'static str, &'static str)> {
    PROVIDERS.to_vec()
}

/// Registered providers whose assistant is installed.
pub fn available_providers() -> Vec<(&'static str, &'static str)> {
    PROVIDERS
        .iter()
        .filter(|(id, _)| {
            provider_for(id)
                .map(|p| p.is_available())
                .unwrap_or(false)
        })
        .copied()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_provider_for_claude() {
        let provider = provider_for("claude").unwrap();
        assert_eq!(provider.name(), "Claude Code");
        assert_eq!(provider.cli_command(), "claude");
    }

    #[test]
    fn test_provider_for_unknown() {
        let err = provider_for("gemini").err().unwrap();
        assert!(matches!(err, Error::UnknownProvider(ref id) if id == "gemini"));
    }

    #[test]
    fn test_all_providers_lists_claude() {
        assert!(all_providers().contains(&("claude", "Claude Code")));
    }

    #[test]
    fn test_provider_from_config_uses_override() {
        let config = HistoryConfig {
            provider: "claude".to_string(),
            claude_dir: Some(PathBuf::from("/opt/claude-data")),
        };
        let provider = provider_from_config(&config).unwrap();
        assert_eq!(provider.config_dir(), PathBuf::from("/opt/claude-data"));
        assert!(!provider.is_available());
    }

    #[test]
    fn test_find_project_history_dir() {
        let root = TempDir::new().unwrap();
        let history = ClaudeHistory::with_root(root.path().to_path_buf());
        let project = Path::new("/home/me/proj");

        assert!(history.find_project_history_dir(project).is_none());

        let dir = root.path().join("projects").join("-home-me-proj");
        std::fs::create_dir_all(&dir).unwrap();
        assert_eq!(history.find_project_history_dir(project), Some(dir));
    }

    #[test]
    fn test_projects_decodes_history_dirs() {
        let root = TempDir::new().unwrap();
        let workspace = TempDir::new().unwrap();
        let project = workspace.path().join("my-app");
        std::fs::create_dir_all(&project).unwrap();

        let history = ClaudeHistory::with_root(root.path().to_path_buf());
        assert!(history.projects().is_empty());

        let projects_dir = root.path().join("projects");
        std::fs::create_dir_all(projects_dir.join(encode_project_path(&project))).unwrap();
        std::fs::write(projects_dir.join("stray.jsonl"), "").unwrap();

        assert_eq!(history.projects(), vec![project]);
    }

    #[test]
    fn test_session_files_newest_modification_first() {
        use filetime::{set_file_mtime, FileTime};

        let root = TempDir::new().unwrap();
        let history = ClaudeHistory::with_root(root.path().to_path_buf());
        let older = root.path().join("older.jsonl");
        let newer = root.path().join("newer.jsonl");
        let oldest = root.path().join("oldest.jsonl");
        for (file, secs) in [(&newer, 3_000), (&older, 2_000), (&oldest, 1_000)] {
            std::fs::write(file, "").unwrap();
            set_file_mtime(file, FileTime::from_unix_time(1_700_000_000 + secs, 0)).unwrap();
        }

        assert_eq!(history.session_files(root.path()), vec![newer, older, oldest]);
    }

    #[test]
    fn test_session_files_only_jsonl() {
        let root = TempDir::new().unwrap();
        let history = ClaudeHistory::with_root(root.path().to_path_buf());
        std::fs::write(root.path().join("a.jsonl"), "").unwrap();
        std::fs::write(root.path().join("notes.txt"), "").unwrap();

        let files = history.session_files(root.path());
        assert_eq!(files, vec![root.path().join("a.jsonl")]);
        assert!(history
            .session_files(&root.path().join("missing"))
            .is_empty());
    }
}
