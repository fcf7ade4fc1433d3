//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/companion/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/companion/` (~/.config/companion/)
//! - State/Logs: `$XDG_STATE_HOME/companion/` (~/.local/state/companion/)

use crate::error::{Error, Result};
use crate::monitor::Category;
use chrono::NaiveDate;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// File name prefix of the daily log files
pub const LOG_FILE_PREFIX: &str = "companion.log";

/// Returns a best-effort home directory path.
pub(crate) fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns XDG_CONFIG_HOME or ~/.config
fn xdg_config_home() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
}

/// Returns XDG_STATE_HOME or ~/.local/state
fn xdg_state_home() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/state"))
}

/// Main configuration struct
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Session history sources
    #[serde(default)]
    pub history: HistoryConfig,

    /// File change monitoring
    #[serde(default)]
    pub monitor: MonitorConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where session history is read from
#[derive(Debug, Deserialize, Clone)]
pub struct HistoryConfig {
    /// Provider id used to look up the history backend
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Override path for Claude Code data (defaults to `~/.claude`)
    pub claude_dir: Option<PathBuf>,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            claude_dir: None,
        }
    }
}

fn default_provider() -> String {
    "claude".to_string()
}

/// Debounce windows and watched locations for the change coalescer.
///
/// Working-tree edits are the noisiest source, so they get the shortest
/// window; notes are rare and can wait longer.
#[derive(Debug, Deserialize, Clone)]
pub struct MonitorConfig {
    /// Quiet period for `.git` status and history changes
    #[serde(default = "default_git_debounce_ms")]
    pub git_debounce_ms: u64,

    /// Quiet period for per-file working tree changes
    #[serde(default = "default_working_tree_debounce_ms")]
    pub working_tree_debounce_ms: u64,

    /// Quiet period for notes/docs changes
    #[serde(default = "default_notes_debounce_ms")]
    pub notes_debounce_ms: u64,

    /// Quiet period for task definition changes
    #[serde(default = "default_tasks_debounce_ms")]
    pub tasks_debounce_ms: u64,

    /// Note directories, relative to the project root
    #[serde(default = "default_notes_dirs")]
    pub notes_dirs: Vec<PathBuf>,

    /// Individual note files, relative to the project root
    #[serde(default = "default_notes_files")]
    pub notes_files: Vec<PathBuf>,

    /// Directory holding the task definitions, relative to the project root
    #[serde(default = "default_tasks_dir")]
    pub tasks_dir: PathBuf,

    /// Only this file name inside `tasks_dir` counts as a task change
    #[serde(default = "default_tasks_file")]
    pub tasks_file: String,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            git_debounce_ms: default_git_debounce_ms(),
            working_tree_debounce_ms: default_working_tree_debounce_ms(),
            notes_debounce_ms: default_notes_debounce_ms(),
            tasks_debounce_ms: default_tasks_debounce_ms(),
            notes_dirs: default_notes_dirs(),
            notes_files: default_notes_files(),
            tasks_dir: default_tasks_dir(),
            tasks_file: default_tasks_file(),
        }
    }
}

fn default_git_debounce_ms() -> u64 {
    200
}

fn default_working_tree_debounce_ms() -> u64 {
    150
}

fn default_notes_debounce_ms() -> u64 {
    300
}

fn default_tasks_debounce_ms() -> u64 {
    200
}

fn default_notes_dirs() -> Vec<PathBuf> {
    vec![PathBuf::from("notes"), PathBuf::from("docs")]
}

fn default_notes_files() -> Vec<PathBuf> {
    vec![PathBuf::from("CLAUDE.md")]
}

fn default_tasks_dir() -> PathBuf {
    PathBuf::from(".vscode")
}

fn default_tasks_file() -> String {
    "tasks.json".to_string()
}

impl MonitorConfig {
    /// Debounce window for a notification category
    pub fn debounce_for(&self, category: Category) -> Duration {
        let ms = match category {
            Category::GitStatus | Category::GitHistory => self.git_debounce_ms,
            Category::WorkingTree => self.working_tree_debounce_ms,
            Category::Notes => self.notes_debounce_ms,
            Category::Tasks => self.tasks_debounce_ms,
        };
        Duration::from_millis(ms)
    }

    /// Validate configuration, returning error message if invalid
    pub fn validate(&self) -> Result<()> {
        let windows = [
            ("monitor.git_debounce_ms", self.git_debounce_ms),
            ("monitor.working_tree_debounce_ms", self.working_tree_debounce_ms),
            ("monitor.notes_debounce_ms", self.notes_debounce_ms),
            ("monitor.tasks_debounce_ms", self.tasks_debounce_ms),
        ];
        for (name, value) in windows {
            if value == 0 {
                return Err(Error::Config(format!("{} must be greater than 0", name)));
            }
        }
        if self.tasks_file.is_empty() {
            return Err(Error::Config(
                "monitor.tasks_file must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Maximum number of log files to keep
    #[serde(default = "default_max_log_files")]
    pub max_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            max_files: default_max_log_files(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_log_files() -> usize {
    5
}

impl Config {
    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            return Ok(Config::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;

        config.monitor.validate()?;

        Ok(config)
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/companion/config.toml` (~/.config/companion/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("companion").join("config.toml")
    }

    /// Returns the state directory path (for logs)
    ///
    /// `$XDG_STATE_HOME/companion/` (~/.local/state/companion/)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("companion")
    }

    /// Returns the log file written on `date`
    ///
    /// Logs roll daily, so each day gets `companion.log.YYYY-MM-DD`.
    pub fn log_path_for(date: NaiveDate) -> PathBuf {
        Self::state_dir().join(format!(
            "{}.{}",
            LOG_FILE_PREFIX,
            date.format("%Y-%m-%d")
        ))
    }

    /// Returns the log file currently being written (rotation follows UTC dates)
    pub fn log_path() -> PathBuf {
        Self::log_path_for(chrono::Utc::now().date_naive())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.history.provider, "claude");
        assert!(config.history.claude_dir.is_none());
        assert_eq!(config.monitor.git_debounce_ms, 200);
        assert_eq!(config.monitor.working_tree_debounce_ms, 150);
        assert_eq!(config.monitor.notes_debounce_ms, 300);
        assert_eq!(config.monitor.tasks_debounce_ms, 200);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_parse_config() {
        let toml = r#"
[history]
claude_dir = "/tmp/claude"

[monitor]
working_tree_debounce_ms = 80
notes_dirs = ["wiki"]

[logging]
level = "debug"
"#;
        let config: Config = toml::from_str(toml).unwrap();

        assert_eq!(
            config.history.claude_dir.as_deref(),
            Some(Path::new("/tmp/claude"))
        );
        assert_eq!(config.monitor.working_tree_debounce_ms, 80);
        assert_eq!(config.monitor.git_debounce_ms, 200);
        assert_eq!(config.monitor.notes_dirs, vec![PathBuf::from("wiki")]);
        assert_eq!(config.monitor.tasks_file, "tasks.json");
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_debounce_for_categories() {
        let config = MonitorConfig::default();
        assert_eq!(
            config.debounce_for(Category::GitStatus),
            Duration::from_millis(200)
        );
        assert_eq!(
            config.debounce_for(Category::GitHistory),
            config.debounce_for(Category::Tasks)
        );
        assert!(
            config.debounce_for(Category::WorkingTree) < config.debounce_for(Category::GitStatus)
        );
        assert!(config.debounce_for(Category::Notes) > config.debounce_for(Category::GitStatus));
    }

    #[test]
    fn test_monitor_config_validation() {
        assert!(MonitorConfig::default().validate().is_ok());

        let config = MonitorConfig {
            notes_debounce_ms: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = MonitorConfig {
            tasks_file: String::new(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_rejects_zero_window() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[monitor]\ngit_debounce_ms = 0\n").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("git_debounce_ms"));
    }
}
