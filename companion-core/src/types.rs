//! Core domain types for companion
//!
//! These types describe a reconstructed conversation transcript as read from
//! an assistant's session log.
//!
//! ## Terminology
//!
//! | Term | Definition |
//! |------|------------|
//! | **Session** | One recorded conversation, stored as one append-only JSONL file |
//! | **Message** | One turn in a session, authored by the user, the assistant, or the system |
//! | **Content block** | A typed fragment of a message (text, thinking, tool use, system notice) |
//! | **Tool use** | An assistant invoking a capability; its result is merged in when it arrives |

use crate::format::{format_display_date, truncate_chars};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Maximum preview length shown in session listings.
pub const SHORT_PREVIEW_CHARS: usize = 50;

/// Maximum length of a Bash command shown as a tool subtitle.
const COMMAND_SUBTITLE_CHARS: usize = 50;

// ============================================
// Session
// ============================================

/// A session transcript discovered on disk.
///
/// Built by a metadata scan that reads only what it needs; the messages
/// themselves are loaded separately. Nothing is cached: a rewritten file
/// makes this value stale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Session id (file name without extension)
    pub id: String,
    /// Full path to the JSONL file
    pub path: PathBuf,
    /// Number of user + assistant events in the file
    pub message_count: usize,
    /// First parseable timestamp in the file
    pub timestamp: Option<DateTime<Utc>>,
    /// First user message, used as a preview
    pub preview: String,
}

impl Session {
    /// Timestamp formatted for display, or "Unknown"
    pub fn display_date(&self) -> String {
        format_display_date(self.timestamp)
    }

    /// Preview truncated for list rows
    pub fn short_preview(&self) -> String {
        truncate_chars(&self.preview, SHORT_PREVIEW_CHARS)
    }

    /// Case-insensitive match against the short preview or display date.
    ///
    /// An empty query matches every session.
    pub fn matches_filter(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return true;
        }
        self.short_preview().to_lowercase().contains(&query)
            || self.display_date().to_lowercase().contains(&query)
    }
}

impl std::fmt::Display for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({} msgs)", self.display_date(), self.message_count)
    }
}

// ============================================
// Messages
// ============================================

/// Who authored a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    /// Informational events such as conversation compaction
    System,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "assistant" => Ok(Role::Assistant),
            "system" => Ok(Role::System),
            _ => Err(format!("unknown role: {}", s)),
        }
    }
}

/// A tool invocation and, once correlated, its result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolUse {
    /// Correlation id shared with the matching tool result
    pub id: String,
    /// Tool name (Bash, Read, Edit, ...)
    pub name: String,
    /// Structured tool input
    pub input: serde_json::Value,
    /// Stringified result content; empty until a result arrives
    #[serde(default)]
    pub output: String,
    /// Whether the result was an error
    #[serde(default)]
    pub is_error: bool,
}

impl ToolUse {
    pub fn new(id: impl Into<String>, name: impl Into<String>, input: serde_json::Value) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            input,
            output: String::new(),
            is_error: false,
        }
    }

    /// True once a result has been merged in
    pub fn has_result(&self) -> bool {
        !self.output.is_empty() || self.is_error
    }

    /// Short description of the call, picked per tool.
    pub fn subtitle(&self) -> String {
        let field = |name: &str| {
            self.input
                .get(name)
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string()
        };

        match self.name.as_str() {
            "Read" | "Edit" | "Write" => field("file_path"),
            "Bash" => truncate_chars(&field("command"), COMMAND_SUBTITLE_CHARS),
            "Glob" | "Grep" => field("pattern"),
            "Task" => field("description"),
            "WebFetch" => field("url"),
            "WebSearch" => field("query"),
            _ => String::new(),
        }
    }
}

/// A typed fragment of a message.
///
/// Tool results never appear on their own; they are merged into the
/// [`ToolUse`] they answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text { text: String },
    /// Model reasoning, shown collapsed
    Thinking { thinking: String },
    ToolUse(ToolUse),
    /// Informational notice (compaction and similar)
    System { text: String },
}

impl ContentBlock {
    pub fn text(text: impl Into<String>) -> Self {
        ContentBlock::Text { text: text.into() }
    }

    /// The block's type tag
    pub fn type_name(&self) -> &'static str {
        match self {
            ContentBlock::Text { .. } => "text",
            ContentBlock::Thinking { .. } => "thinking",
            ContentBlock::ToolUse(_) => "tool_use",
            ContentBlock::System { .. } => "system",
        }
    }

    pub fn as_tool_use(&self) -> Option<&ToolUse> {
        match self {
            ContentBlock::ToolUse(tool) => Some(tool),
            _ => None,
        }
    }
}

/// One turn in a conversation.
///
/// A message always has at least one content block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    /// Timestamp of the originating event
    pub timestamp: Option<DateTime<Utc>>,
    pub blocks: Vec<ContentBlock>,
}

impl Message {
    /// All text blocks joined by newlines
    pub fn text_content(&self) -> String {
        self.blocks
            .iter()
            .filter_map(|b| match b {
                ContentBlock::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn has_thinking(&self) -> bool {
        self.blocks
            .iter()
            .any(|b| matches!(b, ContentBlock::Thinking { .. }))
    }

    /// All thinking blocks joined by newlines
    pub fn thinking_content(&self) -> String {
        self.blocks
            .iter()
            .filter_map(|b| match b {
                ContentBlock::Thinking { thinking } => Some(thinking.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn tool_uses(&self) -> Vec<&ToolUse> {
        self.blocks.iter().filter_map(|b| b.as_tool_use()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn session(preview: &str) -> Session {
        Session {
            id: "abc".to_string(),
            path: PathBuf::from("/tmp/abc.jsonl"),
            message_count: 4,
            timestamp: Some(Utc.with_ymd_and_hms(2025, 3, 7, 14, 30, 0).unwrap()),
            preview: preview.to_string(),
        }
    }

    #[test]
    fn test_session_display() {
        let s = session("fix the bug");
        assert_eq!(s.display_date(), "2025-03-07 14:30");
        assert_eq!(s.to_string(), "2025-03-07 14:30 (4 msgs)");
    }

    #[test]
    fn test_short_preview_truncates() {
        let s = session(&"word ".repeat(20));
        let preview = s.short_preview();
        assert_eq!(preview.chars().count(), SHORT_PREVIEW_CHARS);
        assert!(preview.ends_with("..."));
    }

    #[test]
    fn test_matches_filter() {
        let s = session("Fix the Parser");
        assert!(s.matches_filter(""));
        assert!(s.matches_filter("parser"));
        assert!(s.matches_filter("2025-03"));
        assert!(!s.matches_filter("database"));
    }

    #[test]
    fn test_role_round_trip_names() {
        assert_eq!("assistant".parse::<Role>().unwrap(), Role::Assistant);
        assert_eq!(Role::System.to_string(), "system");
        assert!("tool".parse::<Role>().is_err());
    }

    #[test]
    fn test_tool_subtitles() {
        let read = ToolUse::new("1", "Read", json!({"file_path": "/src/main.rs"}));
        assert_eq!(read.subtitle(), "/src/main.rs");

        let long_cmd = "cargo test --workspace --all-features -- --nocapture --test-threads=1";
        let bash = ToolUse::new("2", "Bash", json!({ "command": long_cmd }));
        let subtitle = bash.subtitle();
        assert_eq!(subtitle.chars().count(), 50);
        assert!(subtitle.starts_with("cargo test"));

        let grep = ToolUse::new("3", "Grep", json!({"pattern": "fn main"}));
        assert_eq!(grep.subtitle(), "fn main");

        let unknown = ToolUse::new("4", "Mystery", json!({"anything": 1}));
        assert_eq!(unknown.subtitle(), "");
    }

    #[test]
    fn test_message_helpers() {
        let msg = Message {
            role: Role::Assistant,
            timestamp: None,
            blocks: vec![
                ContentBlock::Thinking {
                    thinking: "hmm".to_string(),
                },
                ContentBlock::text("first"),
                ContentBlock::ToolUse(ToolUse::new("t1", "Bash", json!({}))),
                ContentBlock::text("second"),
            ],
        };
        assert_eq!(msg.text_content(), "first\nsecond");
        assert!(msg.has_thinking());
        assert_eq!(msg.thinking_content(), "hmm");
        assert_eq!(msg.tool_uses().len(), 1);
        assert_eq!(msg.tool_uses()[0].name, "Bash");
    }

    #[test]
    fn test_content_block_serializes_with_type_tag() {
        let block = ContentBlock::ToolUse(ToolUse::new("t1", "Bash", json!({"command": "ls"})));
        let value = serde_json::to_value(&block).unwrap();
        assert_eq!(value["type"], "tool_use");
        assert_eq!(value["name"], "Bash");
        assert_eq!(block.type_name(), "tool_use");
    }
}
