//! Session log reconstruction
//!
//! Turns one append-only JSONL session log into an ordered list of
//! [`Message`]s, pairing each tool invocation with the result that arrives
//! later in the stream.
//!
//! # Error Handling
//!
//! Nothing here fails loudly:
//!
//! - **Unreadable file**: [`scan_metadata`] returns `None`, [`load_full`]
//!   returns an empty list.
//! - **Malformed JSON lines**: skipped, the rest of the file is still read.
//! - **Malformed timestamps**: treated as absent.
//! - **Tool results with an unknown id**: dropped.
//!
//! # Correlation
//!
//! A single forward pass keeps a table from tool-use id to the position
//! (message index, block index) of the block awaiting its result. When the
//! result arrives the block is updated in place through that position. The
//! table lives only for the duration of one parse.

use super::record::{
    stringify_result, ConversationEvent, EventProbe, LogEvent, RawBlock, RawContent,
    ToolResultEvent,
};
use super::timestamp::parse_timestamp;
use crate::error::Result;
use crate::types::{ContentBlock, Message, Role, Session, ToolUse};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Scan a session file for listing metadata without building messages.
///
/// Reads line by line and only decodes a message body for the preview.
/// Returns `None` when the file cannot be opened or read.
pub fn scan_metadata(path: &Path) -> Option<Session> {
    match try_scan_metadata(path) {
        Ok(session) => Some(session),
        Err(e) => {
            tracing::debug!(
                path = %path.display(),
                error = %e,
                "Session unavailable, skipping"
            );
            None
        }
    }
}

fn try_scan_metadata(path: &Path) -> Result<Session> {
    let reader = BufReader::new(File::open(path)?);

    let mut message_count = 0usize;
    let mut timestamp: Option<DateTime<Utc>> = None;
    let mut preview = String::new();

    for line in reader.split(b'\n') {
        let line = line?;
        if is_blank(&line) {
            continue;
        }

        let probe: EventProbe = match serde_json::from_slice(&line) {
            Ok(p) => p,
            Err(_) => continue,
        };

        if probe.is_conversation() {
            message_count += 1;
        }

        // First parseable timestamp wins
        if timestamp.is_none() {
            timestamp = probe.timestamp.as_deref().and_then(parse_timestamp);
        }

        if preview.is_empty() && probe.is_user() {
            if let Some(text) = probe.user_preview() {
                preview = text;
            }
        }
    }

    Ok(Session {
        id: session_id_from_path(path),
        path: path.to_path_buf(),
        message_count,
        timestamp,
        preview,
    })
}

/// Load every message of a session file, in file order.
///
/// Returns an empty list if the file cannot be opened. A read error part
/// way through keeps the messages reconstructed up to that point.
pub fn load_full(path: &Path) -> Vec<Message> {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) => {
            tracing::debug!(
                path = %path.display(),
                error = %e,
                "Session unavailable, returning no messages"
            );
            return Vec::new();
        }
    };

    let mut reconstructor = Reconstructor::new();
    if let Err(e) = reconstructor.read_from(BufReader::new(file)) {
        tracing::warn!(
            path = %path.display(),
            error = %e,
            messages = reconstructor.len(),
            "Read error while loading session, keeping partial transcript"
        );
    }
    reconstructor.finish()
}

/// Session id derived from the file name (stem).
pub fn session_id_from_path(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn is_blank(line: &[u8]) -> bool {
    line.iter().all(u8::is_ascii_whitespace)
}

/// Position of a tool-use block inside the message list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct BlockRef {
    message: usize,
    block: usize,
}

/// Incremental builder behind [`load_full`].
///
/// Feed it lines in file order with [`Reconstructor::push_line`], then take
/// the messages with [`Reconstructor::finish`].
#[derive(Debug, Default)]
pub struct Reconstructor {
    messages: Vec<Message>,
    pending_tools: HashMap<String, BlockRef>,
    skipped_lines: usize,
}

impl Reconstructor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of messages built so far
    pub(crate) fn len(&self) -> usize {
        self.messages.len()
    }

    /// Lines that were not valid JSON events
    pub fn skipped_lines(&self) -> usize {
        self.skipped_lines
    }

    /// Consume every line from `reader`.
    pub fn read_from<R: BufRead>(&mut self, reader: R) -> std::io::Result<()> {
        for line in reader.split(b'\n') {
            self.push_line(&line?);
        }
        Ok(())
    }

    /// Apply one raw JSONL line.
    pub fn push_line(&mut self, line: &[u8]) {
        if is_blank(line) {
            return;
        }

        let event =
            serde_json::from_slice::<serde_json::Value>(line).and_then(LogEvent::from_value);
        match event {
            Ok(event) => self.apply(event),
            Err(e) => {
                self.skipped_lines += 1;
                tracing::trace!(error = %e, "Skipping malformed session line");
            }
        }
    }

    fn apply(&mut self, event: LogEvent) {
        match event {
            LogEvent::User(conv) => self.apply_user(conv),
            LogEvent::Assistant(conv) => self.apply_assistant(conv),
            LogEvent::ToolResult(result) => self.apply_tool_result(result),
            LogEvent::Other => {}
        }
    }

    fn apply_user(&mut self, conv: ConversationEvent) {
        let timestamp = conv.timestamp.as_deref().and_then(parse_timestamp);
        // A user event without content reads as an empty string
        let content = conv
            .into_content()
            .unwrap_or_else(|| RawContent::Text(String::new()));

        let mut blocks = Vec::new();
        match content {
            RawContent::Text(text) => blocks.push(ContentBlock::Text { text }),
            RawContent::Blocks(items) => {
                for item in items {
                    // Only text survives in user turns; nested tool results
                    // never resolve a tool use
                    if let Some(RawBlock::Text { text }) = RawBlock::from_value(item) {
                        blocks.push(ContentBlock::Text { text });
                    }
                }
            }
            RawContent::Other(_) => {}
        }

        self.push_message(Role::User, timestamp, blocks, Vec::new());
    }

    fn apply_assistant(&mut self, conv: ConversationEvent) {
        let timestamp = conv.timestamp.as_deref().and_then(parse_timestamp);

        let mut blocks = Vec::new();
        let mut tool_ids = Vec::new();
        match conv.into_content() {
            Some(RawContent::Text(text)) => blocks.push(ContentBlock::Text { text }),
            Some(RawContent::Blocks(items)) => {
                for item in items {
                    match RawBlock::from_value(item) {
                        Some(RawBlock::Text { text }) => blocks.push(ContentBlock::Text { text }),
                        Some(RawBlock::Thinking { thinking }) => {
                            blocks.push(ContentBlock::Thinking { thinking })
                        }
                        Some(RawBlock::ToolUse { id, name, input }) => {
                            tool_ids.push((id.clone(), blocks.len()));
                            blocks.push(ContentBlock::ToolUse(ToolUse::new(id, name, input)));
                        }
                        _ => {}
                    }
                }
            }
            Some(RawContent::Other(_)) | None => {}
        }

        self.push_message(Role::Assistant, timestamp, blocks, tool_ids);
    }

    fn apply_tool_result(&mut self, result: ToolResultEvent) {
        self.resolve_tool(
            result.tool_use_id.as_deref(),
            &result.content,
            result.is_error,
        );
    }

    /// Append a message and register its tool uses. Empty messages are dropped.
    fn push_message(
        &mut self,
        role: Role,
        timestamp: Option<DateTime<Utc>>,
        blocks: Vec<ContentBlock>,
        tool_ids: Vec<(String, usize)>,
    ) {
        if blocks.is_empty() {
            return;
        }

        let message = self.messages.len();
        for (id, block) in tool_ids {
            if id.is_empty() {
                continue;
            }
            self.pending_tools.insert(id, BlockRef { message, block });
        }

        self.messages.push(Message {
            role,
            timestamp,
            blocks,
        });
    }

    /// Merge a result into its tool use. A repeated result overwrites the earlier one.
    fn resolve_tool(
        &mut self,
        tool_use_id: Option<&str>,
        content: &serde_json::Value,
        is_error: bool,
    ) {
        let Some(id) = tool_use_id.filter(|id| !id.is_empty()) else {
            return;
        };

        let Some(&BlockRef { message, block }) = self.pending_tools.get(id) else {
            tracing::trace!(tool_use_id = %id, "Dropping result for unknown tool use");
            return;
        };

        if let Some(ContentBlock::ToolUse(tool)) = self
            .messages
            .get_mut(message)
            .and_then(|m| m.blocks.get_mut(block))
        {
            tool.output = stringify_result(content);
            tool.is_error = is_error;
        }
    }

    /// The reconstructed messages, in file order.
    pub fn finish(self) -> Vec<Message> {
        self.messages
    }
}
