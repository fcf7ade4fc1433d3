//! Raw JSONL record types (serde deserialization)
//!
//! Session logs are append-only and loosely typed, so every field is
//! optional and type mismatches on non-essential fields degrade to `None`
//! instead of rejecting the whole line.

use serde::{Deserialize, Deserializer};
use serde_json::value::RawValue;
use serde_json::Value;

/// One line of a session log, dispatched on its `type` field.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub(crate) enum LogEvent {
    User(ConversationEvent),
    Assistant(ConversationEvent),
    ToolResult(ToolResultEvent),
    /// Summaries, snapshots and anything else we do not render
    #[serde(other)]
    Other,
}

impl LogEvent {
    pub(crate) fn from_value(value: Value) -> serde_json::Result<Self> {
        serde_json::from_value(value)
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ConversationEvent {
    #[serde(default, deserialize_with = "lenient_string")]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub message: Option<RawMessage>,
}

impl ConversationEvent {
    pub(crate) fn into_content(self) -> Option<RawContent> {
        self.message.and_then(|m| m.content)
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ToolResultEvent {
    #[serde(default, deserialize_with = "lenient_string")]
    pub timestamp: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub tool_use_id: Option<String>,
    #[serde(default)]
    pub content: Value,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub is_error: bool,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RawMessage {
    #[serde(default)]
    pub content: Option<RawContent>,
}

/// `message.content` is either a plain string or a list of typed blocks.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum RawContent {
    Text(String),
    Blocks(Vec<Value>),
    Other(Value),
}

impl RawContent {
    /// Text fragments in order: the string itself, or every `text` block.
    pub(crate) fn text_items(self) -> Vec<String> {
        match self {
            RawContent::Text(text) => vec![text],
            RawContent::Blocks(items) => items
                .into_iter()
                .filter_map(|item| match RawBlock::from_value(item) {
                    Some(RawBlock::Text { text }) => Some(text),
                    _ => None,
                })
                .collect(),
            RawContent::Other(_) => Vec::new(),
        }
    }
}

/// An item inside a content list.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub(crate) enum RawBlock {
    Text {
        #[serde(default, deserialize_with = "lenient_text")]
        text: String,
    },
    Thinking {
        #[serde(default, deserialize_with = "lenient_text")]
        thinking: String,
    },
    ToolUse {
        #[serde(default, deserialize_with = "lenient_text")]
        id: String,
        #[serde(default, deserialize_with = "lenient_text")]
        name: String,
        #[serde(default = "empty_object")]
        input: Value,
    },
    /// Images, nested tool results and unknown block types
    #[serde(other)]
    Other,
}

impl RawBlock {
    /// Decode one list item; malformed items are dropped individually.
    pub(crate) fn from_value(value: Value) -> Option<Self> {
        serde_json::from_value(value).ok()
    }
}

/// Just enough of an event for the metadata scan.
///
/// `message` stays unparsed until a preview is actually needed.
#[derive(Debug, Deserialize)]
pub(crate) struct EventProbe {
    #[serde(rename = "type", default, deserialize_with = "lenient_string")]
    pub kind: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub message: Option<Box<RawValue>>,
}

impl EventProbe {
    pub(crate) fn is_conversation(&self) -> bool {
        matches!(self.kind.as_deref(), Some("user") | Some("assistant"))
    }

    pub(crate) fn is_user(&self) -> bool {
        self.kind.as_deref() == Some("user")
    }

    /// Preview text of a user event: the string content, or its first text block.
    pub(crate) fn user_preview(&self) -> Option<String> {
        let raw = self.message.as_ref()?;
        let message: RawMessage = serde_json::from_str(raw.get()).ok()?;
        match message.content {
            Some(content) => content.text_items().into_iter().next(),
            None => Some(String::new()),
        }
    }
}

/// Stringify tool result content: strings verbatim, null as empty, anything else as JSON.
pub(crate) fn stringify_result(content: &Value) -> String {
    match content {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        v => v.to_string(),
    }
}

fn empty_object() -> Value {
    Value::Object(serde_json::Map::new())
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        _ => None,
    })
}

/// Like [`lenient_string`], but absent, null and non-string values read as `""`.
fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    lenient_string(deserializer).map(Option::unwrap_or_default)
}

fn lenient_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(matches!(value, Some(Value::Bool(true))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_event_dispatch() {
        let event = LogEvent::from_value(json!({
            "type": "user",
            "timestamp": "2025-01-01T00:00:00Z",
            "message": {"content": "hi"}
        }))
        .unwrap();
        assert!(matches!(event, LogEvent::User(_)));

        let event = LogEvent::from_value(json!({"type": "summary", "summary": "x"})).unwrap();
        assert!(matches!(event, LogEvent::Other));

        let event = LogEvent::from_value(json!({
            "type": "tool_result",
            "tool_use_id": "t1",
            "content": "ok"
        }))
        .unwrap();
        match event {
            LogEvent::ToolResult(result) => {
                assert_eq!(result.tool_use_id.as_deref(), Some("t1"));
                assert!(!result.is_error);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_non_string_timestamp_is_ignored() {
        let event = LogEvent::from_value(json!({
            "type": "assistant",
            "timestamp": 12345,
            "message": {"content": "hi"}
        }))
        .unwrap();
        match event {
            LogEvent::Assistant(conv) => assert!(conv.timestamp.is_none()),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_text_items_skip_other_blocks() {
        let content: RawContent = serde_json::from_value(json!([
            {"type": "image", "source": {}},
            "not a block",
            {"type": "text", "text": "one"},
            {"type": "tool_result", "tool_use_id": "t1", "content": "x"},
            {"type": "text", "text": "two"}
        ]))
        .unwrap();
        assert_eq!(content.text_items(), vec!["one", "two"]);
    }

    #[test]
    fn test_null_block_fields_read_as_empty() {
        let block = RawBlock::from_value(json!({
            "type": "tool_use",
            "id": null,
            "name": null,
            "input": {"command": "ls"}
        }));
        match block {
            Some(RawBlock::ToolUse { id, name, input }) => {
                assert_eq!(id, "");
                assert_eq!(name, "");
                assert_eq!(input, json!({"command": "ls"}));
            }
            other => panic!("unexpected block: {:?}", other),
        }

        let block = RawBlock::from_value(json!({"type": "text", "text": null}));
        assert!(matches!(block, Some(RawBlock::Text { text }) if text.is_empty()));

        let block = RawBlock::from_value(json!({"type": "thinking", "thinking": 7}));
        assert!(matches!(block, Some(RawBlock::Thinking { thinking }) if thinking.is_empty()));
    }

    #[test]
    fn test_probe_preview() {
        let probe: EventProbe = serde_json::from_str(
            r#"{"type":"user","message":{"content":[{"type":"image"},{"type":"text","text":"look"}]}}"#,
        )
        .unwrap();
        assert!(probe.is_user());
        assert_eq!(probe.user_preview().as_deref(), Some("look"));

        let probe: EventProbe =
            serde_json::from_str(r#"{"type":"assistant","timestamp":null}"#).unwrap();
        assert!(probe.is_conversation());
        assert!(probe.timestamp.is_none());
    }

    #[test]
    fn test_stringify_result() {
        assert_eq!(stringify_result(&json!("2 failed")), "2 failed");
        assert_eq!(stringify_result(&Value::Null), "");
        assert_eq!(stringify_result(&json!({"ok": true})), r#"{"ok":true}"#);
    }
}
