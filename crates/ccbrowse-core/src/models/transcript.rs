//! Transcript models: loglines, message content and content blocks
//!
//! Content arrives either as a plain string or as an array of typed blocks.
//! Block parsing is lenient: anything that does not match a known shape is
//! kept as [`ContentBlock::Unknown`] instead of failing the whole entry.

use super::session::SessionId;
use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Author of a transcript entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// Message content: plain text or an ordered sequence of blocks
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Blocks(Vec<ContentBlock>),
}

impl Default for MessageContent {
    fn default() -> Self {
        MessageContent::Text(String::new())
    }
}

impl<'de> Deserialize<'de> for MessageContent {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::String(text) => MessageContent::Text(text),
            Value::Array(items) => {
                MessageContent::Blocks(items.into_iter().map(ContentBlock::from_value).collect())
            }
            // null, numbers, objects: nothing displayable
            _ => MessageContent::Blocks(Vec::new()),
        })
    }
}

impl MessageContent {
    /// Concatenated text of all text blocks, space separated
    pub fn plain_text(&self) -> String {
        match self {
            MessageContent::Text(text) => text.clone(),
            MessageContent::Blocks(blocks) => blocks
                .iter()
                .filter_map(|block| match block {
                    ContentBlock::Text { text } => Some(text.as_str()),
                    _ => None,
                })
                .collect::<Vec<_>>()
                .join(" "),
        }
    }
}

/// One unit of a message's content
#[derive(Debug, Clone, PartialEq)]
pub enum ContentBlock {
    Text { text: String },
    Image { source: ImageSource },
    /// Any other block type (tool_use, tool_result, thinking, ...) or a
    /// malformed known block, preserved verbatim
    Unknown(Value),
}

/// Known block shapes as they appear on the wire
#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum KnownBlock {
    Text {
        #[serde(default)]
        text: String,
    },
    Image {
        source: ImageSource,
    },
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum KnownBlockRef<'a> {
    Text { text: &'a str },
    Image { source: &'a ImageSource },
}

impl ContentBlock {
    /// Lenient conversion from an arbitrary JSON value
    pub fn from_value(value: Value) -> Self {
        match serde_json::from_value::<KnownBlock>(value.clone()) {
            Ok(KnownBlock::Text { text }) => ContentBlock::Text { text },
            Ok(KnownBlock::Image { source }) => ContentBlock::Image { source },
            Err(_) => ContentBlock::Unknown(value),
        }
    }
}

impl<'de> Deserialize<'de> for ContentBlock {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(ContentBlock::from_value(Value::deserialize(deserializer)?))
    }
}

impl Serialize for ContentBlock {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ContentBlock::Text { text } => KnownBlockRef::Text { text }.serialize(serializer),
            ContentBlock::Image { source } => KnownBlockRef::Image { source }.serialize(serializer),
            ContentBlock::Unknown(value) => value.serialize(serializer),
        }
    }
}

/// Where an image block's bytes come from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ImageSource {
    Base64 {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        media_type: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        data: Option<String>,
    },
    Url {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        url: Option<String>,
    },
    #[serde(other)]
    Unknown,
}

/// Normalized unit ready for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum RenderableBlock {
    Text { text: String },
    Image { url: String },
}

/// One turn of a conversation
///
/// Serialized in the logline shape the session files use:
/// `{"type": "user", "timestamp": "...", "message": {"content": ...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "LoglineWire", into = "LoglineWire")]
pub struct TranscriptEntry {
    pub role: Role,
    pub timestamp: String,
    pub content: MessageContent,
    pub is_compact_summary: bool,
}

impl TranscriptEntry {
    pub fn new(role: Role, content: MessageContent) -> Self {
        Self {
            role,
            timestamp: String::new(),
            content,
            is_compact_summary: false,
        }
    }

    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = timestamp.into();
        self
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoglineWire {
    #[serde(rename = "type")]
    role: Role,
    #[serde(default)]
    timestamp: Option<String>,
    #[serde(default)]
    message: Option<MessageWire>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    is_compact_summary: bool,
}

#[derive(Serialize, Deserialize)]
struct MessageWire {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<Role>,
    #[serde(default)]
    content: MessageContent,
}

impl From<LoglineWire> for TranscriptEntry {
    fn from(wire: LoglineWire) -> Self {
        Self {
            role: wire.role,
            timestamp: wire.timestamp.unwrap_or_default(),
            content: wire.message.map(|m| m.content).unwrap_or_default(),
            is_compact_summary: wire.is_compact_summary,
        }
    }
}

impl From<TranscriptEntry> for LoglineWire {
    fn from(entry: TranscriptEntry) -> Self {
        Self {
            role: entry.role,
            timestamp: Some(entry.timestamp),
            message: Some(MessageWire {
                role: Some(entry.role),
                content: entry.content,
            }),
            is_compact_summary: entry.is_compact_summary,
        }
    }
}

/// Body of `GET /api/sessions/{id}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TranscriptResponse {
    #[serde(default)]
    pub loglines: Vec<TranscriptEntry>,
    #[serde(default)]
    pub summary: String,
}

/// A loaded transcript, tagged with the session it belongs to
#[derive(Debug, Clone, PartialEq)]
pub struct Transcript {
    pub session_id: SessionId,
    pub summary: String,
    pub entries: Vec<TranscriptEntry>,
}

impl Transcript {
    pub fn from_response(session_id: SessionId, response: TranscriptResponse) -> Self {
        Self {
            session_id,
            summary: response.summary,
            entries: response.loglines,
        }
    }
}

/// A single raw line from a session JSONL file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionLine {
    /// Event type: "user", "assistant", "summary", "file-history-snapshot", ...
    #[serde(rename = "type", default)]
    pub line_type: String,

    #[serde(default)]
    pub timestamp: Option<String>,

    #[serde(default)]
    pub message: Option<SessionMessage>,

    /// Title text on "summary" lines
    #[serde(default)]
    pub summary: Option<Value>,

    #[serde(default)]
    pub is_compact_summary: bool,
}

/// Message payload inside a session line
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionMessage {
    #[serde(default)]
    pub content: MessageContent,
}

impl SessionLine {
    /// Role for conversational lines, `None` for bookkeeping lines
    pub fn role(&self) -> Option<Role> {
        match self.line_type.as_str() {
            "user" => Some(Role::User),
            "assistant" => Some(Role::Assistant),
            _ => None,
        }
    }

    /// Summary title if this is a "summary" line carrying text
    pub fn summary_text(&self) -> Option<&str> {
        if self.line_type != "summary" {
            return None;
        }
        self.summary
            .as_ref()
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Convert a conversational line into a transcript entry
    pub fn into_entry(self) -> Option<TranscriptEntry> {
        let role = self.role()?;
        Some(TranscriptEntry {
            role,
            timestamp: self.timestamp.unwrap_or_default(),
            content: self.message.map(|m| m.content).unwrap_or_default(),
            is_compact_summary: self.is_compact_summary,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_plain_string() {
        let content: MessageContent = serde_json::from_str(r#""hello""#).unwrap();
        assert_eq!(content, MessageContent::Text("hello".to_string()));
    }

    #[test]
    fn test_content_blocks_lenient() {
        let content: MessageContent = serde_json::from_str(
            r#"[
                {"type": "text", "text": "look"},
                {"type": "tool_use", "id": "t1", "name": "Bash", "input": {}},
                {"type": "image", "source": {"type": "base64", "media_type": "image/png", "data": "AAAA"}},
                {"type": "image"},
                42
            ]"#,
        )
        .unwrap();

        let MessageContent::Blocks(blocks) = content else {
            panic!("expected blocks");
        };
        assert_eq!(blocks.len(), 5);
        assert!(matches!(&blocks[0], ContentBlock::Text { text } if text == "look"));
        assert!(matches!(&blocks[1], ContentBlock::Unknown(_)));
        assert!(matches!(
            &blocks[2],
            ContentBlock::Image { source: ImageSource::Base64 { data: Some(d), .. } } if d == "AAAA"
        ));
        // image without source is malformed, kept as unknown
        assert!(matches!(&blocks[3], ContentBlock::Unknown(_)));
        assert!(matches!(&blocks[4], ContentBlock::Unknown(Value::Number(_))));
    }

    #[test]
    fn test_unknown_image_encoding() {
        let block: ContentBlock = serde_json::from_str(
            r#"{"type": "image", "source": {"type": "file", "file_id": "f_1"}}"#,
        )
        .unwrap();
        assert_eq!(
            block,
            ContentBlock::Image {
                source: ImageSource::Unknown
            }
        );
    }

    #[test]
    fn test_unknown_block_serializes_verbatim() {
        let raw = r#"{"type":"tool_result","tool_use_id":"t1","content":"ok"}"#;
        let block: ContentBlock = serde_json::from_str(raw).unwrap();
        let back = serde_json::to_value(&block).unwrap();
        assert_eq!(back, serde_json::from_str::<Value>(raw).unwrap());
    }

    #[test]
    fn test_logline_shape() {
        let json = r#"{
            "type": "assistant",
            "timestamp": "2025-01-15T10:02:00Z",
            "message": {"role": "assistant", "content": [{"type": "text", "text": "Done"}]},
            "isCompactSummary": true
        }"#;
        let entry: TranscriptEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.role, Role::Assistant);
        assert_eq!(entry.timestamp, "2025-01-15T10:02:00Z");
        assert!(entry.is_compact_summary);
        assert_eq!(entry.content.plain_text(), "Done");

        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["type"], "assistant");
        assert_eq!(value["message"]["content"][0]["text"], "Done");
        assert_eq!(value["isCompactSummary"], true);
    }

    #[test]
    fn test_logline_missing_message() {
        let entry: TranscriptEntry =
            serde_json::from_str(r#"{"type": "user", "timestamp": null}"#).unwrap();
        assert_eq!(entry.content, MessageContent::default());
        assert!(entry.timestamp.is_empty());
        assert!(!entry.is_compact_summary);
    }

    #[test]
    fn test_session_line_summary_and_entry() {
        let summary: SessionLine =
            serde_json::from_str(r#"{"type": "summary", "summary": "Fix login bug", "leafUuid": "x"}"#)
                .unwrap();
        assert_eq!(summary.summary_text(), Some("Fix login bug"));
        assert!(summary.clone().into_entry().is_none());

        let user: SessionLine = serde_json::from_str(
            r#"{"type": "user", "timestamp": "2025-01-15T10:01:00Z", "message": {"role": "user", "content": "Hi"}}"#,
        )
        .unwrap();
        assert_eq!(user.summary_text(), None);
        let entry = user.into_entry().unwrap();
        assert_eq!(entry.role, Role::User);
        assert_eq!(entry.content, MessageContent::Text("Hi".to_string()));
    }

    #[test]
    fn test_plain_text_joins_text_blocks() {
        let content = MessageContent::Blocks(vec![
            ContentBlock::Text {
                text: "one".to_string(),
            },
            ContentBlock::Unknown(Value::Null),
            ContentBlock::Text {
                text: "two".to_string(),
            },
        ]);
        assert_eq!(content.plain_text(), "one two");
    }
}
