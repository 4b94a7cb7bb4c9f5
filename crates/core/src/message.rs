//! Message and Conversation domain types.
//!
//! A conversation is an append-only sequence of role-tagged messages, each
//! made of content blocks. Assistant turns are stored with *all* their
//! blocks (text and tool-use requests) so later turns replay correctly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversationId(pub String);

impl ConversationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for ConversationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConversationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The role of a message sender in a conversation.
///
/// Tool results travel as user-role messages, which is what the
/// completion service expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One block of message content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    /// Plain text
    Text { text: String },

    /// A tool-use request emitted by the model
    ToolUse {
        id: String,
        name: String,
        input: serde_json::Value,
    },

    /// The result of executing a tool, keyed by the request's call id
    ToolResult {
        tool_use_id: String,
        content: String,
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        is_error: bool,
    },
}

impl ContentBlock {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    pub fn tool_result(tool_use_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self::ToolResult {
            tool_use_id: tool_use_id.into(),
            content: content.into(),
            is_error: false,
        }
    }

    pub fn tool_error(tool_use_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self::ToolResult {
            tool_use_id: tool_use_id.into(),
            content: content.into(),
            is_error: true,
        }
    }
}

/// A tool-use request borrowed out of an assistant message.
#[derive(Debug, Clone, Copy)]
pub struct ToolUse<'a> {
    pub id: &'a str,
    pub name: &'a str,
    pub input: &'a serde_json::Value,
}

/// Iterate the tool-use requests in a block list, in order.
pub fn tool_uses(blocks: &[ContentBlock]) -> impl Iterator<Item = ToolUse<'_>> {
    blocks.iter().filter_map(|b| match b {
        ContentBlock::ToolUse { id, name, input } => Some(ToolUse { id, name, input }),
        _ => None,
    })
}

/// The first text block in a block list, if any.
pub fn first_text(blocks: &[ContentBlock]) -> Option<&str> {
    blocks.iter().find_map(|b| match b {
        ContentBlock::Text { text } => Some(text.as_str()),
        _ => None,
    })
}

/// A single message in a conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: Vec<ContentBlock>,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Create a user message with a single text block.
    pub fn user(text: impl Into<String>) -> Self {
        Self::with_blocks(Role::User, vec![ContentBlock::text(text)])
    }

    /// Create an assistant message with a single text block.
    pub fn assistant(text: impl Into<String>) -> Self {
        Self::with_blocks(Role::Assistant, vec![ContentBlock::text(text)])
    }

    /// Create a message from arbitrary blocks.
    pub fn with_blocks(role: Role, content: Vec<ContentBlock>) -> Self {
        Self {
            role,
            content,
            timestamp: Utc::now(),
        }
    }

    /// Bundle tool results into one user-role message.
    pub fn tool_results(results: Vec<ContentBlock>) -> Self {
        Self::with_blocks(Role::User, results)
    }

    pub fn has_tool_use(&self) -> bool {
        tool_uses(&self.content).next().is_some()
    }

    pub fn first_text(&self) -> Option<&str> {
        first_text(&self.content)
    }
}

/// An ordered, append-only sequence of messages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: ConversationId,
    pub messages: Vec<Message>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: ConversationId::new(),
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Append a message.
    pub fn push(&mut self, message: Message) {
        self.updated_at = Utc::now();
        self.messages.push(message);
    }

    /// Drop every message. The only way content ever leaves a conversation.
    pub fn clear(&mut self) {
        self.updated_at = Utc::now();
        self.messages.clear();
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_message_is_single_text_block() {
        let msg = Message::user("Check the crane schedule");
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.first_text(), Some("Check the crane schedule"));
        assert!(!msg.has_tool_use());
    }

    #[test]
    fn tool_uses_preserve_order() {
        let blocks = vec![
            ContentBlock::text("Looking that up"),
            ContentBlock::ToolUse {
                id: "toolu_1".into(),
                name: "weather".into(),
                input: serde_json::json!({"days": 14}),
            },
            ContentBlock::ToolUse {
                id: "toolu_2".into(),
                name: "risk_register".into(),
                input: serde_json::json!({}),
            },
        ];
        let ids: Vec<&str> = tool_uses(&blocks).map(|u| u.id).collect();
        assert_eq!(ids, vec!["toolu_1", "toolu_2"]);
        assert_eq!(first_text(&blocks), Some("Looking that up"));
    }

    #[test]
    fn first_text_absent_for_tool_only_blocks() {
        let blocks = vec![ContentBlock::tool_result("toolu_1", "ok")];
        assert!(first_text(&blocks).is_none());
    }

    #[test]
    fn content_block_wire_shape() {
        let json = serde_json::to_value(ContentBlock::tool_error("toolu_9", "Error: boom")).unwrap();
        assert_eq!(json["type"], "tool_result");
        assert_eq!(json["tool_use_id"], "toolu_9");
        assert_eq!(json["is_error"], true);

        let ok = serde_json::to_value(ContentBlock::tool_result("toolu_9", "fine")).unwrap();
        assert!(ok.get("is_error").is_none());
    }

    #[test]
    fn clear_resets_conversation() {
        let mut conv = Conversation::new();
        conv.push(Message::user("one"));
        conv.push(Message::assistant("two"));
        assert_eq!(conv.len(), 2);
        conv.clear();
        assert!(conv.is_empty());
    }
}
