//! Outbound conversation messages.

use serde::{Deserialize, Serialize};

/// A message handed to the conversation-facing layer.
///
/// `static` is plain text, `error` carries text plus diagnostic context,
/// `data` carries a structured payload the presentation layer phrases
/// naturally (e.g. a question plus the list of still-missing fields).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Message {
    Static {
        content: String,
    },
    Error {
        content: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        context: Option<serde_json::Value>,
    },
    Data {
        content: serde_json::Value,
        #[serde(skip_serializing_if = "Option::is_none")]
        action: Option<String>,
    },
}

impl Message {
    /// Plain text message.
    pub fn text(content: impl Into<String>) -> Self {
        Message::Static {
            content: content.into(),
        }
    }

    /// Error message with optional structured context.
    pub fn error(content: impl Into<String>, context: Option<serde_json::Value>) -> Self {
        Message::Error {
            content: content.into(),
            context,
        }
    }

    /// Structured data message with an optional action tag.
    pub fn data(content: serde_json::Value, action: Option<&str>) -> Self {
        Message::Data {
            content,
            action: action.map(str::to_string),
        }
    }
}
