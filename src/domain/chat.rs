use serde::{Deserialize, Serialize};

/// Chat content variants. Every consumer matches on all of them, so a new
/// kind fails to compile until each dispatch site handles it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ChatContent {
    Text(String),
    Markdown(String),
    Json(serde_json::Value),
}

impl ChatContent {
    pub fn kind(&self) -> &'static str {
        match self {
            ChatContent::Text(_) => "text",
            ChatContent::Markdown(_) => "markdown",
            ChatContent::Json(_) => "json",
        }
    }

    /// Plain-text rendering used by log output and the CLI.
    pub fn render_plain(&self) -> String {
        match self {
            ChatContent::Text(text) => text.clone(),
            ChatContent::Markdown(markdown) => markdown.clone(),
            ChatContent::Json(value) => {
                serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
            }
        }
    }

    /// Appends a streamed delta. JSON content cannot be extended textually and
    /// is returned unchanged (`false`).
    pub fn append_delta(&mut self, delta: &str) -> bool {
        match self {
            ChatContent::Text(text) | ChatContent::Markdown(text) => {
                text.push_str(delta);
                true
            }
            ChatContent::Json(_) => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuickResponse {
    pub id: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub message_token: String,
    pub timestamp: String,
    pub content: ChatContent,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub quick_responses: Vec<QuickResponse>,
}
