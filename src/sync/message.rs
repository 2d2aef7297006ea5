//! Closed catalog of state synchronization messages.
//!
//! Each message is serialized as `{ "type": <catalog id>, "payload": ... }`.
//! A new kind of update gets a new catalog entry; payload shapes of existing
//! entries never change meaning.

use crate::domain::{
    AnalysisState, ChatMessage, ConfigError, FileDecorations, ProfilesState, ProtocolError,
    ServerStatus, Settings, SolutionWorkflowState,
};
use crate::state::SharedState;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

pub const FULL_STATE_UPDATE: &str = "FULL_STATE_UPDATE";
pub const ANALYSIS_STATE_UPDATE: &str = "ANALYSIS_STATE_UPDATE";
pub const CHAT_MESSAGES_UPDATE: &str = "CHAT_MESSAGES_UPDATE";
pub const CHAT_MESSAGE_STREAMING_UPDATE: &str = "CHAT_MESSAGE_STREAMING_UPDATE";
pub const PROFILES_UPDATE: &str = "PROFILES_UPDATE";
pub const SERVER_STATE_UPDATE: &str = "SERVER_STATE_UPDATE";
pub const SOLUTION_WORKFLOW_UPDATE: &str = "SOLUTION_WORKFLOW_UPDATE";
pub const CONFIG_ERRORS_UPDATE: &str = "CONFIG_ERRORS_UPDATE";
pub const DECORATORS_UPDATE: &str = "DECORATORS_UPDATE";
pub const SETTINGS_UPDATE: &str = "SETTINGS_UPDATE";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageType {
    FullStateUpdate,
    AnalysisStateUpdate,
    ChatMessagesUpdate,
    ChatMessageStreamingUpdate,
    ProfilesUpdate,
    ServerStateUpdate,
    SolutionWorkflowUpdate,
    ConfigErrorsUpdate,
    DecoratorsUpdate,
    SettingsUpdate,
}

impl MessageType {
    pub const ALL: [MessageType; 10] = [
        MessageType::FullStateUpdate,
        MessageType::AnalysisStateUpdate,
        MessageType::ChatMessagesUpdate,
        MessageType::ChatMessageStreamingUpdate,
        MessageType::ProfilesUpdate,
        MessageType::ServerStateUpdate,
        MessageType::SolutionWorkflowUpdate,
        MessageType::ConfigErrorsUpdate,
        MessageType::DecoratorsUpdate,
        MessageType::SettingsUpdate,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::FullStateUpdate => FULL_STATE_UPDATE,
            MessageType::AnalysisStateUpdate => ANALYSIS_STATE_UPDATE,
            MessageType::ChatMessagesUpdate => CHAT_MESSAGES_UPDATE,
            MessageType::ChatMessageStreamingUpdate => CHAT_MESSAGE_STREAMING_UPDATE,
            MessageType::ProfilesUpdate => PROFILES_UPDATE,
            MessageType::ServerStateUpdate => SERVER_STATE_UPDATE,
            MessageType::SolutionWorkflowUpdate => SOLUTION_WORKFLOW_UPDATE,
            MessageType::ConfigErrorsUpdate => CONFIG_ERRORS_UPDATE,
            MessageType::DecoratorsUpdate => DECORATORS_UPDATE,
            MessageType::SettingsUpdate => SETTINGS_UPDATE,
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for MessageType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MessageType::ALL
            .into_iter()
            .find(|message_type| message_type.as_str() == s)
            .ok_or_else(|| format!("unknown message type: {s}"))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessagesUpdate {
    pub chat_messages: Vec<ChatMessage>,
    pub previous_length: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessageStreamingUpdate {
    pub message_index: usize,
    pub message: ChatMessage,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigErrorsUpdate {
    pub config_errors: Vec<ConfigError>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecoratorsUpdate {
    pub file_uri: String,
    pub decorations: FileDecorations,
}

/// Authoritative-to-surface message. `FullStateUpdate` is the only snapshot;
/// every other variant replaces or patches exactly one domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SyncMessage {
    FullStateUpdate(Box<SharedState>),
    AnalysisStateUpdate(AnalysisState),
    ChatMessagesUpdate(ChatMessagesUpdate),
    ChatMessageStreamingUpdate(ChatMessageStreamingUpdate),
    ProfilesUpdate(ProfilesState),
    ServerStateUpdate(ServerStatus),
    SolutionWorkflowUpdate(SolutionWorkflowState),
    ConfigErrorsUpdate(ConfigErrorsUpdate),
    DecoratorsUpdate(DecoratorsUpdate),
    SettingsUpdate(Settings),
}

impl SyncMessage {
    pub fn message_type(&self) -> MessageType {
        match self {
            SyncMessage::FullStateUpdate(_) => MessageType::FullStateUpdate,
            SyncMessage::AnalysisStateUpdate(_) => MessageType::AnalysisStateUpdate,
            SyncMessage::ChatMessagesUpdate(_) => MessageType::ChatMessagesUpdate,
            SyncMessage::ChatMessageStreamingUpdate(_) => MessageType::ChatMessageStreamingUpdate,
            SyncMessage::ProfilesUpdate(_) => MessageType::ProfilesUpdate,
            SyncMessage::ServerStateUpdate(_) => MessageType::ServerStateUpdate,
            SyncMessage::SolutionWorkflowUpdate(_) => MessageType::SolutionWorkflowUpdate,
            SyncMessage::ConfigErrorsUpdate(_) => MessageType::ConfigErrorsUpdate,
            SyncMessage::DecoratorsUpdate(_) => MessageType::DecoratorsUpdate,
            SyncMessage::SettingsUpdate(_) => MessageType::SettingsUpdate,
        }
    }

    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Decodes a raw envelope, distinguishing unknown catalog ids from payloads
/// that do not match their type's shape.
pub fn decode_envelope(raw: &str) -> Result<SyncMessage, ProtocolError> {
    let value: Value = serde_json::from_str(raw)
        .map_err(|err| ProtocolError::MalformedEnvelope(err.to_string()))?;
    let object = value
        .as_object()
        .ok_or_else(|| ProtocolError::MalformedEnvelope("envelope is not an object".into()))?;
    let type_id = object
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| ProtocolError::MalformedEnvelope("missing string `type`".into()))?
        .to_string();
    if let Some(extra) = object.keys().find(|key| *key != "type" && *key != "payload") {
        return Err(ProtocolError::MalformedEnvelope(format!(
            "unexpected envelope field `{extra}`"
        )));
    }
    let message_type =
        MessageType::from_str(&type_id).map_err(|_| ProtocolError::UnknownType(type_id.clone()))?;

    serde_json::from_value(value).map_err(|source| ProtocolError::PayloadMismatch {
        message_type: message_type.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ServerState;
    use serde_json::json;

    #[test]
    fn test_catalog_ids_round_trip() {
        for message_type in MessageType::ALL {
            assert_eq!(
                MessageType::from_str(message_type.as_str()).unwrap(),
                message_type
            );
        }
        assert!(MessageType::from_str("SOMETHING_ELSE").is_err());
    }

    #[test]
    fn test_envelope_uses_catalog_ids() {
        let message = SyncMessage::ServerStateUpdate(ServerStatus {
            server_state: ServerState::Running,
            detail: None,
        });
        let value = serde_json::to_value(&message).unwrap();
        assert_eq!(value["type"], SERVER_STATE_UPDATE);
        assert_eq!(value["payload"]["serverState"], "running");

        let full = SyncMessage::FullStateUpdate(Box::default());
        assert_eq!(serde_json::to_value(&full).unwrap()["type"], FULL_STATE_UPDATE);
        assert_eq!(full.message_type(), MessageType::FullStateUpdate);
    }

    #[test]
    fn test_decode_distinguishes_failures() {
        let unknown = json!({"type": "BOGUS_UPDATE", "payload": {}}).to_string();
        assert!(matches!(
            decode_envelope(&unknown),
            Err(ProtocolError::UnknownType(t)) if t == "BOGUS_UPDATE"
        ));

        let mismatch = json!({"type": SETTINGS_UPDATE, "payload": {"agentMode": "yes"}}).to_string();
        assert!(matches!(
            decode_envelope(&mismatch),
            Err(ProtocolError::PayloadMismatch { .. })
        ));

        assert!(matches!(
            decode_envelope("not json"),
            Err(ProtocolError::MalformedEnvelope(_))
        ));
        let extra = json!({"type": SETTINGS_UPDATE, "payload": {}, "seq": 1}).to_string();
        assert!(matches!(
            decode_envelope(&extra),
            Err(ProtocolError::MalformedEnvelope(_))
        ));
    }

    #[test]
    fn test_decode_valid_message() {
        let message = SyncMessage::ConfigErrorsUpdate(ConfigErrorsUpdate {
            config_errors: vec![ConfigError {
                kind: "no-profile".into(),
                message: "No active profile".into(),
                detail: None,
            }],
        });
        let decoded = decode_envelope(&message.encode().unwrap()).unwrap();
        assert_eq!(decoded, message);
    }
}
