//! Authoritative shared state.
//!
//! `StateStore` is the only writer. Every mutation runs under the store lock
//! and publishes the matching domain message before the lock is released, so
//! the outgoing queue observes mutations in the order they happened.

pub mod middleware;

use crate::domain::{
    AnalysisState, ChatContent, ChatMessage, ConfigError, FileDecorations, ProfilesState,
    QuickResponse, ServerState, ServerStatus, Settings, SolutionWorkflowState,
};
use crate::sync::{
    ChatMessageStreamingUpdate, ChatMessagesUpdate, ConfigErrorsUpdate, DecoratorsUpdate,
    SyncMessage, SyncPublisher,
};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SharedState {
    pub analysis: AnalysisState,
    pub chat_messages: Vec<ChatMessage>,
    pub profiles: ProfilesState,
    pub server: ServerStatus,
    pub solution: SolutionWorkflowState,
    pub config_errors: Vec<ConfigError>,
    /// Pending diff decorations keyed by file URI. Closed diffs are removed.
    pub decorators: BTreeMap<String, FileDecorations>,
    pub settings: Settings,
}

pub struct StateStore {
    state: Mutex<SharedState>,
    publisher: SyncPublisher,
    debug_mutations: bool,
}

impl StateStore {
    pub fn new(publisher: SyncPublisher) -> Self {
        Self {
            state: Mutex::new(SharedState::default()),
            publisher,
            debug_mutations: false,
        }
    }

    pub fn with_debug_mutations(mut self, enabled: bool) -> Self {
        self.debug_mutations = enabled;
        self
    }

    pub fn snapshot(&self) -> SharedState {
        self.state.lock().clone()
    }

    /// Sends the whole state; used at session start and on request.
    pub fn publish_full_state(&self) {
        self.mutate("full_state", |state| {
            Some(SyncMessage::FullStateUpdate(Box::new(state.clone())))
        });
    }

    fn mutate<F>(&self, label: &'static str, mutation: F)
    where
        F: FnOnce(&mut SharedState) -> Option<SyncMessage>,
    {
        let mut state = self.state.lock();
        let message = if self.debug_mutations {
            middleware::logged_mutation(label, mutation)(&mut state)
        } else {
            mutation(&mut state)
        };
        if let Some(message) = message {
            self.publisher.publish(message);
        }
    }

    pub fn update_analysis(&self, update: impl FnOnce(&mut AnalysisState)) {
        self.mutate("analysis", |state| {
            update(&mut state.analysis);
            Some(SyncMessage::AnalysisStateUpdate(state.analysis.clone()))
        });
    }

    /// Appends a chat message and returns its token.
    pub fn push_chat_message(
        &self,
        content: ChatContent,
        quick_responses: Vec<QuickResponse>,
    ) -> String {
        let message_token = uuid::Uuid::new_v4().to_string();
        let message = ChatMessage {
            message_token: message_token.clone(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            content,
            quick_responses,
        };
        self.mutate("chat_messages", |state| {
            let previous_length = state.chat_messages.len();
            state.chat_messages.push(message);
            Some(SyncMessage::ChatMessagesUpdate(ChatMessagesUpdate {
                chat_messages: state.chat_messages.clone(),
                previous_length,
            }))
        });
        message_token
    }

    /// Appends streamed text to an existing message. Returns `false` when the
    /// message is unknown or its content cannot be extended.
    pub fn stream_chat_delta(&self, message_token: &str, delta: &str) -> bool {
        let mut applied = false;
        self.mutate("chat_streaming", |state| {
            let message_index = state
                .chat_messages
                .iter()
                .rposition(|message| message.message_token == message_token)?;
            let message = &mut state.chat_messages[message_index];
            if !message.content.append_delta(delta) {
                return None;
            }
            applied = true;
            Some(SyncMessage::ChatMessageStreamingUpdate(
                ChatMessageStreamingUpdate {
                    message_index,
                    message: message.clone(),
                },
            ))
        });
        applied
    }

    pub fn clear_chat(&self) {
        self.mutate("chat_messages", |state| {
            let previous_length = state.chat_messages.len();
            state.chat_messages.clear();
            Some(SyncMessage::ChatMessagesUpdate(ChatMessagesUpdate {
                chat_messages: Vec::new(),
                previous_length,
            }))
        });
    }

    pub fn set_profiles(&self, profiles: ProfilesState) {
        self.mutate("profiles", |state| {
            state.profiles = profiles;
            Some(SyncMessage::ProfilesUpdate(state.profiles.clone()))
        });
    }

    /// Activates a known profile. Unknown ids leave the state untouched.
    pub fn set_active_profile(&self, profile_id: &str) -> bool {
        let mut found = false;
        self.mutate("profiles", |state| {
            if !state.profiles.profiles.iter().any(|p| p.id == profile_id) {
                return None;
            }
            found = true;
            state.profiles.active_profile_id = Some(profile_id.to_string());
            Some(SyncMessage::ProfilesUpdate(state.profiles.clone()))
        });
        found
    }

    pub fn set_server_state(&self, server_state: ServerState, detail: Option<String>) {
        self.mutate("server", |state| {
            state.server = ServerStatus {
                server_state,
                detail,
            };
            Some(SyncMessage::ServerStateUpdate(state.server.clone()))
        });
    }

    pub fn update_solution(&self, update: impl FnOnce(&mut SolutionWorkflowState)) {
        self.mutate("solution", |state| {
            update(&mut state.solution);
            Some(SyncMessage::SolutionWorkflowUpdate(state.solution.clone()))
        });
    }

    pub fn set_config_errors(&self, config_errors: Vec<ConfigError>) {
        self.mutate("config_errors", |state| {
            state.config_errors = config_errors;
            Some(SyncMessage::ConfigErrorsUpdate(ConfigErrorsUpdate {
                config_errors: state.config_errors.clone(),
            }))
        });
    }

    /// Publishes the decorations of one file. Closed diffs are dropped from
    /// the state after their final update is sent.
    pub fn set_decorations(&self, file_uri: &str, decorations: FileDecorations) {
        self.mutate("decorators", |state| {
            if decorations.apply_state.is_closed() {
                state.decorators.remove(file_uri);
            } else {
                state
                    .decorators
                    .insert(file_uri.to_string(), decorations.clone());
            }
            Some(SyncMessage::DecoratorsUpdate(DecoratorsUpdate {
                file_uri: file_uri.to_string(),
                decorations,
            }))
        });
    }

    pub fn set_settings(&self, settings: Settings) {
        self.mutate("settings", |state| {
            state.settings = settings;
            Some(SyncMessage::SettingsUpdate(state.settings.clone()))
        });
    }
}
