//! Read-only mirror of the authoritative state held by the presentation surface.
//!
//! The mirror changes only through [`reduce`], a pure function from the
//! current state and one message to the next state. The mirror then swaps the
//! whole state; readers holding an older snapshot keep a consistent view.

use super::message::{SyncMessage, decode_envelope};
use crate::state::SharedState;
use crate::state::middleware::logged_reducer;
use std::sync::Arc;

pub fn reduce(state: &SharedState, message: SyncMessage) -> SharedState {
    let mut next = state.clone();
    match message {
        SyncMessage::FullStateUpdate(snapshot) => return *snapshot,
        SyncMessage::AnalysisStateUpdate(analysis) => next.analysis = analysis,
        SyncMessage::ChatMessagesUpdate(update) => next.chat_messages = update.chat_messages,
        SyncMessage::ChatMessageStreamingUpdate(update) => {
            let index = update.message_index;
            let len = next.chat_messages.len();
            match next.chat_messages.get_mut(index) {
                Some(existing) if existing.message_token == update.message.message_token => {
                    *existing = update.message;
                }
                None if index == len => {
                    next.chat_messages.push(update.message);
                }
                _ => {
                    log::warn!("skipping streaming update for stale chat index {index}");
                }
            }
        }
        SyncMessage::ProfilesUpdate(profiles) => next.profiles = profiles,
        SyncMessage::ServerStateUpdate(server) => next.server = server,
        SyncMessage::SolutionWorkflowUpdate(solution) => next.solution = solution,
        SyncMessage::ConfigErrorsUpdate(update) => next.config_errors = update.config_errors,
        SyncMessage::DecoratorsUpdate(update) => {
            if update.decorations.apply_state.is_closed() {
                next.decorators.remove(&update.file_uri);
            } else {
                next.decorators.insert(update.file_uri, update.decorations);
            }
        }
        SyncMessage::SettingsUpdate(settings) => next.settings = settings,
    }
    next
}

type Reducer = Box<dyn Fn(&SharedState, SyncMessage) -> SharedState + Send + Sync>;

pub struct PresentationMirror {
    state: Arc<SharedState>,
    reducer: Reducer,
    applied: u64,
    skipped: u64,
}

impl Default for PresentationMirror {
    fn default() -> Self {
        Self::new(false)
    }
}

impl PresentationMirror {
    pub fn new(debug: bool) -> Self {
        let reducer: Reducer = if debug {
            Box::new(logged_reducer(reduce))
        } else {
            Box::new(reduce)
        };
        Self {
            state: Arc::new(SharedState::default()),
            reducer,
            applied: 0,
            skipped: 0,
        }
    }

    pub fn snapshot(&self) -> Arc<SharedState> {
        self.state.clone()
    }

    pub fn apply(&mut self, message: SyncMessage) {
        self.state = Arc::new((self.reducer)(&self.state, message));
        self.applied += 1;
    }

    /// Decodes and applies one raw envelope. Contract violations are logged
    /// and skipped; the channel keeps going.
    pub fn receive_raw(&mut self, raw: &str) -> bool {
        match decode_envelope(raw) {
            Ok(message) => {
                self.apply(message);
                true
            }
            Err(err) => {
                log::warn!("skipping sync message: {err}");
                self.skipped += 1;
                false
            }
        }
    }

    pub fn applied(&self) -> u64 {
        self.applied
    }

    pub fn skipped(&self) -> u64 {
        self.skipped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        ApplyState, ApplyStatus, ChatContent, ChatMessage, FileDecorations, ServerState,
        ServerStatus,
    };
    use crate::sync::message::{ChatMessageStreamingUpdate, DecoratorsUpdate};

    fn chat(token: &str, text: &str) -> ChatMessage {
        ChatMessage {
            message_token: token.into(),
            timestamp: "t".into(),
            content: ChatContent::Text(text.into()),
            quick_responses: vec![],
        }
    }

    #[test]
    fn test_reduce_is_pure() {
        let before = SharedState::default();
        let after = reduce(
            &before,
            SyncMessage::ServerStateUpdate(ServerStatus {
                server_state: ServerState::Running,
                detail: None,
            }),
        );
        assert_eq!(before.server.server_state, ServerState::Initial);
        assert_eq!(after.server.server_state, ServerState::Running);
    }

    #[test]
    fn test_streaming_update_replaces_or_appends() {
        let mut state = SharedState::default();
        state.chat_messages.push(chat("m1", "Hel"));

        let state = reduce(
            &state,
            SyncMessage::ChatMessageStreamingUpdate(ChatMessageStreamingUpdate {
                message_index: 0,
                message: chat("m1", "Hello"),
            }),
        );
        assert_eq!(state.chat_messages[0].content.render_plain(), "Hello");

        let state = reduce(
            &state,
            SyncMessage::ChatMessageStreamingUpdate(ChatMessageStreamingUpdate {
                message_index: 1,
                message: chat("m2", "next"),
            }),
        );
        assert_eq!(state.chat_messages.len(), 2);

        let stale = reduce(
            &state,
            SyncMessage::ChatMessageStreamingUpdate(ChatMessageStreamingUpdate {
                message_index: 0,
                message: chat("other", "x"),
            }),
        );
        assert_eq!(stale, state);
    }

    #[test]
    fn test_closed_decorations_are_dropped() {
        let open = DecoratorsUpdate {
            file_uri: "file:///a".into(),
            decorations: FileDecorations::default(),
        };
        let state = reduce(&SharedState::default(), SyncMessage::DecoratorsUpdate(open));
        assert!(state.decorators.contains_key("file:///a"));

        let closed = DecoratorsUpdate {
            file_uri: "file:///a".into(),
            decorations: FileDecorations {
                apply_state: ApplyState {
                    status: ApplyStatus::Closed,
                    ..Default::default()
                },
                blocks: vec![],
            },
        };
        let state = reduce(&state, SyncMessage::DecoratorsUpdate(closed));
        assert!(state.decorators.is_empty());
    }

    #[test]
    fn test_mirror_skips_bad_envelopes() {
        let mut mirror = PresentationMirror::new(true);
        let before = mirror.snapshot();

        assert!(!mirror.receive_raw(r#"{"type":"NOPE","payload":{}}"#));
        assert!(!mirror.receive_raw(r#"{"type":"PROFILES_UPDATE","payload":"nope"}"#));
        assert!(mirror.receive_raw(
            r#"{"type":"SERVER_STATE_UPDATE","payload":{"serverState":"starting"}}"#
        ));

        assert_eq!(before.server.server_state, ServerState::Initial);
        assert_eq!(mirror.snapshot().server.server_state, ServerState::Starting);
        assert_eq!(mirror.skipped(), 2);
        assert_eq!(mirror.applied(), 1);
    }
}
