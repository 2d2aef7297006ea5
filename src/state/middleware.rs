//! Optional debug instrumentation around state mutation.
//!
//! Both wrappers take the mutation function and return an instrumented one;
//! they only log and never change what the wrapped function does.

use super::SharedState;
use crate::sync::SyncMessage;
use std::time::Instant;

fn summarize(state: &SharedState) -> String {
    format!(
        "chat={} decorators={} rule_sets={} config_errors={} analyzing={}",
        state.chat_messages.len(),
        state.decorators.len(),
        state.analysis.rule_sets.len(),
        state.config_errors.len(),
        state.analysis.is_analyzing
    )
}

/// Wraps an authoritative-side mutation that may yield a message to publish.
pub fn logged_mutation<F>(
    label: &'static str,
    mutation: F,
) -> impl FnOnce(&mut SharedState) -> Option<SyncMessage>
where
    F: FnOnce(&mut SharedState) -> Option<SyncMessage>,
{
    move |state: &mut SharedState| {
        let started = Instant::now();
        log::debug!("[state] {label} before: {}", summarize(state));
        let message = mutation(state);
        log::debug!(
            "[state] {label} after: {} -> {} ({:?})",
            summarize(state),
            message
                .as_ref()
                .map_or("no message", |message| message.message_type().as_str()),
            started.elapsed()
        );
        message
    }
}

/// Wraps a mirror reducer.
pub fn logged_reducer<R>(reducer: R) -> impl Fn(&SharedState, SyncMessage) -> SharedState + Send + Sync
where
    R: Fn(&SharedState, SyncMessage) -> SharedState + Send + Sync,
{
    move |state: &SharedState, message: SyncMessage| {
        let message_type = message.message_type();
        let next = reducer(state, message);
        log::debug!(
            "[mirror] {message_type}: {} -> {}",
            summarize(state),
            summarize(&next)
        );
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Settings;

    #[test]
    fn test_logged_mutation_preserves_behavior() {
        let mut state = SharedState::default();
        let wrapped = logged_mutation("settings", |state: &mut SharedState| {
            state.settings.agent_mode = true;
            Some(SyncMessage::SettingsUpdate(state.settings.clone()))
        });
        let message = wrapped(&mut state);
        assert!(state.settings.agent_mode);
        assert!(matches!(message, Some(SyncMessage::SettingsUpdate(Settings { agent_mode: true, .. }))));
    }

    #[test]
    fn test_logged_reducer_matches_plain_reducer() {
        let message = SyncMessage::SettingsUpdate(Settings {
            auto_accept_on_save: true,
            ..Default::default()
        });
        let plain = crate::sync::reduce(&SharedState::default(), message.clone());
        let logged = logged_reducer(crate::sync::reduce)(&SharedState::default(), message);
        assert_eq!(plain, logged);
    }
}
