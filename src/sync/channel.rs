use super::message::SyncMessage;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

/// Append-only outgoing queue owned by the authoritative process.
///
/// Messages are delivered in send order. There is no acknowledgement; when no
/// receiver is attached the message is dropped and left to the transport.
#[derive(Clone)]
pub struct SyncPublisher {
    tx: UnboundedSender<SyncMessage>,
    sent: Arc<AtomicU64>,
}

impl SyncPublisher {
    pub fn publish(&self, message: SyncMessage) {
        let message_type = message.message_type();
        match self.tx.send(message) {
            Ok(()) => {
                self.sent.fetch_add(1, Ordering::Relaxed);
                log::trace!("published {message_type}");
            }
            Err(_) => log::debug!("no receiver attached; dropped {message_type}"),
        }
    }

    pub fn sent(&self) -> u64 {
        self.sent.load(Ordering::Relaxed)
    }
}

pub struct SyncReceiver {
    rx: UnboundedReceiver<SyncMessage>,
}

impl SyncReceiver {
    pub async fn recv(&mut self) -> Option<SyncMessage> {
        self.rx.recv().await
    }

    /// Everything queued so far, in send order.
    pub fn drain(&mut self) -> Vec<SyncMessage> {
        let mut messages = Vec::new();
        while let Ok(message) = self.rx.try_recv() {
            messages.push(message);
        }
        messages
    }
}

pub fn sync_channel() -> (SyncPublisher, SyncReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (
        SyncPublisher {
            tx,
            sent: Arc::new(AtomicU64::new(0)),
        },
        SyncReceiver { rx },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Settings;
    use crate::sync::MessageType;

    #[test]
    fn test_messages_arrive_in_send_order() {
        let (publisher, mut receiver) = sync_channel();
        for agent_mode in [true, false, true] {
            publisher.publish(SyncMessage::SettingsUpdate(Settings {
                agent_mode,
                ..Default::default()
            }));
        }

        let modes: Vec<bool> = receiver
            .drain()
            .into_iter()
            .map(|message| match message {
                SyncMessage::SettingsUpdate(settings) => settings.agent_mode,
                other => panic!("unexpected {:?}", other.message_type()),
            })
            .collect();
        assert_eq!(modes, vec![true, false, true]);
        assert_eq!(publisher.sent(), 3);
    }

    #[test]
    fn test_publish_without_receiver_is_silent() {
        let (publisher, receiver) = sync_channel();
        drop(receiver);
        publisher.publish(SyncMessage::SettingsUpdate(Settings::default()));
        assert_eq!(publisher.sent(), 0);
        assert_eq!(MessageType::SettingsUpdate.as_str(), "SETTINGS_UPDATE");
    }
}
