//! State synchronization between the authoritative process and a
//! presentation surface: message catalog, outgoing channel and the
//! surface-side mirror.

pub mod channel;
pub mod message;
pub mod mirror;

pub use channel::{SyncPublisher, SyncReceiver, sync_channel};
pub use message::{
    ChatMessageStreamingUpdate, ChatMessagesUpdate, ConfigErrorsUpdate, DecoratorsUpdate,
    MessageType, SyncMessage, decode_envelope,
};
pub use mirror::{PresentationMirror, reduce};
