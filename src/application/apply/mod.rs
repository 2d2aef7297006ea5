//! Streaming diff application and block review.
//!
//! `DiffManager` owns one session per file. Every operation on a file takes
//! that file's async lock for its whole duration, document I/O included, so
//! chunks and review actions on the same file never interleave. Different
//! files proceed independently.
//!
//! Idle slots (closed, stream ended, nobody waiting) are pruned once the
//! session map reaches `ApplyOptions::max_idle_sessions`.

mod engine;
mod review;
pub mod session;


pub use session::{FileSession, StreamMeta};

use crate::infra::app_config::DEFAULT_MAX_INLINE_LEN;
use crate::infra::document::DocumentHost;
use crate::state::StateStore;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

type SessionSlot = Arc<tokio::sync::Mutex<Option<FileSession>>>;
type SessionGuard = tokio::sync::OwnedMutexGuard<Option<FileSession>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApplyOptions {
    pub inline_char_edits: bool,
    pub max_inline_len: usize,
    pub max_idle_sessions: usize,
}

const DEFAULT_MAX_IDLE_SESSIONS: usize = 256;

impl Default for ApplyOptions {
    fn default() -> Self {
        Self {
            inline_char_edits: true,
            max_inline_len: DEFAULT_MAX_INLINE_LEN,
            max_idle_sessions: DEFAULT_MAX_IDLE_SESSIONS,
        }
    }
}

pub struct DiffManager {
    documents: Arc<dyn DocumentHost>,
    store: Arc<StateStore>,
    options: ApplyOptions,
    sessions: Mutex<HashMap<String, SessionSlot>>,
}

impl DiffManager {
    pub fn new(documents: Arc<dyn DocumentHost>, store: Arc<StateStore>) -> Self {
        Self {
            documents,
            store,
            options: ApplyOptions::default(),
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_options(mut self, options: ApplyOptions) -> Self {
        self.options = options;
        self
    }

    fn slot(&self, file_uri: &str) -> SessionSlot {
        let mut sessions = self.sessions.lock();
        if let Some(slot) = sessions.get(file_uri) {
            return slot.clone();
        }
        if sessions.len() >= self.options.max_idle_sessions {
            prune_idle(&mut sessions);
        }
        sessions.entry(file_uri.to_string()).or_default().clone()
    }

    async fn lock_file(&self, file_uri: &str) -> SessionGuard {
        self.slot(file_uri).lock_owned().await
    }

    fn publish(&self, session: &FileSession) {
        self.store
            .set_decorations(&session.file_uri, session.decorations());
    }
}

/// Drops slots only the map references whose session is absent or idle.
/// New references are handed out under the map lock, so a count of one
/// means no caller holds or awaits the slot.
fn prune_idle(sessions: &mut HashMap<String, SessionSlot>) {
    let before = sessions.len();
    sessions.retain(|_, slot| {
        if Arc::strong_count(slot) > 1 {
            return true;
        }
        match slot.try_lock() {
            Ok(guard) => guard.as_ref().is_some_and(|session| !session.is_idle()),
            Err(_) => true,
        }
    });
    log::debug!("pruned {} idle diff sessions", before - sessions.len());
}
