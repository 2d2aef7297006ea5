use super::session::{FileSession, StreamMeta, write_lines};
use super::{ApplyOptions, DiffManager, SessionGuard};
use crate::domain::{ApplyState, ApplyStatus, DiffBlock, DiffError};
use crate::infra::diff::{DiffMode, stable_diff};
use crate::infra::document::join_lines;
use crate::infra::hash::hash_lines;

impl DiffManager {
    /// Opens a stream for `file_uri` with backend-provided identifiers.
    ///
    /// A previous diff that is still awaiting review blocks a new stream.
    pub async fn begin_stream(
        &self,
        file_uri: &str,
        original: &str,
        meta: StreamMeta,
    ) -> Result<ApplyState, DiffError> {
        let mut guard = self.lock_file(file_uri).await;
        self.start_session(&mut guard, file_uri, original, meta)
            .await
    }

    /// Feeds one chunk of replacement text. Opens a stream implicitly when
    /// none is active. Chunks for an aborted stream are discarded until the
    /// stream is finalized or a new one begins.
    pub async fn apply_chunk(
        &self,
        file_uri: &str,
        original: &str,
        chunk: &str,
    ) -> Result<ApplyState, DiffError> {
        let mut guard = self.lock_file(file_uri).await;
        let needs_session = match guard.as_ref() {
            None => true,
            Some(session) => session.is_idle(),
        };
        if needs_session {
            self.start_session(&mut guard, file_uri, original, StreamMeta::default())
                .await?;
        }
        let Some(session) = guard.as_mut() else {
            return Err(DiffError::NoActiveDiff(file_uri.to_string()));
        };

        match session.status() {
            ApplyStatus::Closed => {
                log::debug!("discarding chunk for closed diff {file_uri}");
                return Ok(session.state.clone());
            }
            ApplyStatus::Done => return Err(DiffError::ReviewPending(file_uri.to_string())),
            ApplyStatus::Streaming => {}
        }

        session.received.push_str(chunk);
        let complete = session.complete_lines();
        let hash = hash_lines(&complete);
        if session.last_hash == Some(hash) {
            self.publish(session);
            return Ok(session.state.clone());
        }
        session.last_hash = Some(hash);

        let previous_display = session.display.clone();
        let diff = stable_diff(
            &session.original,
            &complete,
            DiffMode::Streaming,
            &session.spans(),
        );
        let algorithm = diff.algorithm;
        let stats = session.reconcile(diff);
        log::trace!(
            "{file_uri}: {algorithm:?} diff kept {} added {} removed {} blocks",
            stats.kept,
            stats.added,
            stats.removed
        );

        if let Err(err) = write_lines(
            self.documents.as_ref(),
            file_uri,
            &previous_display,
            &session.display,
        )
        .await
        {
            log::warn!("document unavailable while streaming into {file_uri}: {err}");
            session.close();
        }
        self.publish(session);
        Ok(session.state.clone())
    }

    /// Ends the stream and freezes the block sequence for review. A diff with
    /// no blocks closes immediately.
    pub async fn finalize(&self, file_uri: &str) -> Result<ApplyState, DiffError> {
        let mut guard = self.lock_file(file_uri).await;
        let Some(session) = guard.as_mut() else {
            return Err(DiffError::NoActiveDiff(file_uri.to_string()));
        };
        if session.status() != ApplyStatus::Streaming {
            session.stream_open = false;
            return Ok(session.state.clone());
        }

        let target = session.final_lines();
        let previous_display = session.display.clone();
        let diff = stable_diff(&session.original, &target, DiffMode::Final, &session.spans());
        session.reconcile(diff);
        session.stream_open = false;
        if self.options.inline_char_edits {
            session.attach_character_edits(self.options.max_inline_len);
        }

        if let Err(err) = write_lines(
            self.documents.as_ref(),
            file_uri,
            &previous_display,
            &session.display,
        )
        .await
        {
            log::warn!("document unavailable while finalizing {file_uri}: {err}");
            session.close();
            self.publish(session);
            return Ok(session.state.clone());
        }

        session.state.file_content = Some(join_lines(&target));
        if session.blocks.is_empty() {
            session.close();
        } else {
            session.state.status = ApplyStatus::Done;
        }
        log::info!(
            "{file_uri}: stream finished with {} pending blocks",
            session.blocks.len()
        );
        self.publish(session);
        Ok(session.state.clone())
    }

    /// Closes the diff without touching the document. Safe to repeat.
    ///
    /// The stream stays open so chunks still in flight are swallowed.
    pub async fn abort(&self, file_uri: &str) -> Option<ApplyState> {
        let mut guard = self.lock_file(file_uri).await;
        let session = guard.as_mut()?;
        if session.status() != ApplyStatus::Closed {
            log::info!("{file_uri}: diff aborted");
            session.close();
            self.publish(session);
        }
        Some(session.state.clone())
    }

    pub async fn apply_state(&self, file_uri: &str) -> Option<ApplyState> {
        let guard = self.lock_file(file_uri).await;
        guard.as_ref().map(|session| session.state.clone())
    }

    /// Pending blocks, in document order.
    pub async fn blocks(&self, file_uri: &str) -> Vec<DiffBlock> {
        let guard = self.lock_file(file_uri).await;
        guard
            .as_ref()
            .map(|session| session.blocks.clone())
            .unwrap_or_default()
    }

    async fn start_session(
        &self,
        guard: &mut SessionGuard,
        file_uri: &str,
        original: &str,
        meta: StreamMeta,
    ) -> Result<ApplyState, DiffError> {
        if let Some(existing) = guard.as_ref() {
            match existing.status() {
                ApplyStatus::Done => return Err(DiffError::ReviewPending(file_uri.to_string())),
                ApplyStatus::Streaming => {
                    return Err(DiffError::StillStreaming(file_uri.to_string()));
                }
                ApplyStatus::Closed => {}
            }
        }

        let mut session = FileSession::new(file_uri, original, meta);
        match self.documents.read_lines(file_uri).await {
            Ok(lines) if lines != session.original => {
                log::warn!("{file_uri}: document differs from the stream's original content");
                return Err(DiffError::OriginalMismatch(file_uri.to_string()));
            }
            Ok(_) => {}
            Err(err) => {
                log::warn!("cannot stream into {file_uri}: {err}");
                session.close();
            }
        }
        log::debug!("{file_uri}: stream {} opened", session.stream_token);
        self.publish(&session);
        let state = session.state.clone();
        **guard = Some(session);
        Ok(state)
    }
}

impl ApplyOptions {
    pub fn from_config(config: &crate::infra::app_config::AppConfig) -> Self {
        Self {
            inline_char_edits: config.inline_char_edits,
            max_inline_len: config.max_inline_len,
            ..Self::default()
        }
    }
}
