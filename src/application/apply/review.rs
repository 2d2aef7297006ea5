use super::DiffManager;
use super::session::{FileSession, write_lines};
use crate::domain::{ApplyState, ApplyStatus, DiffError, DocumentError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Resolution {
    Accept,
    Reject,
}

fn reviewable<'a>(
    session: Option<&'a mut FileSession>,
    file_uri: &str,
) -> Result<&'a mut FileSession, DiffError> {
    let session = session.ok_or_else(|| DiffError::NoActiveDiff(file_uri.to_string()))?;
    match session.status() {
        ApplyStatus::Closed => Err(DiffError::AlreadyResolved(file_uri.to_string())),
        ApplyStatus::Streaming => Err(DiffError::StillStreaming(file_uri.to_string())),
        ApplyStatus::Done => Ok(session),
    }
}

/// Display lines once every pending block is resolved the same way.
fn resolve_display(session: &FileSession, resolution: Resolution) -> Vec<String> {
    let mut next = Vec::with_capacity(session.display.len());
    let mut cursor = 0;
    for block in &session.blocks {
        next.extend_from_slice(&session.display[cursor..block.start_line]);
        match resolution {
            Resolution::Accept => next.extend_from_slice(block.added_lines()),
            Resolution::Reject => next.extend_from_slice(block.removed_lines()),
        }
        cursor = block.start_line + block.span();
    }
    next.extend_from_slice(&session.display[cursor..]);
    next
}

impl DiffManager {
    /// Keeps the block's added lines and drops its removed lines.
    pub async fn accept_block(&self, file_uri: &str, index: usize) -> Result<ApplyState, DiffError> {
        self.resolve_block(file_uri, index, Resolution::Accept).await
    }

    /// Restores the block's removed lines and drops its added lines.
    pub async fn reject_block(&self, file_uri: &str, index: usize) -> Result<ApplyState, DiffError> {
        self.resolve_block(file_uri, index, Resolution::Reject).await
    }

    pub async fn accept_all(&self, file_uri: &str) -> Result<ApplyState, DiffError> {
        self.resolve_all(file_uri, Resolution::Accept).await
    }

    pub async fn reject_all(&self, file_uri: &str) -> Result<ApplyState, DiffError> {
        self.resolve_all(file_uri, Resolution::Reject).await
    }

    async fn resolve_block(
        &self,
        file_uri: &str,
        index: usize,
        resolution: Resolution,
    ) -> Result<ApplyState, DiffError> {
        let mut guard = self.lock_file(file_uri).await;
        let session = reviewable(guard.as_mut(), file_uri)?;
        let Some(block) = session.blocks.get(index) else {
            return Err(DiffError::InvalidBlockIndex {
                file_uri: file_uri.to_string(),
                index,
                len: session.blocks.len(),
            });
        };

        let (delete_at, delete_count) = match resolution {
            Resolution::Accept => (block.start_line, block.removed_count),
            Resolution::Reject => (block.start_line + block.removed_count, block.added_count),
        };
        let written = if delete_count > 0 {
            self.documents
                .replace_lines(file_uri, delete_at, delete_count, Vec::new())
                .await
        } else {
            Ok(())
        };
        if let Err(err) = written {
            return Err(self.fail_closed(session, err));
        }

        session.display.drain(delete_at..delete_at + delete_count);
        session.shift_after(index, delete_count);
        session.blocks.remove(index);
        session.state.diff_block_count = Some(session.blocks.len());
        log::debug!("{file_uri}: block {index} {resolution:?}ed");
        if session.blocks.is_empty() {
            log::info!("{file_uri}: all blocks resolved");
            session.close();
        }
        self.publish(session);
        Ok(session.state.clone())
    }

    /// Resolves every pending block with one document edit.
    async fn resolve_all(
        &self,
        file_uri: &str,
        resolution: Resolution,
    ) -> Result<ApplyState, DiffError> {
        let mut guard = self.lock_file(file_uri).await;
        let session = reviewable(guard.as_mut(), file_uri)?;

        let next = resolve_display(session, resolution);
        if let Err(err) = write_lines(self.documents.as_ref(), file_uri, &session.display, &next).await
        {
            return Err(self.fail_closed(session, err));
        }

        log::info!(
            "{file_uri}: {resolution:?}ed all {} blocks",
            session.blocks.len()
        );
        session.display = next;
        session.close();
        self.publish(session);
        Ok(session.state.clone())
    }

    fn fail_closed(&self, session: &mut FileSession, err: DocumentError) -> DiffError {
        log::warn!("closing diff for {}: {err}", session.file_uri);
        session.close();
        self.publish(session);
        DiffError::DocumentUnavailable(session.file_uri.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::apply::StreamMeta;
    use crate::infra::diff::{DiffMode, stable_diff};
    use crate::infra::document::split_lines;

    #[test]
    fn test_resolve_display_round_trip() {
        let mut session = FileSession::new("mem://a", "a\nb\nc\nd", StreamMeta::default());
        let diff = stable_diff(
            &session.original,
            &split_lines("a\nX\nc\nd\ne"),
            DiffMode::Final,
            &[],
        );
        session.reconcile(diff);

        assert_eq!(
            resolve_display(&session, Resolution::Accept),
            split_lines("a\nX\nc\nd\ne")
        );
        assert_eq!(
            resolve_display(&session, Resolution::Reject),
            split_lines("a\nb\nc\nd")
        );
    }
}
