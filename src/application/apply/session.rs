use crate::domain::{ApplyState, ApplyStatus, DiffBlock, DocumentError, FileDecorations};
use crate::infra::diff::{BlockSpan, LineDiff, character_edits};
use crate::infra::document::{DocumentHost, split_lines};

/// Identifiers the generation backend attaches to a stream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamMeta {
    pub stream_id: Option<String>,
    pub tool_call_id: Option<String>,
}

/// Outcome of merging a fresh diff into the materialized blocks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Reconciled {
    pub kept: usize,
    pub added: usize,
    pub removed: usize,
}

/// Everything the engine knows about the pending edit of one file.
///
/// `display` mirrors what the document holds while the session is live:
/// unchanged lines, removed lines still in place, then added lines.
#[derive(Debug, Clone)]
pub struct FileSession {
    pub file_uri: String,
    pub stream_token: String,
    pub original: Vec<String>,
    pub received: String,
    pub display: Vec<String>,
    pub blocks: Vec<DiffBlock>,
    pub state: ApplyState,
    /// Cleared by finalize. A closed session with an open stream swallows
    /// late chunks.
    pub stream_open: bool,
    pub last_hash: Option<u64>,
}

impl FileSession {
    pub fn new(file_uri: &str, original: &str, meta: StreamMeta) -> Self {
        let stream_token = meta
            .stream_id
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let original = split_lines(original);
        Self {
            file_uri: file_uri.to_string(),
            stream_token: stream_token.clone(),
            display: original.clone(),
            original,
            received: String::new(),
            blocks: Vec::new(),
            state: ApplyState {
                status: ApplyStatus::Streaming,
                diff_block_count: Some(0),
                file_content: None,
                file_path: Some(file_uri.to_string()),
                stream_id: Some(stream_token),
                tool_call_id: meta.tool_call_id,
            },
            stream_open: true,
            last_hash: None,
        }
    }

    pub fn status(&self) -> ApplyStatus {
        self.state.status
    }

    /// Closed with no stream left to swallow.
    pub fn is_idle(&self) -> bool {
        self.state.status == ApplyStatus::Closed && !self.stream_open
    }

    /// Lines received so far that are terminated by a newline.
    pub fn complete_lines(&self) -> Vec<String> {
        match self.received.rfind('\n') {
            Some(end) => split_lines(&self.received[..end]),
            None => Vec::new(),
        }
    }

    pub fn final_lines(&self) -> Vec<String> {
        split_lines(&self.received)
    }

    pub fn spans(&self) -> Vec<BlockSpan> {
        self.blocks
            .iter()
            .map(|block| BlockSpan {
                start_line: block.start_line,
                removed: block.removed_lines().to_vec(),
                added: block.added_lines().to_vec(),
            })
            .collect()
    }

    fn to_block(&self, span: BlockSpan) -> DiffBlock {
        DiffBlock {
            start_line: span.start_line,
            added_count: span.added.len(),
            removed_count: span.removed.len(),
            file_uri: self.file_uri.clone(),
            stream_token: self.stream_token.clone(),
            added_content: Some(span.added),
            removed_content: Some(span.removed),
            character_edits: None,
        }
    }

    /// Replaces the block sequence with `diff`, keeping previously
    /// materialized blocks whose boundaries did not move.
    pub fn reconcile(&mut self, diff: LineDiff) -> Reconciled {
        let previous = std::mem::take(&mut self.blocks);
        let mut stats = Reconciled::default();
        let mut blocks = Vec::with_capacity(diff.blocks.len());

        for span in diff.blocks {
            let fresh = self.to_block(span);
            match previous.iter().find(|block| block.same_boundaries(&fresh)) {
                Some(existing) => {
                    stats.kept += 1;
                    blocks.push(existing.clone());
                }
                None => {
                    stats.added += 1;
                    blocks.push(fresh);
                }
            }
        }
        stats.removed = previous
            .iter()
            .filter(|old| !blocks.iter().any(|block| block.same_boundaries(old)))
            .count();

        self.blocks = blocks;
        self.display = diff.display;
        self.state.diff_block_count = Some(self.blocks.len());
        stats
    }

    pub fn attach_character_edits(&mut self, max_inline_len: usize) {
        for block in &mut self.blocks {
            block.character_edits =
                character_edits(block.removed_lines(), block.added_lines(), max_inline_len);
        }
    }

    /// Moves every block after `index` up by `delta` lines.
    pub fn shift_after(&mut self, index: usize, delta: usize) {
        for block in self.blocks.iter_mut().skip(index + 1) {
            block.start_line -= delta;
        }
    }

    pub fn close(&mut self) {
        self.state.status = ApplyStatus::Closed;
        self.blocks.clear();
        self.state.diff_block_count = Some(0);
    }

    pub fn decorations(&self) -> FileDecorations {
        FileDecorations {
            apply_state: self.state.clone(),
            blocks: self.blocks.clone(),
        }
    }
}

/// Writes the smallest contiguous edit that turns `current` into `next`.
pub async fn write_lines(
    documents: &dyn DocumentHost,
    uri: &str,
    current: &[String],
    next: &[String],
) -> Result<(), DocumentError> {
    let prefix = current
        .iter()
        .zip(next)
        .take_while(|(a, b)| a == b)
        .count();
    let max_suffix = current.len().min(next.len()) - prefix;
    let suffix = current
        .iter()
        .rev()
        .zip(next.iter().rev())
        .take(max_suffix)
        .take_while(|(a, b)| a == b)
        .count();

    let delete_count = current.len() - prefix - suffix;
    let insert = next[prefix..next.len() - suffix].to_vec();
    if delete_count == 0 && insert.is_empty() {
        return Ok(());
    }
    documents
        .replace_lines(uri, prefix, delete_count, insert)
        .await
}
