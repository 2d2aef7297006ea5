//! Line-level diffing between original content and streamed replacement text.

use similar::{Algorithm, DiffTag, capture_diff_slices};
use std::cmp::Reverse;

/// Algorithms tried for every diff, in tie-break order.
pub const CANDIDATE_ALGORITHMS: [Algorithm; 3] =
    [Algorithm::Myers, Algorithm::Patience, Algorithm::Lcs];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffMode {
    /// Replacement text is a prefix of the final content. Original lines past
    /// the last matched line have not been reached yet and are left untouched.
    Streaming,
    /// Replacement text is complete.
    Final,
}

/// One changed region, positioned in the display document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockSpan {
    pub start_line: usize,
    pub removed: Vec<String>,
    pub added: Vec<String>,
}

/// Display document (original lines with removed lines kept in place and
/// added lines inserted after them) plus the blocks it contains.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineDiff {
    pub display: Vec<String>,
    pub blocks: Vec<BlockSpan>,
    pub algorithm: Algorithm,
}

impl LineDiff {
    pub fn changed_lines(&self) -> usize {
        self.blocks
            .iter()
            .map(|block| block.removed.len() + block.added.len())
            .sum()
    }

    /// Number of blocks that also appear, unchanged, in `previous`.
    pub fn preserved(&self, previous: &[BlockSpan]) -> usize {
        self.blocks
            .iter()
            .filter(|block| previous.contains(block))
            .count()
    }
}

#[derive(Default)]
struct DisplayBuilder {
    display: Vec<String>,
    blocks: Vec<BlockSpan>,
    removed: Vec<String>,
    added: Vec<String>,
}

impl DisplayBuilder {
    fn unchanged(&mut self, lines: &[String]) {
        self.flush();
        self.display.extend_from_slice(lines);
    }

    fn removed(&mut self, lines: &[String]) {
        self.removed.extend_from_slice(lines);
    }

    fn added(&mut self, lines: &[String]) {
        self.added.extend_from_slice(lines);
    }

    fn flush(&mut self) {
        if self.removed.is_empty() && self.added.is_empty() {
            return;
        }
        let start_line = self.display.len();
        self.display.extend(self.removed.iter().cloned());
        self.display.extend(self.added.iter().cloned());
        self.blocks.push(BlockSpan {
            start_line,
            removed: std::mem::take(&mut self.removed),
            added: std::mem::take(&mut self.added),
        });
    }

    fn finish(mut self, algorithm: Algorithm) -> LineDiff {
        self.flush();
        LineDiff {
            display: self.display,
            blocks: self.blocks,
            algorithm,
        }
    }
}

pub fn diff_lines(
    original: &[String],
    target: &[String],
    mode: DiffMode,
    algorithm: Algorithm,
) -> LineDiff {
    let ops: Vec<_> = capture_diff_slices(algorithm, original, target)
        .iter()
        .map(|op| op.as_tag_tuple())
        .collect();

    let frontier = match mode {
        DiffMode::Final => ops.len(),
        DiffMode::Streaming => ops
            .iter()
            .rposition(|(tag, _, _)| *tag == DiffTag::Equal)
            .map_or(0, |idx| idx + 1),
    };

    let mut builder = DisplayBuilder::default();
    for (tag, old, new) in &ops[..frontier] {
        match tag {
            DiffTag::Equal => builder.unchanged(&original[old.clone()]),
            DiffTag::Delete => builder.removed(&original[old.clone()]),
            DiffTag::Insert => builder.added(&target[new.clone()]),
            DiffTag::Replace => {
                builder.removed(&original[old.clone()]);
                builder.added(&target[new.clone()]);
            }
        }
    }

    if frontier < ops.len() {
        for (tag, _, new) in &ops[frontier..] {
            if matches!(tag, DiffTag::Insert | DiffTag::Replace) {
                builder.added(&target[new.clone()]);
            }
        }
        let resume = ops[..frontier].last().map_or(0, |(_, old, _)| old.end);
        builder.unchanged(&original[resume..]);
    }

    builder.finish(algorithm)
}

/// Diffs with every candidate algorithm and keeps the script that preserves the
/// most blocks from `previous`, then the one with the fewest changed lines,
/// then the earliest algorithm in [`CANDIDATE_ALGORITHMS`].
pub fn stable_diff(
    original: &[String],
    target: &[String],
    mode: DiffMode,
    previous: &[BlockSpan],
) -> LineDiff {
    CANDIDATE_ALGORITHMS
        .iter()
        .enumerate()
        .map(|(order, algorithm)| (order, diff_lines(original, target, mode, *algorithm)))
        .max_by_key(|(order, diff)| {
            (
                diff.preserved(previous),
                Reverse(diff.changed_lines()),
                Reverse(*order),
            )
        })
        .map(|(_, diff)| diff)
        .unwrap_or_else(|| diff_lines(original, target, mode, Algorithm::Myers))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(text: &str) -> Vec<String> {
        crate::infra::document::split_lines(text)
    }

    #[test]
    fn test_final_diff_single_replacement() {
        let diff = diff_lines(
            &lines("a\nb\nc"),
            &lines("a\nX\nc"),
            DiffMode::Final,
            Algorithm::Myers,
        );
        assert_eq!(diff.display, lines("a\nb\nX\nc"));
        assert_eq!(
            diff.blocks,
            vec![BlockSpan {
                start_line: 1,
                removed: vec!["b".into()],
                added: vec!["X".into()],
            }]
        );
    }

    #[test]
    fn test_streaming_leaves_unreached_original_untouched() {
        let original = lines("a\nb\nc");
        let streamed = vec!["a".to_string(), "X".to_string()];
        let diff = diff_lines(&original, &streamed, DiffMode::Streaming, Algorithm::Myers);

        assert_eq!(diff.display, lines("a\nX\nb\nc"));
        assert_eq!(diff.blocks.len(), 1);
        assert_eq!(diff.blocks[0].start_line, 1);
        assert!(diff.blocks[0].removed.is_empty());
        assert_eq!(diff.blocks[0].added, vec!["X".to_string()]);
    }

    #[test]
    fn test_streaming_with_nothing_received_is_identity() {
        let original = lines("a\nb");
        let diff = diff_lines(&original, &[], DiffMode::Streaming, Algorithm::Myers);
        assert_eq!(diff.display, original);
        assert!(diff.blocks.is_empty());
    }

    #[test]
    fn test_identical_content_has_no_blocks() {
        let text = lines("fn main() {\n}\n");
        let diff = stable_diff(&text, &text, DiffMode::Final, &[]);
        assert!(diff.blocks.is_empty());
        assert_eq!(diff.display, text);
    }

    #[test]
    fn test_stable_diff_prefers_previous_blocks_then_minimal() {
        let original = lines("a\nb\nc\nd");
        let target = lines("a\nc\nd\ne");
        let previous = diff_lines(&original, &target, DiffMode::Final, Algorithm::Patience);

        let chosen = stable_diff(&original, &target, DiffMode::Final, &previous.blocks);
        assert_eq!(chosen.preserved(&previous.blocks), previous.blocks.len());

        let minimal = CANDIDATE_ALGORITHMS
            .iter()
            .map(|alg| diff_lines(&original, &target, DiffMode::Final, *alg).changed_lines())
            .min()
            .unwrap();
        let fresh = stable_diff(&original, &target, DiffMode::Final, &[]);
        assert_eq!(fresh.changed_lines(), minimal);
    }
}
