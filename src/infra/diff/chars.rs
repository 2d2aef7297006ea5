use crate::domain::{DiffCharacterEdit, DiffLineKind};
use similar::{ChangeTag, TextDiff};

/// Pairs below this similarity are full rewrites; highlighting them is noise.
const MIN_SIMILARITY: f32 = 0.3;

fn should_do_inline(old: &str, new: &str, max_inline_len: usize) -> bool {
    old.len() <= max_inline_len && new.len() <= max_inline_len
}

/// Character-level edits for a block whose removed and added lines pair up
/// one-to-one. Returns `None` when the block has no such pairing.
pub fn character_edits(
    removed: &[String],
    added: &[String],
    max_inline_len: usize,
) -> Option<Vec<DiffCharacterEdit>> {
    if removed.is_empty() || removed.len() != added.len() {
        return None;
    }

    let mut edits = Vec::new();
    let mut original_base = 0usize;
    let mut revised_base = 0usize;

    for (line_idx, (old_line, new_line)) in removed.iter().zip(added).enumerate() {
        let diff = TextDiff::from_chars(old_line.as_str(), new_line.as_str());
        if should_do_inline(old_line, new_line, max_inline_len) && diff.ratio() > MIN_SIMILARITY {
            for change in diff.iter_all_changes() {
                let kind = match change.tag() {
                    ChangeTag::Equal => DiffLineKind::Unchanged,
                    ChangeTag::Delete => DiffLineKind::Removed,
                    ChangeTag::Insert => DiffLineKind::Added,
                };
                let old_offset = change.old_index();
                let new_offset = change.new_index();
                edits.push(DiffCharacterEdit {
                    kind,
                    character: change.value().to_string(),
                    original_index: old_offset.map(|offset| original_base + offset),
                    revised_index: new_offset.map(|offset| revised_base + offset),
                    original_line_index: old_offset.map(|_| line_idx),
                    revised_line_index: new_offset.map(|_| line_idx),
                    original_char_offset: old_offset,
                    revised_char_offset: new_offset,
                });
            }
        }
        original_base += old_line.chars().count() + 1;
        revised_base += new_line.chars().count() + 1;
    }

    (!edits.is_empty()).then_some(edits)
}
