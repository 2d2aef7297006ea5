use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffLineKind {
    Added,
    Removed,
    Unchanged,
}

/// Atomic unit of a diff block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffLine {
    pub kind: DiffLineKind,
    pub text: String,
}

/// Character-level edit used for intra-line highlighting only.
///
/// Index fields are populated on the side where the character exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffCharacterEdit {
    pub kind: DiffLineKind,
    pub character: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revised_index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_line_index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revised_line_index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_char_offset: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revised_char_offset: Option<usize>,
}

/// A reviewable run of changed lines within one file.
///
/// `start_line` indexes the current document, where the removed lines are
/// still present (marked for deletion) and immediately followed by the added
/// lines. The block spans `removed_count + added_count` document lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffBlock {
    pub start_line: usize,
    pub added_count: usize,
    pub removed_count: usize,
    pub file_uri: String,
    pub stream_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub added_content: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub removed_content: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub character_edits: Option<Vec<DiffCharacterEdit>>,
}

impl DiffBlock {
    pub fn added_lines(&self) -> &[String] {
        self.added_content.as_deref().unwrap_or_default()
    }

    pub fn removed_lines(&self) -> &[String] {
        self.removed_content.as_deref().unwrap_or_default()
    }

    /// Number of document lines the block occupies.
    pub fn span(&self) -> usize {
        self.added_count + self.removed_count
    }

    /// Line-by-line view of the block as shown in the document.
    pub fn lines(&self) -> Vec<DiffLine> {
        let removed = self.removed_lines().iter().map(|text| DiffLine {
            kind: DiffLineKind::Removed,
            text: text.clone(),
        });
        let added = self.added_lines().iter().map(|text| DiffLine {
            kind: DiffLineKind::Added,
            text: text.clone(),
        });
        removed.chain(added).collect()
    }

    /// Two blocks are the same reviewable unit when they sit at the same line
    /// and carry the same content; identity fields are ignored.
    pub fn same_boundaries(&self, other: &DiffBlock) -> bool {
        self.start_line == other.start_line
            && self.removed_lines() == other.removed_lines()
            && self.added_lines() == other.added_lines()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ApplyStatus {
    #[default]
    Streaming,
    Done,
    Closed,
}

impl fmt::Display for ApplyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ApplyStatus::Streaming => "streaming",
            ApplyStatus::Done => "done",
            ApplyStatus::Closed => "closed",
        };
        write!(f, "{s}")
    }
}

impl FromStr for ApplyStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "streaming" => Ok(ApplyStatus::Streaming),
            "done" => Ok(ApplyStatus::Done),
            "closed" => Ok(ApplyStatus::Closed),
            other => Err(format!("unknown apply status: {other}")),
        }
    }
}

/// Per-file lifecycle of a streamed edit: `streaming -> done -> closed`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ApplyState {
    pub status: ApplyStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diff_block_count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl ApplyState {
    pub fn is_closed(&self) -> bool {
        self.status == ApplyStatus::Closed
    }
}

/// Apply state and pending blocks for one file, as decorated in the editor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct FileDecorations {
    pub apply_state: ApplyState,
    #[serde(default)]
    pub blocks: Vec<DiffBlock>,
}
