//! Diff computation used by the apply engine.
//!
//! `lines` produces the display document and reviewable blocks; `chars`
//! adds intra-line highlighting for finished blocks.

pub mod chars;
pub mod lines;

pub use chars::character_edits;
pub use lines::{BlockSpan, DiffMode, LineDiff, stable_diff};
