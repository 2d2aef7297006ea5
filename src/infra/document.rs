//! Access to live editor documents.
//!
//! Documents are addressed by URI and edited as line sequences. Reading and
//! writing are the only suspending operations in the apply pipeline.

use crate::domain::DocumentError;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;

/// Splits text into document lines. `lines.join("\n")` restores the input exactly.
pub fn split_lines(text: &str) -> Vec<String> {
    text.split('\n').map(str::to_string).collect()
}

pub fn join_lines(lines: &[String]) -> String {
    lines.join("\n")
}

#[async_trait]
pub trait DocumentHost: Send + Sync {
    /// Current lines of an open document.
    async fn read_lines(&self, uri: &str) -> Result<Vec<String>, DocumentError>;

    /// Replaces `delete_count` lines starting at `start` with `lines` in one edit.
    async fn replace_lines(
        &self,
        uri: &str,
        start: usize,
        delete_count: usize,
        lines: Vec<String>,
    ) -> Result<(), DocumentError>;
}

/// Document host backed by memory; used by the CLI and tests.
#[derive(Default)]
pub struct InMemoryDocuments {
    docs: RwLock<HashMap<String, Vec<String>>>,
}

impl InMemoryDocuments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&self, uri: impl Into<String>, text: &str) {
        self.docs.write().insert(uri.into(), split_lines(text));
    }

    pub fn close(&self, uri: &str) -> bool {
        self.docs.write().remove(uri).is_some()
    }

    pub fn text(&self, uri: &str) -> Option<String> {
        self.docs.read().get(uri).map(|lines| join_lines(lines))
    }
}

#[async_trait]
impl DocumentHost for InMemoryDocuments {
    async fn read_lines(&self, uri: &str) -> Result<Vec<String>, DocumentError> {
        self.docs
            .read()
            .get(uri)
            .cloned()
            .ok_or_else(|| DocumentError::NotOpen(uri.to_string()))
    }

    async fn replace_lines(
        &self,
        uri: &str,
        start: usize,
        delete_count: usize,
        lines: Vec<String>,
    ) -> Result<(), DocumentError> {
        let mut docs = self.docs.write();
        let doc = docs
            .get_mut(uri)
            .ok_or_else(|| DocumentError::NotOpen(uri.to_string()))?;
        if start + delete_count > doc.len() {
            return Err(DocumentError::OutOfRange {
                uri: uri.to_string(),
                start,
                len: delete_count,
            });
        }
        doc.splice(start..start + delete_count, lines);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_join_roundtrip() {
        for text in ["", "a", "a\nb", "a\nb\n", "\n\n"] {
            assert_eq!(join_lines(&split_lines(text)), text);
        }
    }

    #[tokio::test]
    async fn test_replace_lines_and_close() {
        let docs = InMemoryDocuments::new();
        docs.open("mem://a", "a\nb\nc");

        docs.replace_lines("mem://a", 1, 1, vec!["X".into(), "Y".into()])
            .await
            .unwrap();
        assert_eq!(docs.text("mem://a").as_deref(), Some("a\nX\nY\nc"));

        let err = docs
            .replace_lines("mem://a", 3, 5, vec![])
            .await
            .unwrap_err();
        assert!(matches!(err, DocumentError::OutOfRange { .. }));

        assert!(docs.close("mem://a"));
        let err = docs.read_lines("mem://a").await.unwrap_err();
        assert_eq!(err, DocumentError::NotOpen("mem://a".into()));
    }
}
