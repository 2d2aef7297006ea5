//! Domain types for patchwise.
//! Plain data shared by the apply engine, the state store and the sync protocol.

pub mod analysis;
pub mod chat;
pub mod diff;
pub mod error;
pub mod profile;
pub mod progress;
pub mod solution;

pub use analysis::*;
pub use chat::*;
pub use diff::*;
pub use error::*;
pub use profile::*;
pub use progress::*;
pub use solution::*;

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_progress_stage_display_parse() {
        assert_eq!(ProgressStage::RuleExecution.to_string(), "rule_execution");
        assert_eq!(
            ProgressStage::from_str("dependency_analysis").unwrap(),
            ProgressStage::DependencyAnalysis
        );
        assert!(ProgressStage::from_str("bogus").is_err());
    }

    #[test]
    fn test_apply_status_display_parse() {
        assert_eq!(ApplyStatus::Closed.to_string(), "closed");
        assert_eq!(ApplyStatus::from_str("DONE").unwrap(), ApplyStatus::Done);
        assert!(ApplyStatus::from_str("open").is_err());
    }

    #[test]
    fn test_diff_block_serializes_camel_case() {
        let block = DiffBlock {
            start_line: 1,
            added_count: 1,
            removed_count: 1,
            file_uri: "file:///a.rs".into(),
            stream_token: "s1".into(),
            added_content: Some(vec!["X".into()]),
            removed_content: Some(vec!["b".into()]),
            character_edits: None,
        };
        let value = serde_json::to_value(&block).unwrap();
        assert_eq!(value["startLine"], 1);
        assert_eq!(value["addedContent"][0], "X");
        assert!(value.get("characterEdits").is_none());
        assert_eq!(block.span(), 2);
        assert_eq!(block.lines()[0].kind, DiffLineKind::Removed);
    }

    #[test]
    fn test_chat_content_dispatch() {
        let mut text = ChatContent::Markdown("**hi**".into());
        assert!(text.append_delta(" there"));
        assert_eq!(text.render_plain(), "**hi** there");
        assert_eq!(text.kind(), "markdown");

        let mut json = ChatContent::Json(serde_json::json!({"a": 1}));
        assert!(!json.append_delta("x"));
        assert!(json.render_plain().contains("\"a\": 1"));
    }

    #[test]
    fn test_effective_percent_from_counts() {
        let event = ProgressEvent {
            timestamp: "t".into(),
            stage: ProgressStage::RuleExecution,
            message: None,
            current: Some(1),
            total: Some(4),
            percent: None,
            metadata: None,
        };
        assert_eq!(event.effective_percent(), Some(25.0));
    }
}
