//! Integration tests for progress stream decoding.

use patchwise::domain::{ProgressEvent, ProgressStage};
use patchwise::infra::progress::{ProgressParser, monitor_progress};
use std::sync::{Arc, Mutex};
use tokio::io::AsyncWriteExt;

const STREAM: &str = concat!(
    "starting analyzer v1.2\n",
    "{\"timestamp\":\"2024-01-01T00:00:00Z\",\"stage\":\"init\",\"message\":\"booting\"}\n",
    "{\"timestamp\":\"t\",\"stage\":\"provider_init\",\"metadata\":{\"provider\":\"java\"}}\r\n",
    "{\"timestamp\":\"t\",\"stage\":\"bogus\"}\n",
    "plain log text\n",
    "{\"timestamp\":\"t\",\"stage\":\"rule_execution\",\"current\":3,\"total\":10}\n",
    "{\"stage\":\"rule_parsing\"}\n",
    "\n",
    "{\"timestamp\":\"t\",\"stage\":\"dependency_analysis\",\"message\":\"résolution ✓\"}\n",
    "{\"timestamp\":\"t\",\"stage\":\"complete\",\"percent\":100}\n",
);

fn collecting_parser() -> (ProgressParser, Arc<Mutex<Vec<ProgressEvent>>>) {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    let parser = ProgressParser::new(move |event| sink.lock().unwrap().push(event));
    (parser, events)
}

fn parse_in_chunks(bytes: &[u8], size: usize) -> Vec<ProgressEvent> {
    let (mut parser, events) = collecting_parser();
    for chunk in bytes.chunks(size) {
        parser.feed_bytes(chunk);
    }
    parser.flush();
    let collected = events.lock().unwrap().clone();
    collected
}

#[test]
fn test_chunk_boundaries_do_not_change_events() {
    let whole = parse_in_chunks(STREAM.as_bytes(), STREAM.len());
    let stages: Vec<_> = whole.iter().map(|event| event.stage).collect();
    assert_eq!(
        stages,
        vec![
            ProgressStage::Init,
            ProgressStage::ProviderInit,
            ProgressStage::RuleExecution,
            ProgressStage::DependencyAnalysis,
            ProgressStage::Complete,
        ]
    );
    assert_eq!(whole[2].current, Some(3));
    assert_eq!(whole[2].total, Some(10));
    assert_eq!(whole[3].message.as_deref(), Some("résolution ✓"));

    for size in 1..=17 {
        assert_eq!(
            parse_in_chunks(STREAM.as_bytes(), size),
            whole,
            "chunk size {size}"
        );
    }
}

#[test]
fn test_unterminated_last_line_needs_flush() {
    let (mut parser, events) = collecting_parser();
    parser.feed("{\"timestamp\":\"t\",\"stage\":\"complete\"}");
    assert!(events.lock().unwrap().is_empty());
    assert!(parser.pending_len() > 0);

    parser.flush();
    assert_eq!(events.lock().unwrap().len(), 1);
    assert_eq!(parser.pending_len(), 0);
}

#[tokio::test]
async fn test_monitor_reads_until_eof() {
    let (mut writer, reader) = tokio::io::duplex(16);
    let feeder = tokio::spawn(async move {
        for piece in STREAM.as_bytes().chunks(5) {
            writer.write_all(piece).await.unwrap();
        }
    });

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let parser = monitor_progress(reader, ProgressParser::with_channel(tx), None)
        .await
        .unwrap();
    feeder.await.unwrap();

    assert_eq!(parser.delivered(), 5);
    drop(parser);
    let mut stages = Vec::new();
    while let Some(event) = rx.recv().await {
        stages.push(event.stage);
    }
    assert_eq!(stages.first(), Some(&ProgressStage::Init));
    assert_eq!(stages.last(), Some(&ProgressStage::Complete));
}
