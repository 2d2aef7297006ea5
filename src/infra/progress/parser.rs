use crate::domain::ProgressEvent;
use tokio::sync::mpsc::UnboundedSender;

type ProgressCallback = Box<dyn FnMut(ProgressEvent) + Send>;

/// Decodes newline-delimited progress events from a channel that is shared
/// with unstructured log output.
///
/// Bytes after the last newline are carried over to the next chunk, so events
/// split across reads (including split UTF-8 sequences) decode correctly.
/// Lines that are not a valid [`ProgressEvent`] are dropped.
pub struct ProgressParser {
    buffer: Vec<u8>,
    callback: ProgressCallback,
    delivered: u64,
    dropped: u64,
}

impl ProgressParser {
    pub fn new(callback: impl FnMut(ProgressEvent) + Send + 'static) -> Self {
        Self {
            buffer: Vec::new(),
            callback: Box::new(callback),
            delivered: 0,
            dropped: 0,
        }
    }

    /// Parser whose callback only enqueues, keeping the producer unblocked.
    pub fn with_channel(tx: UnboundedSender<ProgressEvent>) -> Self {
        Self::new(move |event| {
            if tx.send(event).is_err() {
                log::debug!("progress receiver dropped; discarding event");
            }
        })
    }

    pub fn feed(&mut self, chunk: &str) {
        self.feed_bytes(chunk.as_bytes());
    }

    pub fn feed_bytes(&mut self, chunk: &[u8]) {
        self.buffer.extend_from_slice(chunk);
        let Some(last_newline) = self.buffer.iter().rposition(|b| *b == b'\n') else {
            return;
        };
        let rest = self.buffer.split_off(last_newline + 1);
        let complete = std::mem::replace(&mut self.buffer, rest);
        for line in complete.split(|b| *b == b'\n') {
            self.handle_line(line);
        }
    }

    /// Parses whatever remains in the buffer as a final line. Call at end of stream.
    pub fn flush(&mut self) {
        let remaining = std::mem::take(&mut self.buffer);
        self.handle_line(&remaining);
    }

    pub fn pending_len(&self) -> usize {
        self.buffer.len()
    }

    pub fn delivered(&self) -> u64 {
        self.delivered
    }

    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    fn handle_line(&mut self, raw: &[u8]) {
        let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
        let Ok(line) = std::str::from_utf8(raw) else {
            self.dropped += 1;
            return;
        };
        let line = line.trim();
        if line.is_empty() {
            return;
        }
        match parse_progress_line(line) {
            Some(event) => {
                self.delivered += 1;
                (self.callback)(event);
            }
            None => self.dropped += 1,
        }
    }
}

/// Parses one line; `None` for plain log text or objects that do not carry a
/// string `timestamp` and a known `stage`.
pub fn parse_progress_line(line: &str) -> Option<ProgressEvent> {
    if !line.starts_with('{') {
        return None;
    }
    serde_json::from_str::<ProgressEvent>(line).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ProgressStage;
    use std::sync::{Arc, Mutex};

    fn collecting_parser() -> (ProgressParser, Arc<Mutex<Vec<ProgressEvent>>>) {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        let parser = ProgressParser::new(move |event| sink.lock().unwrap().push(event));
        (parser, events)
    }

    #[test]
    fn test_parses_rule_execution_line() {
        let event =
            parse_progress_line(r#"{"timestamp":"t","stage":"rule_execution","current":3,"total":10}"#)
                .unwrap();
        assert_eq!(event.timestamp, "t");
        assert_eq!(event.stage, ProgressStage::RuleExecution);
        assert_eq!(event.current, Some(3));
        assert_eq!(event.total, Some(10));
        assert_eq!(event.message, None);
        assert_eq!(event.percent, None);
    }

    #[test]
    fn test_drops_unknown_stage_and_plain_text() {
        assert!(parse_progress_line(r#"{"timestamp":"t","stage":"bogus"}"#).is_none());
        assert!(parse_progress_line("plain log text").is_none());
        assert!(parse_progress_line(r#"{"stage":"init"}"#).is_none());
        assert!(parse_progress_line(r#"{"timestamp":5,"stage":"init"}"#).is_none());
    }

    #[test]
    fn test_keeps_metadata_and_ignores_extra_fields() {
        let event = parse_progress_line(
            r#"{"timestamp":"t","stage":"complete","metadata":{"rules":4},"extra":true}"#,
        )
        .unwrap();
        assert_eq!(event.metadata.unwrap()["rules"], 4);
    }

    #[test]
    fn test_line_split_across_chunks() {
        let (mut parser, events) = collecting_parser();
        parser.feed(r#"{"timestamp":"t1","sta"#);
        assert!(events.lock().unwrap().is_empty());
        parser.feed("ge\":\"init\"}\nlog line\r\n{\"timestamp\":\"t2\",\"stage\":\"complete\"}");
        assert_eq!(events.lock().unwrap().len(), 1);
        parser.flush();

        let events = events.lock().unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].stage, ProgressStage::Complete);
        assert_eq!(parser.dropped(), 1);
        assert_eq!(parser.pending_len(), 0);
    }

    #[test]
    fn test_utf8_sequence_split_across_chunks() {
        let (mut parser, events) = collecting_parser();
        let line = "{\"timestamp\":\"t\",\"stage\":\"init\",\"message\":\"d\u{e9}marrage\"}\n";
        let bytes = line.as_bytes();
        let split = line.find('\u{e9}').unwrap() + 1;
        parser.feed_bytes(&bytes[..split]);
        parser.feed_bytes(&bytes[split..]);

        let events = events.lock().unwrap();
        assert_eq!(events[0].message.as_deref(), Some("d\u{e9}marrage"));
    }

    #[tokio::test]
    async fn test_channel_handoff() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let mut parser = ProgressParser::with_channel(tx);
        parser.feed("{\"timestamp\":\"t\",\"stage\":\"provider_init\"}\n");
        let event = rx.recv().await.unwrap();
        assert_eq!(event.stage, ProgressStage::ProviderInit);
    }
}
