//! Analysis run tracking: progress events and validated rule-set results
//! flow into the shared state as `ANALYSIS_STATE_UPDATE` messages.

use crate::domain::{AnalysisProgress, ProgressEvent, ProgressStage, RuleSet, ShapeError};
use crate::infra::progress::ProgressParser;
use crate::infra::validation::parse_rule_sets;
use crate::state::StateStore;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

#[derive(Clone)]
pub struct AnalysisTracker {
    store: Arc<StateStore>,
}

impl AnalysisTracker {
    pub fn new(store: Arc<StateStore>) -> Self {
        Self { store }
    }

    pub fn start(&self) {
        log::info!("analysis started");
        self.store.update_analysis(|analysis| {
            analysis.is_analyzing = true;
            analysis.last_error = None;
            analysis.progress = Some(AnalysisProgress {
                stage: ProgressStage::Init,
                message: None,
                percent: Some(0.0),
                updated_at: chrono::Utc::now().to_rfc3339(),
            });
        });
    }

    pub fn on_progress(&self, event: &ProgressEvent) {
        log::debug!(
            "analysis progress: {} {}",
            event.stage,
            event.message.as_deref().unwrap_or("")
        );
        let progress = AnalysisProgress {
            stage: event.stage,
            message: event.message.clone(),
            percent: event.effective_percent(),
            updated_at: event.timestamp.clone(),
        };
        self.store.update_analysis(|analysis| {
            analysis.progress = Some(progress);
        });
    }

    /// Accepts the analyzer's rule-set response. A malformed payload fails
    /// the run instead of replacing the previous results.
    pub fn complete(&self, payload: &Value) -> Result<usize, ShapeError> {
        let rule_sets = match parse_rule_sets(payload) {
            Ok(rule_sets) => rule_sets,
            Err(err) => {
                self.fail(format!("Malformed analysis results: {err}"));
                return Err(err);
            }
        };
        let incidents: usize = rule_sets.iter().map(RuleSet::incident_count).sum();
        log::info!(
            "analysis complete: {} rule sets, {incidents} incidents",
            rule_sets.len()
        );
        self.store.update_analysis(|analysis| {
            analysis.is_analyzing = false;
            analysis.rule_sets = rule_sets;
            analysis.progress = Some(AnalysisProgress {
                stage: ProgressStage::Complete,
                message: None,
                percent: Some(100.0),
                updated_at: chrono::Utc::now().to_rfc3339(),
            });
        });
        Ok(incidents)
    }

    pub fn fail(&self, message: impl Into<String>) {
        let message = message.into();
        log::warn!("analysis failed: {message}");
        self.store.update_analysis(|analysis| {
            analysis.is_analyzing = false;
            analysis.last_error = Some(message);
        });
    }

    /// Parser for an analyzer's diagnostic stream. Its callback only enqueues;
    /// a background task applies the events, so feeding never blocks on the
    /// state store.
    pub fn progress_parser(&self) -> (ProgressParser, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (ProgressParser::with_channel(tx), self.forward_progress(rx))
    }

    pub fn forward_progress(&self, mut rx: mpsc::UnboundedReceiver<ProgressEvent>) -> JoinHandle<()> {
        let tracker = self.clone();
        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                tracker.on_progress(&event);
            }
        })
    }
}
