use super::progress::ProgressStage;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single location where a rule matched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Incident {
    pub uri: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_number: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_snip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variables: Option<serde_json::Map<String, serde_json::Value>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Violation {
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub incidents: Vec<Incident>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effort: Option<u64>,
}

/// Results of one rule set as reported by the analyzer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct RuleSet {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub violations: BTreeMap<String, Violation>,
    #[serde(default)]
    pub insights: BTreeMap<String, Violation>,
    #[serde(default)]
    pub errors: BTreeMap<String, String>,
    #[serde(default)]
    pub unmatched: Vec<String>,
    #[serde(default)]
    pub skipped: Vec<String>,
}

impl RuleSet {
    pub fn incident_count(&self) -> usize {
        self.violations
            .values()
            .map(|violation| violation.incidents.len())
            .sum()
    }
}

/// Latest progress report of a running analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisProgress {
    pub stage: ProgressStage,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percent: Option<f64>,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisState {
    pub is_analyzing: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<AnalysisProgress>,
    #[serde(default)]
    pub rule_sets: Vec<RuleSet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

/// Lifecycle of the analyzer server process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum ServerState {
    #[default]
    Initial,
    Starting,
    Initializing,
    Running,
    StartFailed,
    Stopping,
    Stopped,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ServerStatus {
    pub server_state: ServerState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}
