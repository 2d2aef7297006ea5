use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Fixed set of stages an analysis process reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStage {
    Init,
    ProviderInit,
    RuleParsing,
    RuleExecution,
    DependencyAnalysis,
    Complete,
}

impl ProgressStage {
    pub const ALL: [ProgressStage; 6] = [
        ProgressStage::Init,
        ProgressStage::ProviderInit,
        ProgressStage::RuleParsing,
        ProgressStage::RuleExecution,
        ProgressStage::DependencyAnalysis,
        ProgressStage::Complete,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProgressStage::Init => "init",
            ProgressStage::ProviderInit => "provider_init",
            ProgressStage::RuleParsing => "rule_parsing",
            ProgressStage::RuleExecution => "rule_execution",
            ProgressStage::DependencyAnalysis => "dependency_analysis",
            ProgressStage::Complete => "complete",
        }
    }
}

impl fmt::Display for ProgressStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ProgressStage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProgressStage::ALL
            .into_iter()
            .find(|stage| stage.as_str() == s)
            .ok_or_else(|| format!("unknown progress stage: {s}"))
    }
}

/// Structured status update emitted by an analysis process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub timestamp: String,
    pub stage: ProgressStage,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percent: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Map<String, serde_json::Value>>,
}

impl ProgressEvent {
    /// Reported percentage, falling back to `current / total` when only counts are sent.
    pub fn effective_percent(&self) -> Option<f64> {
        if let Some(percent) = self.percent {
            return Some(percent.clamp(0.0, 100.0));
        }
        match (self.current, self.total) {
            (Some(current), Some(total)) if total > 0 => {
                Some((current as f64 / total as f64 * 100.0).clamp(0.0, 100.0))
            }
            _ => None,
        }
    }
}
