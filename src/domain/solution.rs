use serde::{Deserialize, Serialize};

/// One file change proposed by the solution backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolutionChange {
    pub diff: String,
    pub original: String,
    pub modified: String,
}

/// Result of a solution request, accepted only after shape validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolutionResponse {
    pub encountered_errors: Vec<String>,
    pub changes: Vec<SolutionChange>,
    pub scope: serde_json::Map<String, serde_json::Value>,
    #[serde(rename = "clientId")]
    pub client_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum SolutionState {
    #[default]
    None,
    Started,
    Sent,
    Received,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SolutionWorkflowState {
    pub solution_state: SolutionState,
    pub is_fetching_solution: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<SolutionResponse>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
