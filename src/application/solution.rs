use crate::domain::{ShapeError, SolutionResponse, SolutionState};
use crate::infra::validation::parse_solution_response;
use crate::state::StateStore;
use serde_json::Value;
use std::sync::Arc;

/// Drives the solution request lifecycle:
/// `none -> started -> sent -> received | failed`.
#[derive(Clone)]
pub struct SolutionWorkflow {
    store: Arc<StateStore>,
}

impl SolutionWorkflow {
    pub fn new(store: Arc<StateStore>) -> Self {
        Self { store }
    }

    pub fn start(&self, scope: Option<Value>) {
        self.store.update_solution(|solution| {
            solution.solution_state = SolutionState::Started;
            solution.is_fetching_solution = true;
            solution.scope = scope;
            solution.response = None;
            solution.error = None;
        });
    }

    pub fn mark_sent(&self) {
        self.store.update_solution(|solution| {
            solution.solution_state = SolutionState::Sent;
        });
    }

    /// Accepts a backend response only after it passes the shape guard.
    pub fn receive(&self, payload: &Value) -> Result<SolutionResponse, ShapeError> {
        let response = match parse_solution_response(payload) {
            Ok(response) => response,
            Err(err) => {
                self.fail(format!("Malformed solution response: {err}"));
                return Err(err);
            }
        };
        if !response.encountered_errors.is_empty() {
            log::warn!(
                "solution reported {} errors",
                response.encountered_errors.len()
            );
        }
        log::info!("solution received with {} changes", response.changes.len());
        let stored = response.clone();
        self.store.update_solution(|solution| {
            solution.solution_state = SolutionState::Received;
            solution.is_fetching_solution = false;
            solution.response = Some(stored);
        });
        Ok(response)
    }

    pub fn fail(&self, message: impl Into<String>) {
        let message = message.into();
        log::warn!("solution request failed: {message}");
        self.store.update_solution(|solution| {
            solution.solution_state = SolutionState::Failed;
            solution.is_fetching_solution = false;
            solution.error = Some(message);
        });
    }

    pub fn reset(&self) {
        self.store.update_solution(|solution| *solution = Default::default());
    }
}
