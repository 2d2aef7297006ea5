//! Application layer (use-cases, policies).
//!
//! Orchestrates the domain types and infrastructure adapters: streamed diff
//! application and review, analysis progress tracking and the solution
//! request workflow. Every state change goes through [`crate::state::StateStore`].

pub mod analysis;
pub mod apply;
pub mod solution;

pub use analysis::AnalysisTracker;
pub use apply::{ApplyOptions, DiffManager, StreamMeta};
pub use solution::SolutionWorkflow;
