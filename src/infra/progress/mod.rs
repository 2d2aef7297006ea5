//! Progress events from an external analysis process.

mod monitor;
mod parser;

pub use monitor::monitor_progress;
pub use parser::{ProgressParser, parse_progress_line};
