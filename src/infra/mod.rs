//! Infrastructure layer (adapters/implementations).
//!
//! Document access, diff computation, progress stream decoding, payload
//! validation, configuration and logging.

pub mod app_config;
pub mod diff;
pub mod document;
pub mod hash;
pub mod logging;
pub mod progress;
pub mod validation;
