//! Core utilities for the Aster renderer.
//!
//! This crate provides foundational pieces used across the workspace:
//! - Error types and result aliases
//! - Logging initialization
//! - Render settings
//! - Frame timing

mod error;
mod logging;
mod settings;
mod timer;

pub use error::{Error, Result};
pub use logging::init_logging;
pub use settings::RenderSettings;
pub use timer::FrameTimer;
