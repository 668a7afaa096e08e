//! Core utilities shared by every modeler crate.
//!
//! This crate provides foundational types used across the workspace:
//! - Error types and result aliases
//! - Logging initialization
//! - Frame timers and the smoothed frame-time estimator
//! - Render configuration handed to the render thread

mod config;
mod error;
mod logging;
mod timer;

pub use config::RenderConfig;
pub use error::{Error, Result};
pub use logging::init_logging;
pub use timer::{FrameTimeEstimator, Timer};
