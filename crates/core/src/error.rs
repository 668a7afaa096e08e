//! Errors raised outside the render loop proper: configuration, window and
//! surface setup, and render thread management.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// A `MODELER_*` setting is malformed or out of range.
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("window: {0}")]
    Window(String),

    /// Vulkan surface creation or instance extension lookup failed.
    #[error("surface: {0}")]
    Surface(String),

    #[error("render thread: {0}")]
    Thread(String),
}

pub type Result<T> = std::result::Result<T, Error>;
