//! Render thread error types.

use std::time::Duration;

use modeler_rhi::RhiError;
use thiserror::Error;

/// Errors that end the render thread.
///
/// Transient presentation staleness is not represented here; it is a
/// [`crate::PresentationResult`] variant handled inside the loop.
#[derive(Error, Debug)]
pub enum RenderError {
    /// Backend call failed
    #[error(transparent)]
    Rhi(#[from] RhiError),

    /// Configuration, window or surface failure from the platform side
    #[error(transparent)]
    Core(#[from] modeler_core::Error),

    /// A frame slot did not become reusable within the configured bound
    #[error("Device lost: frame slot {slot} not reusable after {timeout:?}")]
    DeviceLost { slot: usize, timeout: Duration },

    /// Acquire or present reported an unrecoverable result
    #[error("Presentation failed: {0}")]
    Presentation(String),

    /// Initialization failed before the loop started
    #[error("Startup failed: {0}")]
    Startup(String),

    /// A layer could not upload or record its content
    #[error("Layer '{layer}' failed: {message}")]
    Layer { layer: &'static str, message: String },

    /// A lifecycle operation was called in a state that does not allow it
    #[error("Invalid state: {0}")]
    InvalidState(String),
}

impl RenderError {
    /// Whether the GPU is gone and nothing more can be submitted.
    pub fn is_device_lost(&self) -> bool {
        match self {
            RenderError::DeviceLost { .. } => true,
            RenderError::Rhi(e) => e.is_device_lost(),
            _ => false,
        }
    }
}

/// Result type alias for render thread operations.
pub type RenderResult<T> = std::result::Result<T, RenderError>;

#[cfg(test)]
mod tests {
    use super::*;
    use ash::vk;

    #[test]
    fn test_device_lost_classification() {
        let timeout = RenderError::DeviceLost {
            slot: 1,
            timeout: Duration::from_secs(10),
        };
        assert!(timeout.is_device_lost());
        assert!(RenderError::Rhi(RhiError::VulkanError(vk::Result::ERROR_DEVICE_LOST)).is_device_lost());
        assert!(!RenderError::Presentation("surface lost".into()).is_device_lost());
    }

    #[test]
    fn test_error_messages() {
        let err = RenderError::DeviceLost {
            slot: 0,
            timeout: Duration::from_millis(250),
        };
        assert_eq!(
            err.to_string(),
            "Device lost: frame slot 0 not reusable after 250ms"
        );

        let err = RenderError::Layer {
            layer: "board",
            message: "no pieces".into(),
        };
        assert_eq!(err.to_string(), "Layer 'board' failed: no pieces");
    }
}
