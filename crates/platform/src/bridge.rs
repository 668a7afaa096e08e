//! Callbacks from the render thread back into the platform layer.

use crate::WindowGeometry;

/// The platform side of the render thread.
///
/// One implementation exists per windowing backend. It is moved into the
/// render thread at spawn time, so every method is called from that thread.
/// Events flow the other way through [`crate::Sender`].
pub trait PlatformBridge: Send {
    /// Geometry of the window at the moment the render thread starts.
    fn current_window_geometry(&self) -> WindowGeometry;

    /// Called once after each completed swapchain recreation.
    fn acknowledge_resize(&self, geometry: &WindowGeometry);

    /// Called at most once, when initialization fails before the loop runs.
    ///
    /// Defaults to [`PlatformBridge::notify_fatal_error`].
    fn notify_startup_failure(&self, message: &str) {
        self.notify_fatal_error(message);
    }

    /// Called when the render thread hits an unrecoverable error.
    /// The process is expected to terminate afterwards.
    fn notify_fatal_error(&self, message: &str);
}
