//! The winit side of the render thread's callbacks.

use modeler_platform::{PlatformBridge, WindowGeometry};
use tracing::warn;
use winit::event_loop::EventLoopProxy;

/// Messages from the render thread to the winit event loop.
#[derive(Debug, Clone, PartialEq)]
pub enum UserEvent {
    /// A swapchain recreation for this geometry completed.
    ResizeAcknowledged(WindowGeometry),
    /// The overlay's fullscreen button was pressed.
    ToggleFullscreen,
    /// The render thread stopped on an error. The application exits.
    Fatal { message: String, startup: bool },
}

/// [`PlatformBridge`] that forwards every callback to the event loop.
pub struct WinitBridge {
    proxy: EventLoopProxy<UserEvent>,
    geometry: WindowGeometry,
}

impl WinitBridge {
    /// `geometry` is the window layout at the moment the render thread is spawned.
    pub fn new(proxy: EventLoopProxy<UserEvent>, geometry: WindowGeometry) -> Self {
        Self { proxy, geometry }
    }

    fn send(&self, event: UserEvent) {
        if let Err(e) = self.proxy.send_event(event) {
            warn!("Event loop already closed, dropping {:?}", e.0);
        }
    }
}

impl PlatformBridge for WinitBridge {
    fn current_window_geometry(&self) -> WindowGeometry {
        self.geometry
    }

    fn acknowledge_resize(&self, geometry: &WindowGeometry) {
        self.send(UserEvent::ResizeAcknowledged(*geometry));
    }

    fn notify_startup_failure(&self, message: &str) {
        self.send(UserEvent::Fatal {
            message: message.to_string(),
            startup: true,
        });
    }

    fn notify_fatal_error(&self, message: &str) {
        self.send(UserEvent::Fatal {
            message: message.to_string(),
            startup: false,
        });
    }
}
