//! Events sent from the platform thread to the render thread.

use glam::Vec2;

use crate::WindowGeometry;

/// A single notification for the render thread.
///
/// Each event is consumed exactly once; its payload moves with it.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// Primary button pressed inside the client area.
    ButtonDown,
    /// Primary button released inside the client area.
    ButtonUp,
    /// Pointer moved, in surface pixels.
    PointerMove(Vec2),
    /// Pointer moved, normalized to the active area (0..1 on both axes).
    NormalizedPointerMove(Vec2),
    /// Pointer left the window.
    PointerLeave,
    /// Window geometry changed.
    Resize(WindowGeometry),
    /// Stop rendering and return from the render loop.
    Terminate,
}

impl Event {
    /// Short name used in log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            Event::ButtonDown => "ButtonDown",
            Event::ButtonUp => "ButtonUp",
            Event::PointerMove(_) => "PointerMove",
            Event::NormalizedPointerMove(_) => "NormalizedPointerMove",
            Event::PointerLeave => "PointerLeave",
            Event::Resize(_) => "Resize",
            Event::Terminate => "Terminate",
        }
    }
}
