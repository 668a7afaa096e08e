//! Translation of winit pointer input into render-thread events.
//!
//! Presses on the title strip or the resize band are handled on the platform
//! thread (window move/resize); only client-area input reaches the render thread.

use glam::Vec2;
use winit::event::ElementState;

use crate::{Event, WindowGeometry, WindowRegion};

/// Mouse button identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    Other,
}

impl From<winit::event::MouseButton> for MouseButton {
    fn from(button: winit::event::MouseButton) -> Self {
        match button {
            winit::event::MouseButton::Left => MouseButton::Left,
            winit::event::MouseButton::Right => MouseButton::Right,
            winit::event::MouseButton::Middle => MouseButton::Middle,
            _ => MouseButton::Other,
        }
    }
}

/// What the platform thread should do with a pointer input.
#[derive(Debug, Clone, PartialEq)]
pub enum PointerAction {
    /// Push this event into the render channel.
    Forward(Event),
    /// Start an interactive window move.
    DragWindow,
    /// Start an interactive resize from the given region.
    DragResize(WindowRegion),
    Ignore,
}

/// Tracks the pointer on the platform thread.
#[derive(Debug, Default)]
pub struct PointerTracker {
    position: Vec2,
    inside: bool,
    /// Region under the pointer when the primary button went down.
    pressed_in: Option<WindowRegion>,
}

impl PointerTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last known pointer position in surface pixels.
    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn on_cursor_moved(&mut self, x: f64, y: f64) -> PointerAction {
        self.position = Vec2::new(x as f32, y as f32);
        self.inside = true;
        PointerAction::Forward(Event::PointerMove(self.position))
    }

    pub fn on_cursor_left(&mut self) -> PointerAction {
        if !self.inside {
            return PointerAction::Ignore;
        }
        self.inside = false;
        PointerAction::Forward(Event::PointerLeave)
    }

    /// Decide what a button transition at the current position means.
    pub fn on_button(
        &mut self,
        geometry: &WindowGeometry,
        button: MouseButton,
        state: ElementState,
    ) -> PointerAction {
        if button != MouseButton::Left {
            return PointerAction::Ignore;
        }

        match state {
            ElementState::Pressed => {
                let region = WindowRegion::hit_test(geometry, self.position);
                self.pressed_in = region;
                match region {
                    Some(WindowRegion::Client) => PointerAction::Forward(Event::ButtonDown),
                    Some(WindowRegion::Chrome) => PointerAction::DragWindow,
                    Some(border) => PointerAction::DragResize(border),
                    None => PointerAction::Ignore,
                }
            }
            ElementState::Released => match self.pressed_in.take() {
                // The chrome draws its own buttons, so releases there go to the
                // render thread too.
                Some(WindowRegion::Client | WindowRegion::Chrome) => {
                    PointerAction::Forward(Event::ButtonUp)
                }
                _ => PointerAction::Ignore,
            },
        }
    }
}
