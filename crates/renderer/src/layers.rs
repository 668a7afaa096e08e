//! Viewport components drawn by the render loop.
//!
//! A frame is three passes, in order: the board, the overlay (optional) and
//! the window decoration. Each layer owns a viewport it lays out from the
//! current [`WindowGeometry`]; the loop sets that viewport before asking the
//! layer to record, and routes pointer input to the topmost layer under the
//! pointer.

use glam::Vec2;
use modeler_platform::{Rect, WindowGeometry};

use crate::RenderResult;
use crate::gpu::CommandTarget;

/// Pointer input delivered to a layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LayerInput {
    /// Pointer position normalized to the layer's viewport (0..1).
    PointerMove(Vec2),
    ButtonDown,
    ButtonUp,
    /// The pointer moved off this layer.
    PointerLeave,
}

/// What the loop should do after a layer handled input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputResponse {
    Ignored,
    Handled,
    /// Board state changed; upload it before the next frame is recorded.
    RequestBoardUpdate,
}

/// Per-frame values handed to every layer.
#[derive(Debug, Clone, Copy)]
pub struct FrameContext {
    pub geometry: WindowGeometry,
    /// Smoothed frame time in seconds.
    pub frame_time: f32,
    pub fps: f32,
    pub frame_index: u64,
}

/// A viewport component.
pub trait Layer: Send {
    /// Name used in logs and errors.
    fn name(&self) -> &'static str;

    fn viewport(&self, geometry: &WindowGeometry) -> Rect;

    /// React to pointer input. `geometry` is the layout the input was
    /// normalized against, which may be newer than the last recorded frame.
    fn handle_input(&mut self, input: LayerInput, geometry: &WindowGeometry) -> InputResponse {
        let _ = (input, geometry);
        InputResponse::Ignored
    }

    /// Record this layer's draws. The viewport is already set.
    fn record_draw(&mut self, target: &mut dyn CommandTarget, frame: &FrameContext) -> RenderResult<()>;
}

/// The board layer, which also owns the board state pushed to the GPU.
pub trait BoardLayer: Layer {
    /// Push the current board state ahead of recording.
    fn upload_board_state(&mut self) -> RenderResult<()>;
}

/// Layers that receive pointer input, topmost first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerId {
    Overlay,
    Board,
}

impl LayerId {
    /// Hit-test order.
    pub const Z_ORDER: [LayerId; 2] = [LayerId::Overlay, LayerId::Board];
}

/// Everything the loop draws.
pub struct Scene {
    pub board: Box<dyn BoardLayer>,
    pub overlay: Option<Box<dyn Layer>>,
    pub decoration: Box<dyn Layer>,
}

impl Scene {
    pub fn new(board: Box<dyn BoardLayer>, decoration: Box<dyn Layer>) -> Self {
        Self {
            board,
            overlay: None,
            decoration,
        }
    }

    pub fn with_overlay(mut self, overlay: Box<dyn Layer>) -> Self {
        self.overlay = Some(overlay);
        self
    }

    /// Topmost input layer whose viewport contains `point`.
    ///
    /// The overlay only takes part when `overlay_enabled`.
    pub fn hit_test(&self, geometry: &WindowGeometry, point: Vec2, overlay_enabled: bool) -> Option<LayerId> {
        LayerId::Z_ORDER
            .into_iter()
            .find(|&id| match id {
                LayerId::Overlay => self
                    .overlay
                    .as_ref()
                    .is_some_and(|overlay| overlay_enabled && overlay.viewport(geometry).contains(point)),
                LayerId::Board => self.board.viewport(geometry).contains(point),
            })
    }

    /// Viewport of an input layer.
    pub fn viewport_of(&self, id: LayerId, geometry: &WindowGeometry) -> Option<Rect> {
        match id {
            LayerId::Overlay => self.overlay.as_ref().map(|overlay| overlay.viewport(geometry)),
            LayerId::Board => Some(self.board.viewport(geometry)),
        }
    }

    /// Deliver input to an input layer.
    pub fn dispatch(&mut self, id: LayerId, input: LayerInput, geometry: &WindowGeometry) -> InputResponse {
        match id {
            LayerId::Overlay => self
                .overlay
                .as_mut()
                .map_or(InputResponse::Ignored, |overlay| overlay.handle_input(input, geometry)),
            LayerId::Board => self.board.handle_input(input, geometry),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use modeler_platform::Extent;

    struct Fixed {
        name: &'static str,
        rect: Rect,
        inputs: Vec<LayerInput>,
    }

    impl Fixed {
        fn new(name: &'static str, rect: Rect) -> Self {
            Self {
                name,
                rect,
                inputs: Vec::new(),
            }
        }
    }

    impl Layer for Fixed {
        fn name(&self) -> &'static str {
            self.name
        }

        fn viewport(&self, _geometry: &WindowGeometry) -> Rect {
            self.rect
        }

        fn handle_input(&mut self, input: LayerInput, _geometry: &WindowGeometry) -> InputResponse {
            self.inputs.push(input);
            InputResponse::Handled
        }

        fn record_draw(&mut self, _target: &mut dyn CommandTarget, _frame: &FrameContext) -> RenderResult<()> {
            Ok(())
        }
    }

    impl BoardLayer for Fixed {
        fn upload_board_state(&mut self) -> RenderResult<()> {
            Ok(())
        }
    }

    fn scene() -> Scene {
        Scene::new(
            Box::new(Fixed::new("board", Rect::new(0, 0, 100, 100))),
            Box::new(Fixed::new("decoration", Rect::new(0, 0, 200, 200))),
        )
        .with_overlay(Box::new(Fixed::new("overlay", Rect::new(80, 0, 20, 20))))
    }

    #[test]
    fn test_overlay_wins_over_board() {
        let scene = scene();
        let geometry = WindowGeometry::windowed(Extent::new(600, 400), 1.0);

        assert_eq!(scene.hit_test(&geometry, Vec2::new(85.0, 5.0), true), Some(LayerId::Overlay));
        assert_eq!(scene.hit_test(&geometry, Vec2::new(50.0, 50.0), true), Some(LayerId::Board));
        assert_eq!(scene.hit_test(&geometry, Vec2::new(150.0, 50.0), true), None);
    }

    #[test]
    fn test_disabled_overlay_is_skipped() {
        let scene = scene();
        let geometry = WindowGeometry::default();
        assert_eq!(scene.hit_test(&geometry, Vec2::new(85.0, 5.0), false), Some(LayerId::Board));
    }

    #[test]
    fn test_dispatch_without_overlay() {
        let mut scene = Scene::new(
            Box::new(Fixed::new("board", Rect::new(0, 0, 10, 10))),
            Box::new(Fixed::new("decoration", Rect::new(0, 0, 10, 10))),
        );
        let geometry = WindowGeometry::default();
        assert_eq!(
            scene.dispatch(LayerId::Overlay, LayerInput::ButtonDown, &geometry),
            InputResponse::Ignored
        );
        assert_eq!(
            scene.dispatch(LayerId::Board, LayerInput::ButtonDown, &geometry),
            InputResponse::Handled
        );
        assert!(scene.viewport_of(LayerId::Overlay, &geometry).is_none());
    }
}
