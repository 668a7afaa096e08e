//! The layers the desktop modeler draws.

mod board;
mod decoration;
mod overlay;

pub use board::ChessBoardLayer;
pub use decoration::DecorationLayer;
pub use overlay::OverlayLayer;

use modeler_renderer::Scene;

use crate::board::Board;

/// Board, overlay and decoration for a fresh game.
///
/// `on_toggle_fullscreen` runs on the render thread when the overlay's
/// fullscreen button is pressed.
pub fn build_scene(on_toggle_fullscreen: impl FnMut() + Send + 'static) -> Scene {
    Scene::new(
        Box::new(ChessBoardLayer::new(Board::new())),
        Box::new(DecorationLayer::new()),
    )
    .with_overlay(Box::new(OverlayLayer::new(on_toggle_fullscreen)))
}
