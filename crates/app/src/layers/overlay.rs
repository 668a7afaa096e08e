//! Debug overlay: a frame-time bar and a fullscreen toggle.

use glam::Vec2;
use modeler_platform::{Rect, WindowGeometry};
use modeler_renderer::{CommandTarget, FrameContext, InputResponse, Layer, LayerInput, RenderResult};

const WIDTH: f32 = 120.0;
const HEIGHT: f32 = 28.0;
const PADDING: f32 = 8.0;

/// Frame time that fills the whole bar.
const FULL_SCALE_SECS: f32 = 1.0 / 30.0;

const PANEL: [f32; 4] = [0.0, 0.0, 0.0, 0.6];
const TRACK: [f32; 4] = [0.25, 0.25, 0.25, 1.0];
const BUTTON: [f32; 4] = [0.35, 0.35, 0.40, 1.0];
const BUTTON_HOVER: [f32; 4] = [0.50, 0.50, 0.58, 1.0];

/// Bar colour by frame rate: at least 55 fps, at least 30 fps, below.
static BAR_COLORS: [(f32, [f32; 4]); 3] = [
    (55.0, [0.30, 0.80, 0.35, 1.0]),
    (30.0, [0.90, 0.75, 0.20, 1.0]),
    (0.0, [0.90, 0.25, 0.20, 1.0]),
];

fn bar_color(fps: f32) -> [f32; 4] {
    BAR_COLORS
        .iter()
        .find(|(min_fps, _)| fps >= *min_fps)
        .map_or(BAR_COLORS[BAR_COLORS.len() - 1].1, |(_, color)| *color)
}

pub struct OverlayLayer {
    on_toggle_fullscreen: Box<dyn FnMut() + Send>,
    pointer: Option<Vec2>,
}

impl OverlayLayer {
    pub fn new(on_toggle_fullscreen: impl FnMut() + Send + 'static) -> Self {
        Self {
            on_toggle_fullscreen: Box::new(on_toggle_fullscreen),
            pointer: None,
        }
    }

    /// Whether the pointer is over the button drawn inside `panel`.
    fn over_button(&self, panel: Rect, scale: f32) -> bool {
        let button = PanelLayout::new(panel, scale).button;
        self.pointer.is_some_and(|p| button.contains(panel.denormalize(p)))
    }
}

/// Where the track and the button sit inside the panel.
struct PanelLayout {
    track: Rect,
    button: Rect,
}

impl PanelLayout {
    fn new(panel: Rect, scale: f32) -> Self {
        let inner = panel.inset((4.0 * scale).round() as u32);
        let button_width = inner.height.min(inner.width);
        Self {
            track: Rect::new(inner.x, inner.y, inner.width.saturating_sub(button_width * 5 / 4), inner.height),
            button: Rect::new(
                inner.x + (inner.width - button_width) as i32,
                inner.y,
                button_width,
                inner.height,
            ),
        }
    }
}

impl Layer for OverlayLayer {
    fn name(&self) -> &'static str {
        "overlay"
    }

    /// Top-right corner of the client area.
    fn viewport(&self, geometry: &WindowGeometry) -> Rect {
        let client = geometry.client_rect();
        let width = ((WIDTH * geometry.scale).round() as u32).min(client.width);
        let height = ((HEIGHT * geometry.scale).round() as u32).min(client.height);
        let padding = (PADDING * geometry.scale).round() as u32;
        let x = client.x + client.width.saturating_sub(width + padding) as i32;
        let y = client.y + padding.min(client.height - height) as i32;
        Rect::new(x, y, width, height)
    }

    fn handle_input(&mut self, input: LayerInput, geometry: &WindowGeometry) -> InputResponse {
        match input {
            LayerInput::PointerMove(position) => self.pointer = Some(position),
            LayerInput::PointerLeave => self.pointer = None,
            LayerInput::ButtonDown if self.over_button(self.viewport(geometry), geometry.scale) => {
                (self.on_toggle_fullscreen)()
            }
            LayerInput::ButtonDown | LayerInput::ButtonUp => {}
        }
        InputResponse::Handled
    }

    fn record_draw(&mut self, target: &mut dyn CommandTarget, frame: &FrameContext) -> RenderResult<()> {
        let panel = self.viewport(&frame.geometry);
        target.fill_rect(panel, PANEL);

        let PanelLayout { track, button } = PanelLayout::new(panel, frame.geometry.scale);
        target.fill_rect(track, TRACK);

        let fill = (frame.frame_time / FULL_SCALE_SECS).clamp(0.0, 1.0);
        let bar = Rect::new(track.x, track.y, (track.width as f32 * fill).round() as u32, track.height);
        if bar.width > 0 {
            target.fill_rect(bar, bar_color(frame.fps));
        }

        let color = if self.over_button(panel, frame.geometry.scale) {
            BUTTON_HOVER
        } else {
            BUTTON
        };
        target.fill_rect(button, color);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::testing::Recorder;
    use modeler_platform::Extent;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting() -> (OverlayLayer, Arc<AtomicUsize>) {
        let toggles = Arc::new(AtomicUsize::new(0));
        let counter = toggles.clone();
        let layer = OverlayLayer::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        (layer, toggles)
    }

    #[test]
    fn test_viewport_sits_inside_client_top_right() {
        let (layer, _) = counting();
        let geometry = WindowGeometry::default();
        let client = geometry.client_rect();
        let viewport = layer.viewport(&geometry);

        assert_eq!(viewport.extent(), Extent::new(120, 28));
        assert_eq!(viewport.intersect(&client), Some(viewport));
        assert_eq!(viewport.x + 120 + 8, client.x + client.width as i32);
        assert_eq!(viewport.y, client.y + 8);
    }

    #[test]
    fn test_viewport_scales() {
        let (layer, _) = counting();
        let geometry = WindowGeometry::windowed(Extent::new(1200, 800), 2.0);
        assert_eq!(layer.viewport(&geometry).extent(), Extent::new(240, 56));
    }

    /// Move to a pixel offset inside the panel, then press.
    fn press_at(layer: &mut OverlayLayer, geometry: &WindowGeometry, x: f32, y: f32) -> InputResponse {
        let panel = layer.viewport(geometry);
        let at = panel.normalize(Vec2::new(panel.x as f32 + x, panel.y as f32 + y));
        layer.handle_input(LayerInput::PointerMove(at), geometry);
        layer.handle_input(LayerInput::ButtonDown, geometry)
    }

    #[test]
    fn test_button_press_toggles_fullscreen() {
        let (mut layer, toggles) = counting();
        let geometry = WindowGeometry::default();

        press_at(&mut layer, &geometry, 24.0, 14.0);
        assert_eq!(toggles.load(Ordering::SeqCst), 0);

        assert_eq!(press_at(&mut layer, &geometry, 106.0, 14.0), InputResponse::Handled);
        assert_eq!(toggles.load(Ordering::SeqCst), 1);

        layer.handle_input(LayerInput::PointerLeave, &geometry);
        layer.handle_input(LayerInput::ButtonDown, &geometry);
        assert_eq!(toggles.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_only_the_drawn_button_toggles() {
        let (mut layer, toggles) = counting();
        let geometry = WindowGeometry::default();
        let panel = layer.viewport(&geometry);
        let button = PanelLayout::new(panel, geometry.scale).button;
        let left = (button.x - panel.x) as f32;
        let right = left + button.width as f32;

        // Around the button but not on it.
        press_at(&mut layer, &geometry, left - 0.5, 14.0);
        press_at(&mut layer, &geometry, right + 0.5, 14.0);
        press_at(&mut layer, &geometry, left + 2.0, 2.0);
        assert_eq!(toggles.load(Ordering::SeqCst), 0);

        press_at(&mut layer, &geometry, left + 0.5, 14.0);
        press_at(&mut layer, &geometry, right - 0.5, 14.0);
        assert_eq!(toggles.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_hover_color_follows_the_drawn_button() {
        let (mut layer, _) = counting();
        let geometry = WindowGeometry::default();
        let frame = FrameContext {
            geometry,
            frame_time: 0.016,
            fps: 60.0,
            frame_index: 0,
        };
        let panel = layer.viewport(&geometry);
        let button = PanelLayout::new(panel, geometry.scale).button;

        // Inside the panel but left of the button.
        let near = Vec2::new(button.x as f32 - 1.0, button.y as f32 + 1.0);
        layer.handle_input(LayerInput::PointerMove(panel.normalize(near)), &geometry);
        let mut recorder = Recorder::default();
        layer.record_draw(&mut recorder, &frame).unwrap();
        assert_eq!(recorder.fills.last(), Some(&(button, BUTTON)));

        let inside = Vec2::new(button.x as f32 + 1.0, button.y as f32 + 1.0);
        layer.handle_input(LayerInput::PointerMove(panel.normalize(inside)), &geometry);
        let mut recorder = Recorder::default();
        layer.record_draw(&mut recorder, &frame).unwrap();
        assert_eq!(recorder.fills.last(), Some(&(button, BUTTON_HOVER)));
    }

    #[test]
    fn test_bar_tracks_frame_time() {
        let (mut layer, _) = counting();
        let geometry = WindowGeometry::default();
        let mut frame = FrameContext {
            geometry,
            frame_time: 0.025,
            fps: 40.0,
            frame_index: 3,
        };

        let mut recorder = Recorder::default();
        layer.record_draw(&mut recorder, &frame).unwrap();
        // Panel, track, bar and button.
        assert_eq!(recorder.fills.len(), 4);
        let (track, _) = recorder.fills[1];
        let (bar, color) = recorder.fills[2];
        assert_eq!(bar.width, (track.width as f32 * 0.75).round() as u32);
        assert_eq!(color, BAR_COLORS[1].1);

        frame.frame_time = 0.5;
        frame.fps = 2.0;
        let mut recorder = Recorder::default();
        layer.record_draw(&mut recorder, &frame).unwrap();
        let (track, _) = recorder.fills[1];
        let (bar, color) = recorder.fills[2];
        assert_eq!(bar.width, track.width);
        assert_eq!(color, BAR_COLORS[2].1);
    }

    #[test]
    fn test_no_bar_before_first_sample() {
        let (mut layer, _) = counting();
        let frame = FrameContext {
            geometry: WindowGeometry::default(),
            frame_time: 0.0,
            fps: 0.0,
            frame_index: 0,
        };
        let mut recorder = Recorder::default();
        layer.record_draw(&mut recorder, &frame).unwrap();
        assert_eq!(recorder.fills.len(), 3);
    }
}
