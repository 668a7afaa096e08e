//! Window decoration: title strip, border and rounded corners.
//!
//! The decoration is recorded last over the whole surface. Rounded corners
//! are cut by filling the pixels outside the corner arcs with transparent
//! black, row by row.

use modeler_platform::{Rect, WindowGeometry};
use modeler_renderer::{CommandTarget, FrameContext, Layer, RenderResult};

const CHROME: [f32; 4] = [0.18, 0.18, 0.20, 1.0];
const BORDER: [f32; 4] = [0.35, 0.35, 0.38, 1.0];
const TRANSPARENT: [f32; 4] = [0.0, 0.0, 0.0, 0.0];

/// Horizontal cut for each of the top `radius` rows of a corner: the number
/// of pixels that lie outside a circle of that radius.
fn corner_profile(radius: u32) -> Vec<u32> {
    let r = radius as f32;
    (0..radius)
        .map(|row| {
            let dy = r - row as f32 - 0.5;
            (r - (r * r - dy * dy).max(0.0).sqrt()).floor() as u32
        })
        .collect()
}

/// Rectangles outside the rounded corners of `area`.
pub fn corner_cutouts(area: Rect, radius: f32) -> Vec<Rect> {
    let radius = (radius.round() as u32).min(area.width / 2).min(area.height / 2);
    let right = area.x + area.width as i32;
    let bottom = area.y + area.height as i32;

    let mut cutouts = Vec::new();
    for (row, cut) in corner_profile(radius).into_iter().enumerate() {
        if cut == 0 {
            continue;
        }
        let top_y = area.y + row as i32;
        let bottom_y = bottom - 1 - row as i32;
        for y in [top_y, bottom_y] {
            cutouts.push(Rect::new(area.x, y, cut, 1));
            cutouts.push(Rect::new(right - cut as i32, y, cut, 1));
        }
    }
    cutouts
}

/// Outline of `area`, `width` pixels thick.
fn border_rects(area: Rect, width: u32) -> [Rect; 4] {
    let width = width.min(area.width / 2).min(area.height / 2);
    let inner_height = area.height - 2 * width;
    [
        area.top_strip(width),
        Rect::new(area.x, area.y + (area.height - width) as i32, area.width, width),
        Rect::new(area.x, area.y + width as i32, width, inner_height),
        Rect::new(area.x + (area.width - width) as i32, area.y + width as i32, width, inner_height),
    ]
}

#[derive(Default)]
pub struct DecorationLayer;

impl DecorationLayer {
    pub fn new() -> Self {
        Self
    }
}

impl Layer for DecorationLayer {
    fn name(&self) -> &'static str {
        "decoration"
    }

    fn viewport(&self, geometry: &WindowGeometry) -> Rect {
        Rect::new(0, 0, geometry.surface.width, geometry.surface.height)
    }

    fn record_draw(&mut self, target: &mut dyn CommandTarget, frame: &FrameContext) -> RenderResult<()> {
        let geometry = &frame.geometry;
        target.fill_rect(geometry.chrome_rect(), CHROME);

        if geometry.fullscreen {
            return Ok(());
        }

        let width = geometry.scale.round().max(1.0) as u32;
        for rect in border_rects(geometry.active, width) {
            target.fill_rect(rect, BORDER);
        }
        for rect in corner_cutouts(geometry.active, geometry.corner_radius) {
            target.fill_rect(rect, TRANSPARENT);
        }
        Ok(())
    }
}
