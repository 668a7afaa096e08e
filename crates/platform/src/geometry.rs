//! Window geometry: the drawable surface and the active area inside it.
//!
//! The window is borderless and draws its own chrome. The surface covers the
//! whole native window; the active area is the inset rectangle that holds the
//! title strip and the client viewport. The margin around it is left for the
//! drop shadow and for resize handles.

use glam::Vec2;

/// Default surface size in logical pixels.
pub const DEFAULT_SURFACE_WIDTH: u32 = 600;
pub const DEFAULT_SURFACE_HEIGHT: u32 = 400;

/// Margin on each side of the active area, logical pixels.
pub const MARGIN: u32 = 25;
/// Vertical offset of the active area. It is smaller than the margin so the
/// shadow falls below the window.
pub const MARGIN_TOP: u32 = 15;
/// Height of the title strip at the top of the active area, logical pixels.
pub const CHROME_HEIGHT: u32 = 56;
/// Corner radius of the active area, logical pixels.
pub const CORNER_RADIUS: f32 = 10.0;

/// Width and height in physical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Extent {
    pub width: u32,
    pub height: u32,
}

impl Extent {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// A zero-sized extent cannot back a swapchain.
    pub fn is_degenerate(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Axis-aligned rectangle in physical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn extent(&self) -> Extent {
        Extent::new(self.width, self.height)
    }

    /// Half-open containment test.
    pub fn contains(&self, point: Vec2) -> bool {
        let (left, top) = (self.x as f32, self.y as f32);
        point.x >= left
            && point.y >= top
            && point.x < left + self.width as f32
            && point.y < top + self.height as f32
    }

    /// Map a point into this rectangle's 0..1 space.
    pub fn normalize(&self, point: Vec2) -> Vec2 {
        let size = Vec2::new(self.width.max(1) as f32, self.height.max(1) as f32);
        (point - Vec2::new(self.x as f32, self.y as f32)) / size
    }

    /// Inverse of [`Rect::normalize`].
    pub fn denormalize(&self, point: Vec2) -> Vec2 {
        Vec2::new(self.x as f32, self.y as f32)
            + point * Vec2::new(self.width as f32, self.height as f32)
    }

    /// Remove `top` pixels from the top edge.
    pub fn below(&self, top: u32) -> Rect {
        let top = top.min(self.height);
        Rect::new(self.x, self.y + top as i32, self.width, self.height - top)
    }

    /// Keep only the top `height` pixels.
    pub fn top_strip(&self, height: u32) -> Rect {
        Rect::new(self.x, self.y, self.width, height.min(self.height))
    }

    /// Shrink by `amount` on every side.
    pub fn inset(&self, amount: u32) -> Rect {
        let horizontal = amount.min(self.width / 2);
        let vertical = amount.min(self.height / 2);
        Rect::new(
            self.x + horizontal as i32,
            self.y + vertical as i32,
            self.width - 2 * horizontal,
            self.height - 2 * vertical,
        )
    }

    /// Overlap of two rectangles, `None` if it is empty.
    pub fn intersect(&self, other: &Rect) -> Option<Rect> {
        let left = self.x.max(other.x);
        let top = self.y.max(other.y);
        let right = (self.x as i64 + self.width as i64).min(other.x as i64 + other.width as i64);
        let bottom = (self.y as i64 + self.height as i64).min(other.y as i64 + other.height as i64);
        if right <= left as i64 || bottom <= top as i64 {
            return None;
        }
        Some(Rect::new(
            left,
            top,
            (right - left as i64) as u32,
            (bottom - top as i64) as u32,
        ))
    }
}

/// Rotation applied by the compositor to the presented image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    #[default]
    Rotate0,
    Rotate90,
    Rotate180,
    Rotate270,
}

impl Orientation {
    /// The rotation that undoes this one.
    pub fn negate(self) -> Self {
        match self {
            Orientation::Rotate0 => Orientation::Rotate0,
            Orientation::Rotate90 => Orientation::Rotate270,
            Orientation::Rotate180 => Orientation::Rotate180,
            Orientation::Rotate270 => Orientation::Rotate90,
        }
    }

    /// Whether width and height trade places.
    pub fn is_transposed(self) -> bool {
        matches!(self, Orientation::Rotate90 | Orientation::Rotate270)
    }
}

/// Authoritative description of the drawable area and its chrome.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowGeometry {
    /// Full drawable surface.
    pub surface: Extent,
    /// Inset area holding the chrome and the client viewport.
    pub active: Rect,
    pub corner_radius: f32,
    /// Output scale factor (physical pixels per logical pixel).
    pub scale: f32,
    /// Height of the title strip inside the active area.
    pub chrome_height: u32,
    pub orientation: Orientation,
    pub fullscreen: bool,
}

impl WindowGeometry {
    /// Windowed layout: margins around the active area, rounded corners.
    pub fn windowed(surface: Extent, scale: f32) -> Self {
        let margin = scaled(MARGIN, scale);
        let margin_top = scaled(MARGIN_TOP, scale);
        let active = Rect::new(
            margin as i32,
            margin_top as i32,
            surface.width.saturating_sub(2 * margin),
            surface.height.saturating_sub(2 * margin),
        );
        Self {
            surface,
            active,
            corner_radius: CORNER_RADIUS * scale,
            scale,
            chrome_height: scaled(CHROME_HEIGHT, scale).min(active.height),
            orientation: Orientation::Rotate0,
            fullscreen: false,
        }
    }

    /// Fullscreen layout: the active area is the whole surface, square corners.
    pub fn fullscreen(surface: Extent, scale: f32) -> Self {
        let active = Rect::new(0, 0, surface.width, surface.height);
        Self {
            surface,
            active,
            corner_radius: 0.0,
            scale,
            chrome_height: scaled(CHROME_HEIGHT, scale).min(active.height),
            orientation: Orientation::Rotate0,
            fullscreen: true,
        }
    }

    /// Rebuild the layout for a new surface size, keeping mode and scale.
    pub fn resized(&self, surface: Extent) -> Self {
        let mut next = if self.fullscreen {
            Self::fullscreen(surface, self.scale)
        } else {
            Self::windowed(surface, self.scale)
        };
        next.orientation = self.orientation;
        next
    }

    /// Extent of the images the swapchain must be created with.
    pub fn swapchain_extent(&self) -> Extent {
        if self.orientation.is_transposed() {
            Extent::new(self.surface.height, self.surface.width)
        } else {
            self.surface
        }
    }

    /// Whether the surface can be presented to at all.
    pub fn is_presentable(&self) -> bool {
        !self.surface.is_degenerate()
    }

    /// Title strip at the top of the active area.
    pub fn chrome_rect(&self) -> Rect {
        self.active.top_strip(self.chrome_height)
    }

    /// Client viewport below the title strip.
    pub fn client_rect(&self) -> Rect {
        self.active.below(self.chrome_height)
    }
}

impl Default for WindowGeometry {
    fn default() -> Self {
        Self::windowed(
            Extent::new(DEFAULT_SURFACE_WIDTH, DEFAULT_SURFACE_HEIGHT),
            1.0,
        )
    }
}

fn scaled(logical: u32, scale: f32) -> u32 {
    (logical as f32 * scale).round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_layout() {
        let geometry = WindowGeometry::default();
        assert_eq!(geometry.surface, Extent::new(600, 400));
        assert_eq!(geometry.active, Rect::new(25, 15, 550, 350));
        assert_eq!(geometry.corner_radius, 10.0);
        assert!(!geometry.fullscreen);
    }

    #[test]
    fn test_windowed_layout_scales() {
        let geometry = WindowGeometry::windowed(Extent::new(1200, 800), 2.0);
        assert_eq!(geometry.active, Rect::new(50, 30, 1100, 700));
        assert_eq!(geometry.chrome_height, 112);
        assert_eq!(geometry.corner_radius, 20.0);
    }

    #[test]
    fn test_tiny_surface_does_not_underflow() {
        let geometry = WindowGeometry::windowed(Extent::new(10, 10), 1.0);
        assert_eq!(geometry.active.width, 0);
        assert_eq!(geometry.active.height, 0);
        assert_eq!(geometry.chrome_height, 0);
    }

    #[test]
    fn test_fullscreen_layout() {
        let geometry = WindowGeometry::fullscreen(Extent::new(1920, 1080), 1.0);
        assert_eq!(geometry.active, Rect::new(0, 0, 1920, 1080));
        assert_eq!(geometry.corner_radius, 0.0);
        assert_eq!(geometry.client_rect(), Rect::new(0, 56, 1920, 1024));
    }

    #[test]
    fn test_resized_keeps_mode() {
        let geometry = WindowGeometry::fullscreen(Extent::new(800, 600), 1.0);
        let resized = geometry.resized(Extent::new(1024, 768));
        assert!(resized.fullscreen);
        assert_eq!(resized.surface, Extent::new(1024, 768));
    }

    #[test]
    fn test_degenerate_extent() {
        assert!(Extent::new(0, 100).is_degenerate());
        assert!(Extent::new(100, 0).is_degenerate());
        assert!(!Extent::new(1, 1).is_degenerate());
        let geometry = WindowGeometry::default().resized(Extent::new(0, 0));
        assert!(!geometry.is_presentable());
    }

    #[test]
    fn test_rotated_swapchain_extent() {
        let mut geometry = WindowGeometry::fullscreen(Extent::new(1080, 1920), 1.0);
        geometry.orientation = Orientation::Rotate90;
        assert_eq!(geometry.swapchain_extent(), Extent::new(1920, 1080));
        assert_eq!(Orientation::Rotate90.negate(), Orientation::Rotate270);
        assert_eq!(Orientation::Rotate180.negate(), Orientation::Rotate180);
    }

    #[test]
    fn test_rect_normalize_roundtrip() {
        let rect = Rect::new(100, 50, 200, 100);
        assert!(rect.contains(Vec2::new(100.0, 50.0)));
        assert!(!rect.contains(Vec2::new(300.0, 50.0)));
        let n = rect.normalize(Vec2::new(200.0, 100.0));
        assert_eq!(n, Vec2::new(0.5, 0.5));
        assert_eq!(rect.denormalize(n), Vec2::new(200.0, 100.0));
    }

    #[test]
    fn test_rect_intersect() {
        let a = Rect::new(0, 0, 100, 100);
        assert_eq!(a.intersect(&Rect::new(50, -10, 100, 40)), Some(Rect::new(50, 0, 50, 30)));
        assert_eq!(a.intersect(&Rect::new(100, 0, 10, 10)), None);
        assert_eq!(a.intersect(&a), Some(a));
    }

    #[test]
    fn test_rect_inset() {
        assert_eq!(Rect::new(10, 10, 100, 50).inset(5), Rect::new(15, 15, 90, 40));
        assert_eq!(Rect::new(0, 0, 4, 4).inset(10), Rect::new(2, 2, 0, 0));
    }
}
