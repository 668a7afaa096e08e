//! Hit testing of pointer positions against the borderless window's regions.

use glam::Vec2;
use winit::window::ResizeDirection;

use crate::WindowGeometry;

/// Width of the resize handle band around the active area, logical pixels.
pub const RESIZE_BORDER: u32 = 10;

/// Part of the window a pointer position falls on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowRegion {
    /// Client viewport; presses here are forwarded to the render thread.
    Client,
    /// Title strip; a press here moves the window.
    Chrome,
    Top,
    Bottom,
    Left,
    Right,
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl WindowRegion {
    /// Classify `point` (surface pixels).
    ///
    /// Returns `None` for the transparent margin beyond the resize band.
    /// In fullscreen there are no resize handles.
    pub fn hit_test(geometry: &WindowGeometry, point: Vec2) -> Option<Self> {
        let active = geometry.active;
        let border = if geometry.fullscreen {
            0.0
        } else {
            RESIZE_BORDER as f32 * geometry.scale
        };

        let left = active.x as f32;
        let top = active.y as f32;
        let right = left + active.width as f32;
        let bottom = top + active.height as f32;

        if point.x < left - border
            || point.y < top - border
            || point.x >= right + border
            || point.y >= bottom + border
        {
            return None;
        }

        let west = point.x < left;
        let east = point.x >= right;
        let north = point.y < top;
        let south = point.y >= bottom;

        let region = match (north, south, west, east) {
            (true, _, true, _) => WindowRegion::TopLeft,
            (true, _, _, true) => WindowRegion::TopRight,
            (true, _, _, _) => WindowRegion::Top,
            (_, true, true, _) => WindowRegion::BottomLeft,
            (_, true, _, true) => WindowRegion::BottomRight,
            (_, true, _, _) => WindowRegion::Bottom,
            (_, _, true, _) => WindowRegion::Left,
            (_, _, _, true) => WindowRegion::Right,
            _ if point.y < top + geometry.chrome_height as f32 => WindowRegion::Chrome,
            _ => WindowRegion::Client,
        };
        Some(region)
    }

    /// Resize direction for border regions, `None` for client and chrome.
    pub fn resize_direction(self) -> Option<ResizeDirection> {
        match self {
            WindowRegion::Client | WindowRegion::Chrome => None,
            WindowRegion::Top => Some(ResizeDirection::North),
            WindowRegion::Bottom => Some(ResizeDirection::South),
            WindowRegion::Left => Some(ResizeDirection::West),
            WindowRegion::Right => Some(ResizeDirection::East),
            WindowRegion::TopLeft => Some(ResizeDirection::NorthWest),
            WindowRegion::TopRight => Some(ResizeDirection::NorthEast),
            WindowRegion::BottomLeft => Some(ResizeDirection::SouthWest),
            WindowRegion::BottomRight => Some(ResizeDirection::SouthEast),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Extent;

    fn hit(geometry: &WindowGeometry, x: f32, y: f32) -> Option<WindowRegion> {
        WindowRegion::hit_test(geometry, Vec2::new(x, y))
    }

    #[test]
    fn test_client_and_chrome() {
        // Active area is (25, 15) 550x350, chrome is 56 tall.
        let geometry = WindowGeometry::default();
        assert_eq!(hit(&geometry, 100.0, 20.0), Some(WindowRegion::Chrome));
        assert_eq!(hit(&geometry, 100.0, 70.0), Some(WindowRegion::Chrome));
        assert_eq!(hit(&geometry, 100.0, 71.0), Some(WindowRegion::Client));
        assert_eq!(hit(&geometry, 574.0, 364.0), Some(WindowRegion::Client));
    }

    #[test]
    fn test_borders_and_corners() {
        let geometry = WindowGeometry::default();
        assert_eq!(hit(&geometry, 20.0, 200.0), Some(WindowRegion::Left));
        assert_eq!(hit(&geometry, 575.0, 200.0), Some(WindowRegion::Right));
        assert_eq!(hit(&geometry, 300.0, 10.0), Some(WindowRegion::Top));
        assert_eq!(hit(&geometry, 300.0, 365.0), Some(WindowRegion::Bottom));
        assert_eq!(hit(&geometry, 20.0, 10.0), Some(WindowRegion::TopLeft));
        assert_eq!(hit(&geometry, 580.0, 10.0), Some(WindowRegion::TopRight));
        assert_eq!(hit(&geometry, 20.0, 370.0), Some(WindowRegion::BottomLeft));
        assert_eq!(hit(&geometry, 580.0, 370.0), Some(WindowRegion::BottomRight));
    }

    #[test]
    fn test_outside_resize_band() {
        let geometry = WindowGeometry::default();
        assert_eq!(hit(&geometry, 5.0, 200.0), None);
        assert_eq!(hit(&geometry, 300.0, 390.0), None);
    }

    #[test]
    fn test_fullscreen_has_no_borders() {
        let geometry = WindowGeometry::fullscreen(Extent::new(800, 600), 1.0);
        assert_eq!(hit(&geometry, 0.0, 0.0), Some(WindowRegion::Chrome));
        assert_eq!(hit(&geometry, 0.0, 300.0), Some(WindowRegion::Client));
        assert_eq!(hit(&geometry, 800.0, 300.0), None);
    }

    #[test]
    fn test_resize_direction() {
        assert_eq!(WindowRegion::Client.resize_direction(), None);
        assert_eq!(WindowRegion::Chrome.resize_direction(), None);
        assert_eq!(
            WindowRegion::BottomRight.resize_direction(),
            Some(ResizeDirection::SouthEast)
        );
    }
}
