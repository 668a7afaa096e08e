//! Platform layer for the modeler.
//!
//! This crate owns everything that crosses from the platform thread into the
//! render thread:
//! - The [`Event`] type and the two-lock [`channel`] that carries it
//! - [`WindowGeometry`], the description of the drawable area and its chrome
//! - The [`PlatformBridge`] trait the render thread calls back through
//! - Window-region hit testing for the borderless window
//! - The winit window wrapper and Vulkan surface creation

mod bridge;
pub mod channel;
mod event;
mod geometry;
mod input;
mod region;
mod window;

pub use bridge::PlatformBridge;
pub use channel::{Receiver, Sender, channel};
pub use event::Event;
pub use geometry::{Extent, Orientation, Rect, WindowGeometry};
pub use input::{MouseButton, PointerAction, PointerTracker};
pub use region::WindowRegion;
pub use window::{Surface, Window, create_surface, get_required_extensions};

// Re-export winit types the backend needs
pub use winit::event::WindowEvent;
pub use winit::event_loop::EventLoop;
