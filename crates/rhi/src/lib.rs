//! Vulkan abstraction layer (Render Hardware Interface).
//!
//! Thin RAII wrappers over `ash` for what the modeler's render thread needs:
//! - Instance, physical device selection, logical device and allocator
//! - Swapchain, swapchain image views and framebuffers
//! - The frame render pass and its depth attachment
//! - Command recording and synchronization primitives

mod error;

pub mod command;
pub mod depth;
pub mod device;
pub mod framebuffer;
pub mod instance;
pub mod physical_device;
pub mod render_pass;
pub mod swapchain;
pub mod sync;

pub use error::{RhiError, RhiResult};

// Re-export ash types that users might need
pub use ash::vk;
