//! The modeler's render thread.
//!
//! This crate owns everything that runs on the render thread:
//! - The [`GpuDevice`] seam and its Vulkan implementation
//! - The frame slot ring ([`FrameSynchronizer`])
//! - The swapchain bundle lifecycle ([`SwapchainManager`])
//! - The per-frame [`RenderLoop`] and the thread entry point
//! - The [`Layer`] traits the board, overlay and decoration implement

mod error;

pub mod frame_sync;
pub mod gpu;
pub mod layers;
pub mod render_loop;
pub mod render_thread;
pub mod swapchain_manager;
pub mod vulkan;

#[cfg(test)]
mod testing;

pub use error::{RenderError, RenderResult};
pub use frame_sync::{FRAMES_IN_FLIGHT, FrameSynchronizer, SlotHandle, SlotPhase};
pub use gpu::{CommandTarget, CreatedSwapchain, GpuDevice, PresentationResult, ResourceCount, SlotStatus};
pub use layers::{BoardLayer, FrameContext, InputResponse, Layer, LayerId, LayerInput, Scene};
pub use render_loop::{IterationOutcome, RenderLoop};
pub use render_thread::{RENDER_THREAD_NAME, spawn_render_thread};
pub use swapchain_manager::{Recreated, SwapchainManager, SwapchainPhase, SwapchainState};
pub use vulkan::{VulkanDevice, VulkanSlot};
