//! The seam between the render loop and the graphics backend.
//!
//! The loop owns the state machine; everything that touches a GPU handle goes
//! through [`GpuDevice`]. The Vulkan backend lives in [`crate::vulkan`], and
//! the scenario tests drive the loop against a scripted implementation.

use std::time::Duration;

use modeler_platform::{Extent, Rect};

use crate::RenderResult;

/// Classification of an acquire or present outcome.
#[derive(Debug, Clone, PartialEq)]
pub enum PresentationResult<T = ()> {
    Success(T),
    /// Usable this time, but the swapchain no longer matches the surface.
    SuboptimalButUsable(T),
    /// The swapchain cannot be used; nothing was acquired or presented.
    OutOfDate,
    /// Device or surface loss.
    Fatal(String),
}

impl<T> PresentationResult<T> {
    /// Whether the swapchain should be rebuilt before the next frame.
    pub fn needs_recreate(&self) -> bool {
        matches!(
            self,
            PresentationResult::SuboptimalButUsable(_) | PresentationResult::OutOfDate
        )
    }
}

/// Outcome of waiting on a frame slot's reusable guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotStatus {
    Reusable,
    TimedOut,
}

/// A freshly created presentation chain.
#[derive(Debug)]
pub struct CreatedSwapchain<S> {
    pub handle: S,
    /// Extent the chain was actually created with; the surface may clamp the
    /// requested one.
    pub extent: Extent,
    pub image_count: usize,
}

/// Number of per-image objects a resource bundle holds.
pub trait ResourceCount {
    fn count(&self) -> usize;
}

/// Drawing commands a layer may record into the current pass.
///
/// Coordinates are surface pixels.
pub trait CommandTarget {
    /// Set the viewport and scissor for the draws that follow.
    fn set_viewport(&mut self, rect: Rect);

    /// Fill `rect` with a solid colour, clipped to the viewport.
    fn fill_rect(&mut self, rect: Rect, color: [f32; 4]);
}

/// Everything the render loop needs from a graphics backend.
///
/// All methods are called from the render thread only. Handles created here
/// are owned by the caller and must be given back to the matching `destroy_*`
/// method.
pub trait GpuDevice: CommandTarget {
    /// Per-slot objects: the image-available and render-finished signals, the
    /// reusable guard and a command buffer.
    type Slot;
    type Swapchain;
    type ImageViews: ResourceCount;
    type Framebuffers: ResourceCount;

    // =========================================================================
    // Frame Slots
    // =========================================================================

    /// Create slot `index`. Its guard starts satisfied.
    fn create_frame_slot(&mut self, index: usize) -> RenderResult<Self::Slot>;

    fn destroy_frame_slot(&mut self, slot: Self::Slot);

    /// Block until the slot's previous submission finished, or `timeout` passed.
    fn wait_for_slot(&mut self, slot: &Self::Slot, timeout: Duration) -> RenderResult<SlotStatus>;

    /// Return the guard to pending. Only called right before a submission
    /// that signals it.
    fn reset_slot(&mut self, slot: &Self::Slot) -> RenderResult<()>;

    /// Block until the device has no pending work.
    fn wait_idle(&mut self) -> RenderResult<()>;

    // =========================================================================
    // Presentation Chain Factories
    // =========================================================================

    /// Create a chain at `extent`, handing `previous` over for reuse.
    ///
    /// Returns `Ok(None)` if the surface is currently not presentable.
    fn create_swapchain(
        &mut self,
        extent: Extent,
        previous: Option<&Self::Swapchain>,
    ) -> RenderResult<Option<CreatedSwapchain<Self::Swapchain>>>;

    fn destroy_swapchain(&mut self, swapchain: Self::Swapchain);

    fn create_image_views(&mut self, swapchain: &Self::Swapchain) -> RenderResult<Self::ImageViews>;

    fn destroy_image_views(&mut self, views: Self::ImageViews);

    fn create_framebuffers(
        &mut self,
        views: &Self::ImageViews,
        extent: Extent,
    ) -> RenderResult<Self::Framebuffers>;

    fn destroy_framebuffers(&mut self, framebuffers: Self::Framebuffers);

    // =========================================================================
    // Per Frame
    // =========================================================================

    /// Acquire an image, signaling the slot's image-available signal.
    fn acquire_next_image(
        &mut self,
        swapchain: &Self::Swapchain,
        slot: &Self::Slot,
    ) -> PresentationResult<u32>;

    /// Start recording the slot's commands against `image_index`'s framebuffer,
    /// inside the first pass.
    fn begin_frame(
        &mut self,
        slot: &Self::Slot,
        framebuffers: &Self::Framebuffers,
        image_index: u32,
        extent: Extent,
    ) -> RenderResult<()>;

    /// Move to the next pass of the frame.
    fn next_pass(&mut self);

    fn end_frame(&mut self) -> RenderResult<()>;

    /// Submit the slot's commands: wait on image-available, signal
    /// render-finished and the reusable guard.
    fn submit(&mut self, slot: &Self::Slot) -> RenderResult<()>;

    /// Present `image_index` once the slot's render-finished signal fires.
    fn present(
        &mut self,
        swapchain: &Self::Swapchain,
        slot: &Self::Slot,
        image_index: u32,
    ) -> PresentationResult;
}
