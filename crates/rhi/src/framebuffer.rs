//! Per-image framebuffers for the frame render pass.

use std::sync::Arc;

use ash::vk;
use tracing::debug;

use crate::depth::DepthBuffer;
use crate::device::Device;
use crate::error::RhiResult;
use crate::render_pass::RenderPass;
use crate::swapchain::SwapchainImageViews;

/// One framebuffer per swapchain image view, all sharing one depth buffer.
///
/// Holds the depth buffer so it lives exactly as long as the framebuffers
/// referencing it.
pub struct Framebuffers {
    device: Arc<Device>,
    framebuffers: Vec<vk::Framebuffer>,
    depth: DepthBuffer,
    extent: vk::Extent2D,
}

impl Framebuffers {
    pub fn new(
        device: Arc<Device>,
        render_pass: &RenderPass,
        views: &SwapchainImageViews,
        depth: DepthBuffer,
    ) -> RhiResult<Self> {
        let extent = depth.extent();
        let mut bundle = Self {
            device,
            framebuffers: Vec::with_capacity(views.len()),
            depth,
            extent,
        };

        for &view in views.views() {
            let attachments = [view, bundle.depth.image_view()];
            let create_info = vk::FramebufferCreateInfo::default()
                .render_pass(render_pass.handle())
                .attachments(&attachments)
                .width(extent.width)
                .height(extent.height)
                .layers(1);

            // SAFETY: the attachments match the render pass and are alive.
            // Framebuffers created before a failure are released by Drop.
            let framebuffer = unsafe { bundle.device.handle().create_framebuffer(&create_info, None)? };
            bundle.framebuffers.push(framebuffer);
        }

        debug!(
            "Created {} framebuffers ({}x{})",
            bundle.framebuffers.len(),
            extent.width,
            extent.height
        );
        Ok(bundle)
    }

    /// Framebuffer for swapchain image `index`.
    #[inline]
    pub fn get(&self, index: usize) -> Option<vk::Framebuffer> {
        self.framebuffers.get(index).copied()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.framebuffers.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.framebuffers.is_empty()
    }

    #[inline]
    pub fn extent(&self) -> vk::Extent2D {
        self.extent
    }
}

impl Drop for Framebuffers {
    fn drop(&mut self) {
        for &framebuffer in &self.framebuffers {
            // SAFETY: the device is idle before swapchain-dependent objects
            // are dropped.
            unsafe {
                self.device.handle().destroy_framebuffer(framebuffer, None);
            }
        }
        debug!("Destroyed {} framebuffers", self.framebuffers.len());
    }
}
