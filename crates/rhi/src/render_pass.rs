//! The three-subpass render pass used for every frame.
//!
//! | subpass | writes | reads |
//! |---------|--------|-------|
//! | 0 board | color (0), depth (1) | |
//! | 1 overlay | color (0) | |
//! | 2 decoration | color (0) | color (0) as input attachment |
//!
//! The decoration subpass composites the window chrome over what the earlier
//! subpasses produced, so attachment 0 is used in `GENERAL` layout there to
//! be both readable and writable. Dependencies are by-region, so each pixel
//! only waits for its own earlier writes.

use std::sync::Arc;

use ash::vk;
use tracing::debug;

use crate::device::Device;
use crate::error::RhiResult;

/// Index of each subpass in the render pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum Subpass {
    Board = 0,
    Overlay = 1,
    Decoration = 2,
}

impl Subpass {
    pub const ALL: [Subpass; 3] = [Subpass::Board, Subpass::Overlay, Subpass::Decoration];

    pub fn index(self) -> u32 {
        self as u32
    }
}

/// Attachment slots in every framebuffer built for this render pass.
pub const COLOR_ATTACHMENT: u32 = 0;
pub const DEPTH_ATTACHMENT: u32 = 1;

/// Vulkan render pass, destroyed on drop.
pub struct RenderPass {
    device: Arc<Device>,
    render_pass: vk::RenderPass,
    reads_input_attachment: bool,
}

impl RenderPass {
    /// Build the render pass.
    ///
    /// `input_attachment_usable` must be false when the swapchain images
    /// cannot be created with `INPUT_ATTACHMENT` usage; the decoration subpass
    /// then only writes.
    pub fn new(
        device: Arc<Device>,
        color_format: vk::Format,
        depth_format: vk::Format,
        input_attachment_usable: bool,
    ) -> RhiResult<Self> {
        let attachments = [
            vk::AttachmentDescription::default()
                .format(color_format)
                .samples(vk::SampleCountFlags::TYPE_1)
                .load_op(vk::AttachmentLoadOp::CLEAR)
                .store_op(vk::AttachmentStoreOp::STORE)
                .stencil_load_op(vk::AttachmentLoadOp::DONT_CARE)
                .stencil_store_op(vk::AttachmentStoreOp::DONT_CARE)
                .initial_layout(vk::ImageLayout::UNDEFINED)
                .final_layout(vk::ImageLayout::PRESENT_SRC_KHR),
            vk::AttachmentDescription::default()
                .format(depth_format)
                .samples(vk::SampleCountFlags::TYPE_1)
                .load_op(vk::AttachmentLoadOp::CLEAR)
                .store_op(vk::AttachmentStoreOp::DONT_CARE)
                .stencil_load_op(vk::AttachmentLoadOp::DONT_CARE)
                .stencil_store_op(vk::AttachmentStoreOp::DONT_CARE)
                .initial_layout(vk::ImageLayout::UNDEFINED)
                .final_layout(vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL),
        ];

        let color_ref = [vk::AttachmentReference {
            attachment: COLOR_ATTACHMENT,
            layout: vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
        }];
        let depth_ref = vk::AttachmentReference {
            attachment: DEPTH_ATTACHMENT,
            layout: vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL,
        };
        let feedback_ref = [vk::AttachmentReference {
            attachment: COLOR_ATTACHMENT,
            layout: vk::ImageLayout::GENERAL,
        }];

        let board = vk::SubpassDescription::default()
            .pipeline_bind_point(vk::PipelineBindPoint::GRAPHICS)
            .color_attachments(&color_ref)
            .depth_stencil_attachment(&depth_ref);
        let overlay = vk::SubpassDescription::default()
            .pipeline_bind_point(vk::PipelineBindPoint::GRAPHICS)
            .color_attachments(&color_ref);
        let decoration = if input_attachment_usable {
            vk::SubpassDescription::default()
                .pipeline_bind_point(vk::PipelineBindPoint::GRAPHICS)
                .input_attachments(&feedback_ref)
                .color_attachments(&feedback_ref)
        } else {
            vk::SubpassDescription::default()
                .pipeline_bind_point(vk::PipelineBindPoint::GRAPHICS)
                .color_attachments(&color_ref)
        };
        let subpasses = [board, overlay, decoration];

        let color_output = vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT;
        let dependencies = [
            vk::SubpassDependency::default()
                .src_subpass(vk::SUBPASS_EXTERNAL)
                .dst_subpass(Subpass::Board.index())
                .src_stage_mask(color_output | vk::PipelineStageFlags::EARLY_FRAGMENT_TESTS)
                .dst_stage_mask(color_output | vk::PipelineStageFlags::EARLY_FRAGMENT_TESTS)
                .dst_access_mask(
                    vk::AccessFlags::COLOR_ATTACHMENT_WRITE
                        | vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE,
                ),
            vk::SubpassDependency::default()
                .src_subpass(Subpass::Board.index())
                .dst_subpass(Subpass::Overlay.index())
                .src_stage_mask(color_output)
                .dst_stage_mask(color_output)
                .src_access_mask(vk::AccessFlags::COLOR_ATTACHMENT_WRITE)
                .dst_access_mask(
                    vk::AccessFlags::COLOR_ATTACHMENT_READ
                        | vk::AccessFlags::COLOR_ATTACHMENT_WRITE,
                )
                .dependency_flags(vk::DependencyFlags::BY_REGION),
            vk::SubpassDependency::default()
                .src_subpass(Subpass::Overlay.index())
                .dst_subpass(Subpass::Decoration.index())
                .src_stage_mask(color_output)
                .dst_stage_mask(vk::PipelineStageFlags::FRAGMENT_SHADER | color_output)
                .src_access_mask(vk::AccessFlags::COLOR_ATTACHMENT_WRITE)
                .dst_access_mask(
                    vk::AccessFlags::INPUT_ATTACHMENT_READ
                        | vk::AccessFlags::COLOR_ATTACHMENT_WRITE,
                )
                .dependency_flags(vk::DependencyFlags::BY_REGION),
        ];

        let create_info = vk::RenderPassCreateInfo::default()
            .attachments(&attachments)
            .subpasses(&subpasses)
            .dependencies(&dependencies);

        // SAFETY: every array referenced by create_info outlives the call.
        let render_pass = unsafe { device.handle().create_render_pass(&create_info, None)? };
        debug!(
            "Render pass created ({:?} color, {:?} depth, input attachment: {})",
            color_format, depth_format, input_attachment_usable
        );

        Ok(Self {
            device,
            render_pass,
            reads_input_attachment: input_attachment_usable,
        })
    }

    #[inline]
    pub fn handle(&self) -> vk::RenderPass {
        self.render_pass
    }

    #[inline]
    pub fn reads_input_attachment(&self) -> bool {
        self.reads_input_attachment
    }
}

impl Drop for RenderPass {
    fn drop(&mut self) {
        // SAFETY: framebuffers and pending submissions using the render pass
        // are gone before it is dropped.
        unsafe {
            self.device.handle().destroy_render_pass(self.render_pass, None);
        }
        debug!("Render pass destroyed");
    }
}
