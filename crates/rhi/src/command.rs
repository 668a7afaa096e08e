//! Command pool and command buffer wrappers.
//!
//! - [`CommandPool`] owns a `VkCommandPool` and allocates from it
//! - [`CommandBuffer`] records the render-pass level commands the frame needs

use std::sync::Arc;

use ash::vk;
use tracing::debug;

use crate::device::Device;
use crate::error::RhiResult;

/// Vulkan command pool.
///
/// Created with `RESET_COMMAND_BUFFER` so each frame slot can reset its own
/// buffer. Not thread-safe; the render thread is its only user.
pub struct CommandPool {
    device: Arc<Device>,
    pool: vk::CommandPool,
    queue_family_index: u32,
}

impl CommandPool {
    pub fn new(device: Arc<Device>, queue_family_index: u32) -> RhiResult<Self> {
        let create_info = vk::CommandPoolCreateInfo::default()
            .queue_family_index(queue_family_index)
            .flags(vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER);

        // SAFETY: the device is alive for the lifetime of the pool.
        let pool = unsafe { device.handle().create_command_pool(&create_info, None)? };
        debug!("Command pool created for queue family {}", queue_family_index);

        Ok(Self {
            device,
            pool,
            queue_family_index,
        })
    }

    #[inline]
    pub fn handle(&self) -> vk::CommandPool {
        self.pool
    }

    /// Allocate one primary command buffer.
    pub fn allocate(&self) -> RhiResult<CommandBuffer> {
        let allocate_info = vk::CommandBufferAllocateInfo::default()
            .command_pool(self.pool)
            .level(vk::CommandBufferLevel::PRIMARY)
            .command_buffer_count(1);

        // SAFETY: the pool is alive and used only from this thread.
        let buffers = unsafe { self.device.handle().allocate_command_buffers(&allocate_info)? };
        Ok(CommandBuffer {
            device: self.device.clone(),
            buffer: buffers[0],
        })
    }
}

impl Drop for CommandPool {
    fn drop(&mut self) {
        // SAFETY: no buffer from this pool is pending; freeing the pool frees
        // every buffer allocated from it.
        unsafe {
            self.device.handle().destroy_command_pool(self.pool, None);
        }
        debug!(
            "Command pool destroyed for queue family {}",
            self.queue_family_index
        );
    }
}

/// A primary command buffer.
///
/// Does not own the handle; it is freed with its [`CommandPool`].
#[derive(Clone)]
pub struct CommandBuffer {
    device: Arc<Device>,
    buffer: vk::CommandBuffer,
}

impl CommandBuffer {
    #[inline]
    pub fn handle(&self) -> vk::CommandBuffer {
        self.buffer
    }

    // =========================================================================
    // Recording Control
    // =========================================================================

    /// Begin one-time-submit recording.
    pub fn begin(&self) -> RhiResult<()> {
        let begin_info = vk::CommandBufferBeginInfo::default()
            .flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);
        // SAFETY: the buffer is not pending (its slot fence has signaled).
        unsafe {
            self.device
                .handle()
                .begin_command_buffer(self.buffer, &begin_info)?;
        }
        Ok(())
    }

    pub fn end(&self) -> RhiResult<()> {
        // SAFETY: the buffer is recording.
        unsafe {
            self.device.handle().end_command_buffer(self.buffer)?;
        }
        Ok(())
    }

    pub fn reset(&self) -> RhiResult<()> {
        // SAFETY: the buffer is not pending.
        unsafe {
            self.device
                .handle()
                .reset_command_buffer(self.buffer, vk::CommandBufferResetFlags::empty())?;
        }
        Ok(())
    }

    // =========================================================================
    // Render Pass
    // =========================================================================

    pub fn begin_render_pass(&self, begin_info: &vk::RenderPassBeginInfo) {
        // SAFETY: the buffer is recording outside a render pass.
        unsafe {
            self.device.handle().cmd_begin_render_pass(
                self.buffer,
                begin_info,
                vk::SubpassContents::INLINE,
            );
        }
    }

    pub fn next_subpass(&self) {
        // SAFETY: the buffer is inside a render pass with a following subpass.
        unsafe {
            self.device
                .handle()
                .cmd_next_subpass(self.buffer, vk::SubpassContents::INLINE);
        }
    }

    pub fn end_render_pass(&self) {
        // SAFETY: the buffer is in the last subpass of a render pass.
        unsafe {
            self.device.handle().cmd_end_render_pass(self.buffer);
        }
    }

    // =========================================================================
    // Dynamic State
    // =========================================================================

    pub fn set_viewport(&self, viewport: &vk::Viewport) {
        // SAFETY: the buffer is recording.
        unsafe {
            self.device
                .handle()
                .cmd_set_viewport(self.buffer, 0, std::slice::from_ref(viewport));
        }
    }

    pub fn set_scissor(&self, scissor: &vk::Rect2D) {
        // SAFETY: the buffer is recording.
        unsafe {
            self.device
                .handle()
                .cmd_set_scissor(self.buffer, 0, std::slice::from_ref(scissor));
        }
    }

    // =========================================================================
    // Attachment Writes
    // =========================================================================

    /// Clear a region of a color attachment of the current subpass.
    pub fn clear_color_rect(&self, attachment: u32, color: [f32; 4], rect: vk::Rect2D) {
        let clear = vk::ClearAttachment {
            aspect_mask: vk::ImageAspectFlags::COLOR,
            color_attachment: attachment,
            clear_value: vk::ClearValue {
                color: vk::ClearColorValue { float32: color },
            },
        };
        let region = vk::ClearRect {
            rect,
            base_array_layer: 0,
            layer_count: 1,
        };
        // SAFETY: the buffer is inside a render pass whose current subpass
        // has `attachment` as a color attachment; the rect lies in the render
        // area (callers clip it).
        unsafe {
            self.device.handle().cmd_clear_attachments(
                self.buffer,
                std::slice::from_ref(&clear),
                std::slice::from_ref(&region),
            );
        }
    }
}
