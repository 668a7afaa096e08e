//! Vulkan implementation of [`GpuDevice`].

use std::mem::ManuallyDrop;
use std::sync::Arc;
use std::time::Duration;

use ash::vk;
use modeler_core::RenderConfig;
use modeler_platform::{Extent, Rect, Surface, create_surface, get_required_extensions};
use modeler_rhi::command::{CommandBuffer, CommandPool};
use modeler_rhi::depth::{DepthBuffer, find_depth_format};
use modeler_rhi::device::Device;
use modeler_rhi::framebuffer::Framebuffers;
use modeler_rhi::instance::Instance;
use modeler_rhi::physical_device::select_physical_device;
use modeler_rhi::render_pass::{COLOR_ATTACHMENT, RenderPass};
use modeler_rhi::swapchain::{Swapchain, SwapchainImageViews, SwapchainSupportDetails, choose_surface_format};
use modeler_rhi::sync::SlotSync;
use raw_window_handle::HasDisplayHandle;
use tracing::{error, info};
use winit::window::Window as WinitWindow;

use crate::gpu::{
    CommandTarget, CreatedSwapchain, GpuDevice, PresentationResult, ResourceCount, SlotStatus,
};
use crate::{RenderError, RenderResult};

/// Objects owned by one frame slot.
pub struct VulkanSlot {
    sync: SlotSync,
    command_buffer: CommandBuffer,
}

/// Command buffer currently recording a frame.
struct Recording {
    cmd: CommandBuffer,
    extent: Extent,
    clip: Rect,
}

impl ResourceCount for SwapchainImageViews {
    fn count(&self) -> usize {
        self.len()
    }
}

impl ResourceCount for Framebuffers {
    fn count(&self) -> usize {
        self.len()
    }
}

/// The render thread's Vulkan device.
///
/// Owns the instance, surface, logical device, render pass and the command
/// pool the frame slots allocate from. Swapchain bundles and slots are owned
/// by the render loop and handed back through the [`GpuDevice`] methods.
pub struct VulkanDevice {
    recording: Option<Recording>,
    clear_color: [f32; 4],
    depth_format: vk::Format,
    swapchain_loader: ash::khr::swapchain::Device,

    // Destroyed in this order on drop
    command_pool: ManuallyDrop<CommandPool>,
    render_pass: ManuallyDrop<RenderPass>,
    device: ManuallyDrop<Arc<Device>>,
    surface: ManuallyDrop<Surface>,
    instance: ManuallyDrop<Instance>,

    // The native window must outlive its surface.
    _window: Arc<WinitWindow>,
}

impl VulkanDevice {
    /// Bring up Vulkan for `window`.
    pub fn new(window: Arc<WinitWindow>, config: &RenderConfig) -> RenderResult<Self> {
        let display_handle = window
            .display_handle()
            .map_err(|e| RenderError::Startup(format!("Failed to get display handle: {}", e)))?;
        let extensions = get_required_extensions(display_handle.as_raw())?;

        let instance = Instance::new(c"Modeler", &extensions, config.validation)?;
        let surface = create_surface(&window, instance.entry(), instance.handle())?;

        let physical_device =
            select_physical_device(instance.handle(), surface.handle(), surface.loader())?;
        info!(
            "Using GPU: {} ({})",
            physical_device.device_name(),
            physical_device.device_type_name()
        );
        let device = Device::new(&instance, &physical_device)?;

        let support = SwapchainSupportDetails::query(
            physical_device.device,
            surface.handle(),
            surface.loader(),
        )?;
        let surface_format = choose_surface_format(&support.formats)?;
        let depth_format = find_depth_format(instance.handle(), &device)?;
        let input_attachment = support
            .capabilities
            .supported_usage_flags
            .contains(vk::ImageUsageFlags::INPUT_ATTACHMENT);
        let render_pass = RenderPass::new(
            device.clone(),
            surface_format.format,
            depth_format,
            input_attachment,
        )?;

        let graphics_family = device
            .queue_families()
            .graphics_family
            .ok_or_else(|| RenderError::Startup("no graphics queue family".into()))?;
        let command_pool = CommandPool::new(device.clone(), graphics_family)?;
        let swapchain_loader = ash::khr::swapchain::Device::new(instance.handle(), device.handle());

        info!(
            "Vulkan device ready: {:?} color, {:?} depth, decoration input attachment {}",
            surface_format.format,
            depth_format,
            if input_attachment { "on" } else { "off" }
        );

        Ok(Self {
            recording: None,
            clear_color: config.clear_color,
            depth_format,
            swapchain_loader,
            command_pool: ManuallyDrop::new(command_pool),
            render_pass: ManuallyDrop::new(render_pass),
            device: ManuallyDrop::new(device),
            surface: ManuallyDrop::new(surface),
            instance: ManuallyDrop::new(instance),
            _window: window,
        })
    }
}

impl CommandTarget for VulkanDevice {
    fn set_viewport(&mut self, rect: Rect) {
        let Some(recording) = self.recording.as_mut() else {
            return;
        };
        let bounds = Rect::new(0, 0, recording.extent.width, recording.extent.height);
        recording.clip = rect.intersect(&bounds).unwrap_or_default();

        let viewport = vk::Viewport {
            x: rect.x as f32,
            y: rect.y as f32,
            width: rect.width.max(1) as f32,
            height: rect.height.max(1) as f32,
            min_depth: 0.0,
            max_depth: 1.0,
        };
        recording.cmd.set_viewport(&viewport);
        recording.cmd.set_scissor(&to_vk_rect(recording.clip));
    }

    fn fill_rect(&mut self, rect: Rect, color: [f32; 4]) {
        let Some(recording) = self.recording.as_ref() else {
            return;
        };
        // Attachment clears ignore the scissor, so clip here.
        if let Some(clipped) = rect.intersect(&recording.clip) {
            recording
                .cmd
                .clear_color_rect(COLOR_ATTACHMENT, color, to_vk_rect(clipped));
        }
    }
}

impl GpuDevice for VulkanDevice {
    type Slot = VulkanSlot;
    type Swapchain = Swapchain;
    type ImageViews = SwapchainImageViews;
    type Framebuffers = Framebuffers;

    fn create_frame_slot(&mut self, _index: usize) -> RenderResult<VulkanSlot> {
        Ok(VulkanSlot {
            sync: SlotSync::new(Arc::clone(&self.device))?,
            command_buffer: self.command_pool.allocate()?,
        })
    }

    fn destroy_frame_slot(&mut self, slot: VulkanSlot) {
        drop(slot);
    }

    fn wait_for_slot(&mut self, slot: &VulkanSlot, timeout: Duration) -> RenderResult<SlotStatus> {
        Ok(if slot.sync.in_flight.wait(timeout)? {
            SlotStatus::Reusable
        } else {
            SlotStatus::TimedOut
        })
    }

    fn reset_slot(&mut self, slot: &VulkanSlot) -> RenderResult<()> {
        slot.sync.in_flight.reset()?;
        Ok(())
    }

    fn wait_idle(&mut self) -> RenderResult<()> {
        self.device.wait_idle()?;
        Ok(())
    }

    fn create_swapchain(
        &mut self,
        extent: Extent,
        previous: Option<&Swapchain>,
    ) -> RenderResult<Option<CreatedSwapchain<Swapchain>>> {
        let swapchain = Swapchain::new(
            Arc::clone(&self.device),
            &self.swapchain_loader,
            self.surface.handle(),
            self.surface.loader(),
            vk::Extent2D {
                width: extent.width,
                height: extent.height,
            },
            previous,
        )?;

        Ok(swapchain.map(|swapchain| {
            let actual = swapchain.extent();
            CreatedSwapchain {
                extent: Extent::new(actual.width, actual.height),
                image_count: swapchain.image_count(),
                handle: swapchain,
            }
        }))
    }

    fn destroy_swapchain(&mut self, swapchain: Swapchain) {
        drop(swapchain);
    }

    fn create_image_views(&mut self, swapchain: &Swapchain) -> RenderResult<SwapchainImageViews> {
        Ok(SwapchainImageViews::new(Arc::clone(&self.device), swapchain)?)
    }

    fn destroy_image_views(&mut self, views: SwapchainImageViews) {
        drop(views);
    }

    fn create_framebuffers(
        &mut self,
        views: &SwapchainImageViews,
        extent: Extent,
    ) -> RenderResult<Framebuffers> {
        let depth = DepthBuffer::new(
            Arc::clone(&self.device),
            vk::Extent2D {
                width: extent.width,
                height: extent.height,
            },
            self.depth_format,
        )?;
        Ok(Framebuffers::new(
            Arc::clone(&self.device),
            &self.render_pass,
            views,
            depth,
        )?)
    }

    fn destroy_framebuffers(&mut self, framebuffers: Framebuffers) {
        drop(framebuffers);
    }

    fn acquire_next_image(&mut self, swapchain: &Swapchain, slot: &VulkanSlot) -> PresentationResult<u32> {
        match swapchain.acquire_next_image(slot.sync.image_available.handle()) {
            Ok((index, false)) => PresentationResult::Success(index),
            Ok((index, true)) => PresentationResult::SuboptimalButUsable(index),
            Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => PresentationResult::OutOfDate,
            Err(e) => PresentationResult::Fatal(e.to_string()),
        }
    }

    fn begin_frame(
        &mut self,
        slot: &VulkanSlot,
        framebuffers: &Framebuffers,
        image_index: u32,
        extent: Extent,
    ) -> RenderResult<()> {
        let framebuffer = framebuffers.get(image_index as usize).ok_or_else(|| {
            RenderError::InvalidState(format!("no framebuffer for swapchain image {}", image_index))
        })?;

        let cmd = &slot.command_buffer;
        cmd.reset()?;
        cmd.begin()?;

        let clear_values = [
            vk::ClearValue {
                color: vk::ClearColorValue {
                    float32: self.clear_color,
                },
            },
            vk::ClearValue {
                depth_stencil: vk::ClearDepthStencilValue {
                    depth: 1.0,
                    stencil: 0,
                },
            },
        ];
        let full = Rect::new(0, 0, extent.width, extent.height);
        let render_pass_info = vk::RenderPassBeginInfo::default()
            .render_pass(self.render_pass.handle())
            .framebuffer(framebuffer)
            .render_area(to_vk_rect(full))
            .clear_values(&clear_values);
        cmd.begin_render_pass(&render_pass_info);

        self.recording = Some(Recording {
            cmd: cmd.clone(),
            extent,
            clip: full,
        });
        Ok(())
    }

    fn next_pass(&mut self) {
        if let Some(recording) = self.recording.as_ref() {
            recording.cmd.next_subpass();
        }
    }

    fn end_frame(&mut self) -> RenderResult<()> {
        let recording = self
            .recording
            .take()
            .ok_or_else(|| RenderError::InvalidState("no frame is being recorded".into()))?;
        recording.cmd.end_render_pass();
        recording.cmd.end()?;
        Ok(())
    }

    fn submit(&mut self, slot: &VulkanSlot) -> RenderResult<()> {
        let wait_semaphores = [slot.sync.image_available.handle()];
        let wait_stages = [vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT];
        let signal_semaphores = [slot.sync.render_finished.handle()];
        let command_buffers = [slot.command_buffer.handle()];

        let submit_info = vk::SubmitInfo::default()
            .wait_semaphores(&wait_semaphores)
            .wait_dst_stage_mask(&wait_stages)
            .command_buffers(&command_buffers)
            .signal_semaphores(&signal_semaphores);

        // SAFETY: the command buffer finished recording in end_frame, the
        // acquire armed image_available, and the fence was reset just before.
        unsafe {
            self.device
                .submit_graphics(&submit_info, slot.sync.in_flight.handle())?;
        }
        Ok(())
    }

    fn present(&mut self, swapchain: &Swapchain, slot: &VulkanSlot, image_index: u32) -> PresentationResult {
        match swapchain.present(
            self.device.present_queue(),
            image_index,
            slot.sync.render_finished.handle(),
        ) {
            Ok(false) => PresentationResult::Success(()),
            Ok(true) | Err(vk::Result::SUBOPTIMAL_KHR) => PresentationResult::SuboptimalButUsable(()),
            Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => PresentationResult::OutOfDate,
            Err(e) => PresentationResult::Fatal(e.to_string()),
        }
    }
}

impl Drop for VulkanDevice {
    fn drop(&mut self) {
        if let Err(e) = self.device.wait_idle() {
            error!("Failed to wait for device idle during Vulkan teardown: {:?}", e);
        }
        self.recording = None;

        // SAFETY: each field is dropped exactly once, children before the
        // device, the device before the surface and the surface before the
        // instance.
        unsafe {
            ManuallyDrop::drop(&mut self.command_pool);
            ManuallyDrop::drop(&mut self.render_pass);
            ManuallyDrop::drop(&mut self.device);
            ManuallyDrop::drop(&mut self.surface);
            ManuallyDrop::drop(&mut self.instance);
        }
        info!("Vulkan device destroyed");
    }
}

fn to_vk_rect(rect: Rect) -> vk::Rect2D {
    vk::Rect2D {
        offset: vk::Offset2D {
            x: rect.x,
            y: rect.y,
        },
        extent: vk::Extent2D {
            width: rect.width,
            height: rect.height,
        },
    }
}
