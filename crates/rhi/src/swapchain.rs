//! Presentation chain objects.
//!
//! [`Swapchain`] owns the `VkSwapchainKHR` and knows how to acquire and
//! present. [`SwapchainImageViews`] owns one view per swapchain image. Both are
//! created and destroyed independently so callers can rebuild the views and
//! framebuffers while keeping the old chain alive for `old_swapchain`.

use std::sync::Arc;

use ash::vk;
use tracing::{debug, info, warn};

use crate::device::Device;
use crate::error::{RhiError, RhiResult};

/// What a surface supports for swapchain creation.
#[derive(Debug, Clone)]
pub struct SwapchainSupportDetails {
    pub capabilities: vk::SurfaceCapabilitiesKHR,
    pub formats: Vec<vk::SurfaceFormatKHR>,
    pub present_modes: Vec<vk::PresentModeKHR>,
}

impl SwapchainSupportDetails {
    pub fn query(
        physical_device: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
        surface_loader: &ash::khr::surface::Instance,
    ) -> RhiResult<Self> {
        // SAFETY: the physical device and surface belong to the same instance.
        let (capabilities, formats, present_modes) = unsafe {
            (
                surface_loader.get_physical_device_surface_capabilities(physical_device, surface)?,
                surface_loader.get_physical_device_surface_formats(physical_device, surface)?,
                surface_loader
                    .get_physical_device_surface_present_modes(physical_device, surface)?,
            )
        };

        Ok(Self {
            capabilities,
            formats,
            present_modes,
        })
    }

    #[inline]
    pub fn is_adequate(&self) -> bool {
        !self.formats.is_empty() && !self.present_modes.is_empty()
    }
}

/// Vulkan swapchain and its images.
pub struct Swapchain {
    device: Arc<Device>,
    loader: ash::khr::swapchain::Device,
    swapchain: vk::SwapchainKHR,
    images: Vec<vk::Image>,
    format: vk::Format,
    extent: vk::Extent2D,
}

impl Swapchain {
    /// Create a swapchain for `surface` at `desired` size.
    ///
    /// `previous` is handed to the driver as `old_swapchain`; it is retired but
    /// not destroyed, that stays with the caller.
    ///
    /// Returns `Ok(None)` when the surface currently reports a zero extent
    /// (minimized window), which is not an error.
    pub fn new(
        device: Arc<Device>,
        loader: &ash::khr::swapchain::Device,
        surface: vk::SurfaceKHR,
        surface_loader: &ash::khr::surface::Instance,
        desired: vk::Extent2D,
        previous: Option<&Swapchain>,
    ) -> RhiResult<Option<Self>> {
        let support =
            SwapchainSupportDetails::query(device.physical_device(), surface, surface_loader)?;
        if !support.is_adequate() {
            return Err(RhiError::SwapchainError(
                "surface reports no formats or present modes".to_string(),
            ));
        }

        let extent = choose_extent(&support.capabilities, desired);
        if extent.width == 0 || extent.height == 0 {
            debug!("Surface extent is {}x{}, not presentable", extent.width, extent.height);
            return Ok(None);
        }

        let surface_format = choose_surface_format(&support.formats)?;
        let present_mode = choose_present_mode(&support.present_modes);
        let image_count = determine_image_count(&support.capabilities);
        let composite_alpha = choose_composite_alpha(&support.capabilities);
        let image_usage = vk::ImageUsageFlags::COLOR_ATTACHMENT
            | (support.capabilities.supported_usage_flags & vk::ImageUsageFlags::INPUT_ATTACHMENT);

        let queue_families = device.queue_families();
        let (Some(graphics_family), Some(present_family)) =
            (queue_families.graphics_family, queue_families.present_family)
        else {
            return Err(RhiError::SwapchainError("queue families incomplete".to_string()));
        };
        let family_indices = [graphics_family, present_family];
        let (sharing_mode, family_indices) = if graphics_family != present_family {
            (vk::SharingMode::CONCURRENT, &family_indices[..])
        } else {
            (vk::SharingMode::EXCLUSIVE, &[][..])
        };

        let create_info = vk::SwapchainCreateInfoKHR::default()
            .surface(surface)
            .min_image_count(image_count)
            .image_format(surface_format.format)
            .image_color_space(surface_format.color_space)
            .image_extent(extent)
            .image_array_layers(1)
            .image_usage(image_usage)
            .image_sharing_mode(sharing_mode)
            .queue_family_indices(family_indices)
            .pre_transform(support.capabilities.current_transform)
            .composite_alpha(composite_alpha)
            .present_mode(present_mode)
            .clipped(true)
            .old_swapchain(previous.map_or(vk::SwapchainKHR::null(), |p| p.swapchain));

        // SAFETY: the surface is alive and, if set, the old swapchain belongs
        // to the same surface and device.
        let swapchain = unsafe { loader.create_swapchain(&create_info, None)? };
        // SAFETY: the swapchain was just created.
        let images = match unsafe { loader.get_swapchain_images(swapchain) } {
            Ok(images) => images,
            Err(e) => {
                // SAFETY: nothing references the new swapchain yet.
                unsafe { loader.destroy_swapchain(swapchain, None) };
                return Err(e.into());
            }
        };

        info!(
            "Swapchain created: {}x{}, {:?}, {:?}, {} images",
            extent.width,
            extent.height,
            surface_format.format,
            present_mode,
            images.len()
        );

        Ok(Some(Self {
            device,
            loader: loader.clone(),
            swapchain,
            images,
            format: surface_format.format,
            extent,
        }))
    }

    /// Acquire the next image, signaling `semaphore` when it is ready.
    ///
    /// Returns `(image_index, suboptimal)`.
    pub fn acquire_next_image(&self, semaphore: vk::Semaphore) -> Result<(u32, bool), vk::Result> {
        // SAFETY: the swapchain and semaphore are alive; the semaphore is
        // unsignaled with no pending signal operation.
        unsafe {
            self.loader
                .acquire_next_image(self.swapchain, u64::MAX, semaphore, vk::Fence::null())
        }
    }

    /// Queue `image_index` for presentation once `wait_semaphore` signals.
    ///
    /// Returns `true` if the swapchain is suboptimal.
    pub fn present(
        &self,
        queue: vk::Queue,
        image_index: u32,
        wait_semaphore: vk::Semaphore,
    ) -> Result<bool, vk::Result> {
        let swapchains = [self.swapchain];
        let image_indices = [image_index];
        let wait_semaphores = [wait_semaphore];

        let present_info = vk::PresentInfoKHR::default()
            .wait_semaphores(&wait_semaphores)
            .swapchains(&swapchains)
            .image_indices(&image_indices);

        // SAFETY: the image was acquired from this swapchain and the queue
        // supports presentation.
        unsafe { self.loader.queue_present(queue, &present_info) }
    }

    #[inline]
    pub fn handle(&self) -> vk::SwapchainKHR {
        self.swapchain
    }

    #[inline]
    pub fn format(&self) -> vk::Format {
        self.format
    }

    #[inline]
    pub fn extent(&self) -> vk::Extent2D {
        self.extent
    }

    #[inline]
    pub fn images(&self) -> &[vk::Image] {
        &self.images
    }

    #[inline]
    pub fn image_count(&self) -> usize {
        self.images.len()
    }
}

impl Drop for Swapchain {
    fn drop(&mut self) {
        // SAFETY: the caller idles the device before dropping a swapchain, and
        // views of its images are dropped first.
        unsafe {
            self.loader.destroy_swapchain(self.swapchain, None);
        }
        info!(
            "Swapchain destroyed (was {}x{}, {} images)",
            self.extent.width,
            self.extent.height,
            self.images.len()
        );
    }
}

/// One color view per swapchain image.
pub struct SwapchainImageViews {
    device: Arc<Device>,
    views: Vec<vk::ImageView>,
}

impl SwapchainImageViews {
    pub fn new(device: Arc<Device>, swapchain: &Swapchain) -> RhiResult<Self> {
        let mut views = Self {
            device,
            views: Vec::with_capacity(swapchain.image_count()),
        };

        for (i, &image) in swapchain.images().iter().enumerate() {
            let create_info = vk::ImageViewCreateInfo::default()
                .image(image)
                .view_type(vk::ImageViewType::TYPE_2D)
                .format(swapchain.format())
                .subresource_range(
                    vk::ImageSubresourceRange::default()
                        .aspect_mask(vk::ImageAspectFlags::COLOR)
                        .level_count(1)
                        .layer_count(1),
                );

            // SAFETY: the image belongs to a live swapchain on this device.
            // On failure the views created so far are released by Drop.
            let view = unsafe {
                views
                    .device
                    .handle()
                    .create_image_view(&create_info, None)
                    .map_err(|e| {
                        RhiError::SwapchainError(format!("Failed to create image view {}: {:?}", i, e))
                    })?
            };
            views.views.push(view);
        }

        debug!("Created {} swapchain image views", views.views.len());
        Ok(views)
    }

    #[inline]
    pub fn views(&self) -> &[vk::ImageView] {
        &self.views
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.views.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }
}

impl Drop for SwapchainImageViews {
    fn drop(&mut self) {
        for &view in &self.views {
            // SAFETY: framebuffers using these views are dropped first and the
            // device is idle.
            unsafe {
                self.device.handle().destroy_image_view(view, None);
            }
        }
        debug!("Destroyed {} swapchain image views", self.views.len());
    }
}

/// Prefers B8G8R8A8_SRGB / SRGB_NONLINEAR, then B8G8R8A8_UNORM, then the first
/// format reported.
pub fn choose_surface_format(formats: &[vk::SurfaceFormatKHR]) -> RhiResult<vk::SurfaceFormatKHR> {
    let preferred = [vk::Format::B8G8R8A8_SRGB, vk::Format::B8G8R8A8_UNORM];
    for wanted in preferred {
        if let Some(&format) = formats.iter().find(|f| {
            f.format == wanted && f.color_space == vk::ColorSpaceKHR::SRGB_NONLINEAR
        }) {
            return Ok(format);
        }
    }

    let first = formats
        .first()
        .copied()
        .ok_or_else(|| RhiError::SwapchainError("no surface formats".to_string()))?;
    warn!("Using first available surface format: {:?}", first.format);
    Ok(first)
}

/// MAILBOX when available, otherwise FIFO (always supported).
fn choose_present_mode(present_modes: &[vk::PresentModeKHR]) -> vk::PresentModeKHR {
    if present_modes.contains(&vk::PresentModeKHR::MAILBOX) {
        vk::PresentModeKHR::MAILBOX
    } else {
        vk::PresentModeKHR::FIFO
    }
}

/// The surface's current extent when it dictates one, otherwise `desired`
/// clamped to the supported range.
pub fn choose_extent(capabilities: &vk::SurfaceCapabilitiesKHR, desired: vk::Extent2D) -> vk::Extent2D {
    if capabilities.current_extent.width != u32::MAX {
        return capabilities.current_extent;
    }

    vk::Extent2D {
        width: desired.width.clamp(
            capabilities.min_image_extent.width,
            capabilities.max_image_extent.width,
        ),
        height: desired.height.clamp(
            capabilities.min_image_extent.height,
            capabilities.max_image_extent.height,
        ),
    }
}

/// One more than the minimum, capped by the maximum when there is one.
fn determine_image_count(capabilities: &vk::SurfaceCapabilitiesKHR) -> u32 {
    let preferred = capabilities.min_image_count + 1;
    if capabilities.max_image_count > 0 {
        preferred.min(capabilities.max_image_count)
    } else {
        preferred
    }
}

/// The window has a transparent margin, so premultiplied alpha is preferred.
fn choose_composite_alpha(capabilities: &vk::SurfaceCapabilitiesKHR) -> vk::CompositeAlphaFlagsKHR {
    [
        vk::CompositeAlphaFlagsKHR::PRE_MULTIPLIED,
        vk::CompositeAlphaFlagsKHR::OPAQUE,
        vk::CompositeAlphaFlagsKHR::INHERIT,
    ]
    .into_iter()
    .find(|mode| capabilities.supported_composite_alpha.contains(*mode))
    .unwrap_or(vk::CompositeAlphaFlagsKHR::OPAQUE)
}
