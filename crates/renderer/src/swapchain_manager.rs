//! Swapchain lifecycle.
//!
//! The presentation chain, its image views and the per-image framebuffers are
//! one bundle ([`SwapchainState`]). The bundle is built and replaced as a
//! unit: the loop either sees a complete live bundle or none at all.
//!
//! ```text
//! Uninitialized -> Live -> Recreating -> Live -> ... -> Destroyed
//!                    \          \
//!                     `-> NotPresentable (zero-sized surface) <-'
//! ```

use modeler_platform::{Extent, WindowGeometry};
use tracing::{debug, info, warn};

use crate::gpu::{GpuDevice, ResourceCount};
use crate::{RenderError, RenderResult};

/// Lifecycle phase of the presentation chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapchainPhase {
    Uninitialized,
    Live,
    Recreating,
    /// The surface is zero-sized; nothing can be presented until it grows.
    NotPresentable,
    Destroyed,
}

/// Outcome of [`SwapchainManager::create`] and [`SwapchainManager::recreate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recreated {
    Live(Extent),
    NotPresentable,
}

/// The live presentation bundle.
pub struct SwapchainState<D: GpuDevice> {
    pub swapchain: D::Swapchain,
    pub views: D::ImageViews,
    pub framebuffers: D::Framebuffers,
    pub extent: Extent,
    pub image_count: usize,
    /// Incremented on every successful build; the first bundle is 1.
    pub generation: u64,
}

/// Builds, rebuilds and tears down the presentation bundle.
pub struct SwapchainManager<D: GpuDevice> {
    state: Option<SwapchainState<D>>,
    phase: SwapchainPhase,
    generation: u64,
}

impl<D: GpuDevice> Default for SwapchainManager<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: GpuDevice> SwapchainManager<D> {
    pub fn new() -> Self {
        Self {
            state: None,
            phase: SwapchainPhase::Uninitialized,
            generation: 0,
        }
    }

    /// Live bundle, if any.
    #[inline]
    pub fn state(&self) -> Option<&SwapchainState<D>> {
        self.state.as_ref()
    }

    #[inline]
    pub fn phase(&self) -> SwapchainPhase {
        self.phase
    }

    /// Generation of the last bundle built (0 before the first).
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether `geometry` calls for a different bundle than the live one.
    pub fn needs_rebuild(&self, geometry: &WindowGeometry) -> bool {
        match &self.state {
            Some(state) => state.extent != geometry.swapchain_extent(),
            None => true,
        }
    }

    /// Build the first bundle.
    pub fn create(&mut self, device: &mut D, geometry: &WindowGeometry) -> RenderResult<Recreated> {
        if self.phase != SwapchainPhase::Uninitialized {
            return Err(RenderError::InvalidState(format!(
                "swapchain create called while {:?}",
                self.phase
            )));
        }
        if !geometry.is_presentable() {
            info!("Initial surface is not presentable, waiting for a resize");
            self.phase = SwapchainPhase::NotPresentable;
            return Ok(Recreated::NotPresentable);
        }
        self.install(device, geometry.swapchain_extent(), None)
    }

    /// Replace the bundle for `geometry`.
    ///
    /// Waits for the device to go idle first, since in-flight command buffers
    /// reference the old framebuffers. The old views and framebuffers are
    /// destroyed before the new chain is created; the old chain itself is
    /// passed to the backend as the previous chain and destroyed right after.
    ///
    /// A zero-sized geometry is not an error: everything is released and
    /// [`Recreated::NotPresentable`] is returned.
    pub fn recreate(&mut self, device: &mut D, geometry: &WindowGeometry) -> RenderResult<Recreated> {
        if self.phase == SwapchainPhase::Destroyed {
            return Err(RenderError::InvalidState("swapchain recreate after destroy".into()));
        }
        self.phase = SwapchainPhase::Recreating;
        device.wait_idle()?;

        let previous = self.state.take().map(|state| {
            device.destroy_framebuffers(state.framebuffers);
            device.destroy_image_views(state.views);
            state.swapchain
        });

        if !geometry.is_presentable() {
            if let Some(old) = previous {
                device.destroy_swapchain(old);
            }
            info!(
                "Surface is {}x{}, presentation paused",
                geometry.surface.width, geometry.surface.height
            );
            self.phase = SwapchainPhase::NotPresentable;
            return Ok(Recreated::NotPresentable);
        }

        self.install(device, geometry.swapchain_extent(), previous)
    }

    /// Release the bundle. Safe to call more than once.
    ///
    /// The device must be idle.
    pub fn destroy(&mut self, device: &mut D) {
        if let Some(state) = self.state.take() {
            device.destroy_framebuffers(state.framebuffers);
            device.destroy_image_views(state.views);
            device.destroy_swapchain(state.swapchain);
            debug!("Swapchain generation {} destroyed", state.generation);
        }
        self.phase = SwapchainPhase::Destroyed;
    }

    fn install(
        &mut self,
        device: &mut D,
        extent: Extent,
        previous: Option<D::Swapchain>,
    ) -> RenderResult<Recreated> {
        match self.build(device, extent, previous) {
            Ok(Some(state)) => {
                let extent = state.extent;
                info!(
                    "Swapchain generation {} live: {}x{}, {} images",
                    state.generation, extent.width, extent.height, state.image_count
                );
                self.generation = state.generation;
                self.state = Some(state);
                self.phase = SwapchainPhase::Live;
                Ok(Recreated::Live(extent))
            }
            Ok(None) => {
                info!("Surface reports a zero extent, presentation paused");
                self.phase = SwapchainPhase::NotPresentable;
                Ok(Recreated::NotPresentable)
            }
            Err(e) => {
                self.phase = SwapchainPhase::Destroyed;
                Err(e)
            }
        }
    }

    /// Create the chain, views and framebuffers. Either all three exist on
    /// return or none do.
    fn build(
        &self,
        device: &mut D,
        extent: Extent,
        previous: Option<D::Swapchain>,
    ) -> RenderResult<Option<SwapchainState<D>>> {
        let created = device.create_swapchain(extent, previous.as_ref());
        if let Some(old) = previous {
            device.destroy_swapchain(old);
        }
        let Some(created) = created? else {
            return Ok(None);
        };

        let views = match device.create_image_views(&created.handle) {
            Ok(views) => views,
            Err(e) => {
                device.destroy_swapchain(created.handle);
                return Err(e);
            }
        };

        let framebuffers = match device.create_framebuffers(&views, created.extent) {
            Ok(framebuffers) => framebuffers,
            Err(e) => {
                device.destroy_image_views(views);
                device.destroy_swapchain(created.handle);
                return Err(e);
            }
        };

        if views.count() != created.image_count || framebuffers.count() != created.image_count {
            warn!(
                "Swapchain bundle mismatch: {} images, {} views, {} framebuffers",
                created.image_count,
                views.count(),
                framebuffers.count()
            );
            let message = format!(
                "{} images but {} views and {} framebuffers",
                created.image_count,
                views.count(),
                framebuffers.count()
            );
            device.destroy_framebuffers(framebuffers);
            device.destroy_image_views(views);
            device.destroy_swapchain(created.handle);
            return Err(RenderError::InvalidState(message));
        }

        Ok(Some(SwapchainState {
            swapchain: created.handle,
            views,
            framebuffers,
            extent: created.extent,
            image_count: created.image_count,
            generation: self.generation + 1,
        }))
    }
}
