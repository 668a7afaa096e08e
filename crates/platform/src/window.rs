//! Borderless window management using winit, and Vulkan surface creation.

use ash::vk;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use std::sync::Arc;
use winit::dpi::PhysicalSize;
use winit::event_loop::ActiveEventLoop;
use winit::window::{Window as WinitWindow, WindowAttributes};

use modeler_core::{Error, Result};

use crate::{Extent, WindowGeometry, WindowRegion};

/// RAII wrapper for a Vulkan surface.
///
/// The caller must ensure that the Vulkan instance outlives this surface.
pub struct Surface {
    handle: vk::SurfaceKHR,
    surface_loader: ash::khr::surface::Instance,
}

impl Surface {
    /// Get the raw Vulkan surface handle.
    #[inline]
    pub fn handle(&self) -> vk::SurfaceKHR {
        self.handle
    }

    /// Loader used for capability, format and present mode queries.
    #[inline]
    pub fn loader(&self) -> &ash::khr::surface::Instance {
        &self.surface_loader
    }
}

impl Drop for Surface {
    fn drop(&mut self) {
        // SAFETY: The surface handle was created by ash_window::create_surface
        // from the same instance as the loader, and is destroyed only here.
        unsafe {
            self.surface_loader.destroy_surface(self.handle, None);
        }
        tracing::debug!("Vulkan surface destroyed");
    }
}

/// The borderless application window.
///
/// The window draws its own chrome, so decorations are off and the margin
/// around the active area is transparent.
pub struct Window {
    window: Arc<WinitWindow>,
    geometry: WindowGeometry,
}

impl Window {
    /// Create the window sized to `geometry.surface` (logical pixels at scale 1).
    pub fn new(event_loop: &ActiveEventLoop, geometry: WindowGeometry, title: &str) -> Result<Self> {
        let attrs = WindowAttributes::default()
            .with_title(title)
            .with_inner_size(PhysicalSize::new(
                geometry.surface.width,
                geometry.surface.height,
            ))
            .with_decorations(false)
            .with_transparent(true)
            .with_resizable(true);

        let window = event_loop
            .create_window(attrs)
            .map_err(|e| Error::Window(e.to_string()))?;

        let size = window.inner_size();
        let geometry = WindowGeometry::windowed(
            Extent::new(size.width, size.height),
            window.scale_factor() as f32,
        );
        tracing::info!(
            "Window created: {}x{} (scale {})",
            size.width,
            size.height,
            geometry.scale
        );

        Ok(Self {
            window: Arc::new(window),
            geometry,
        })
    }

    /// Get a reference to the underlying winit window.
    pub fn inner(&self) -> &WinitWindow {
        &self.window
    }

    /// Shared handle for surface creation on the render thread.
    pub fn inner_arc(&self) -> Arc<WinitWindow> {
        self.window.clone()
    }

    pub fn geometry(&self) -> WindowGeometry {
        self.geometry
    }

    /// Recompute the geometry after a native resize and return it.
    pub fn resize(&mut self, width: u32, height: u32) -> WindowGeometry {
        self.geometry.scale = self.window.scale_factor() as f32;
        self.geometry = self.geometry.resized(Extent::new(width, height));
        tracing::debug!("Window resized: {}x{}", width, height);
        self.geometry
    }

    /// Switch between windowed and fullscreen layouts.
    pub fn set_fullscreen(&mut self, fullscreen: bool) {
        let mode = fullscreen.then_some(winit::window::Fullscreen::Borderless(None));
        self.window.set_fullscreen(mode);
        self.geometry.fullscreen = fullscreen;
        self.geometry = self.geometry.resized(self.geometry.surface);
    }

    /// Start an interactive move or resize for a press in `region`.
    pub fn begin_interaction(&self, region: WindowRegion) {
        let result = match region.resize_direction() {
            Some(direction) => self.window.drag_resize_window(direction),
            None if region == WindowRegion::Chrome => self.window.drag_window(),
            None => Ok(()),
        };
        if let Err(e) = result {
            tracing::warn!("Window interaction for {:?} failed: {}", region, e);
        }
    }

    pub fn request_redraw(&self) {
        self.window.request_redraw();
    }

    /// Create a Vulkan surface for this window.
    pub fn create_surface(&self, entry: &ash::Entry, instance: &ash::Instance) -> Result<Surface> {
        create_surface(&self.window, entry, instance)
    }
}

/// Create a Vulkan surface for a winit window.
///
/// Returns a RAII [`Surface`] that destroys the surface when dropped. The
/// instance must outlive it.
///
/// # Errors
/// Returns an error if the window handles are unavailable or surface creation
/// fails.
pub fn create_surface(
    window: &WinitWindow,
    entry: &ash::Entry,
    instance: &ash::Instance,
) -> Result<Surface> {
    let display_handle = window
        .display_handle()
        .map_err(|e| Error::Window(format!("Failed to get display handle: {}", e)))?;

    let window_handle = window
        .window_handle()
        .map_err(|e| Error::Window(format!("Failed to get window handle: {}", e)))?;

    // SAFETY: The entry and instance are valid references provided by the caller.
    // The display and window handles come from a live winit window.
    // The surface is destroyed in Surface::drop.
    let handle = unsafe {
        ash_window::create_surface(
            entry,
            instance,
            display_handle.as_raw(),
            window_handle.as_raw(),
            None,
        )
        .map_err(|e| Error::Surface(format!("Failed to create Vulkan surface: {}", e)))?
    };

    let surface_loader = ash::khr::surface::Instance::new(entry, instance);

    tracing::info!("Vulkan surface created");

    Ok(Surface {
        handle,
        surface_loader,
    })
}

/// Get the Vulkan instance extensions required to create a surface for the
/// given display.
///
/// The returned pointers refer to static strings owned by the Vulkan loader.
pub fn get_required_extensions(
    display_handle: raw_window_handle::RawDisplayHandle,
) -> Result<Vec<*const i8>> {
    let extensions = ash_window::enumerate_required_extensions(display_handle)
        .map_err(|e| Error::Surface(format!("Failed to enumerate required extensions: {}", e)))?;

    tracing::debug!(
        "Required Vulkan extensions for surface: {:?}",
        extensions
            .iter()
            // SAFETY: ash_window guarantees these are valid, null-terminated
            // static strings.
            .map(|&ext| unsafe { std::ffi::CStr::from_ptr(ext) })
            .collect::<Vec<_>>()
    );

    Ok(extensions.to_vec())
}
