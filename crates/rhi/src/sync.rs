//! Semaphores and fences.
//!
//! - [`Semaphore`] orders GPU work against other GPU work (acquire, submit, present).
//! - [`Fence`] lets the host wait for a submission to finish.
//! - [`SlotSync`] bundles the three objects one frame slot needs.

use std::sync::Arc;
use std::time::Duration;

use ash::vk;
use tracing::debug;

use crate::device::Device;
use crate::error::RhiResult;

/// Vulkan semaphore, destroyed on drop.
pub struct Semaphore {
    device: Arc<Device>,
    semaphore: vk::Semaphore,
}

impl Semaphore {
    /// Create an unsignaled binary semaphore.
    pub fn new(device: Arc<Device>) -> RhiResult<Self> {
        let create_info = vk::SemaphoreCreateInfo::default();
        // SAFETY: the device is alive for the lifetime of the semaphore.
        let semaphore = unsafe { device.handle().create_semaphore(&create_info, None)? };
        Ok(Self { device, semaphore })
    }

    #[inline]
    pub fn handle(&self) -> vk::Semaphore {
        self.semaphore
    }
}

impl Drop for Semaphore {
    fn drop(&mut self) {
        // SAFETY: the owner guarantees no pending queue operation references
        // the semaphore (the device is idle or its slot fence has signaled).
        unsafe {
            self.device.handle().destroy_semaphore(self.semaphore, None);
        }
    }
}

/// Vulkan fence, destroyed on drop.
pub struct Fence {
    device: Arc<Device>,
    fence: vk::Fence,
}

impl Fence {
    /// Create a fence, optionally already signaled so the first wait returns
    /// immediately.
    pub fn new(device: Arc<Device>, signaled: bool) -> RhiResult<Self> {
        let flags = if signaled {
            vk::FenceCreateFlags::SIGNALED
        } else {
            vk::FenceCreateFlags::empty()
        };
        let create_info = vk::FenceCreateInfo::default().flags(flags);
        // SAFETY: the device is alive for the lifetime of the fence.
        let fence = unsafe { device.handle().create_fence(&create_info, None)? };
        Ok(Self { device, fence })
    }

    #[inline]
    pub fn handle(&self) -> vk::Fence {
        self.fence
    }

    /// Wait for the fence to signal.
    ///
    /// Returns `Ok(false)` if `timeout` elapsed first. Any other failure
    /// (including device loss) is an error.
    pub fn wait(&self, timeout: Duration) -> RhiResult<bool> {
        let nanos = u64::try_from(timeout.as_nanos()).unwrap_or(u64::MAX);
        // SAFETY: the fence belongs to this device.
        let result = unsafe {
            self.device
                .handle()
                .wait_for_fences(std::slice::from_ref(&self.fence), true, nanos)
        };
        match result {
            Ok(()) => Ok(true),
            Err(vk::Result::TIMEOUT) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Return the fence to the unsignaled state.
    ///
    /// The fence must not be referenced by a pending submission.
    pub fn reset(&self) -> RhiResult<()> {
        // SAFETY: upheld by the caller as documented.
        unsafe {
            self.device
                .handle()
                .reset_fences(std::slice::from_ref(&self.fence))?
        };
        Ok(())
    }
}

impl Drop for Fence {
    fn drop(&mut self) {
        // SAFETY: the owner waits for the fence (or device idle) before drop.
        unsafe {
            self.device.handle().destroy_fence(self.fence, None);
        }
    }
}

/// Synchronization objects owned by one frame slot.
///
/// ```text
/// wait(in_flight) -> acquire(signals image_available)
///   -> submit(waits image_available, signals render_finished + in_flight)
///   -> present(waits render_finished)
/// ```
pub struct SlotSync {
    pub image_available: Semaphore,
    pub render_finished: Semaphore,
    pub in_flight: Fence,
}

impl SlotSync {
    /// Create the objects for one slot. The fence starts signaled so the
    /// first use of the slot does not wait on a submission that never happened.
    pub fn new(device: Arc<Device>) -> RhiResult<Self> {
        let sync = Self {
            image_available: Semaphore::new(device.clone())?,
            render_finished: Semaphore::new(device.clone())?,
            in_flight: Fence::new(device, true)?,
        };
        debug!("Created frame slot synchronization objects");
        Ok(sync)
    }
}
