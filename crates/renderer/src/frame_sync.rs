//! Frame slot ring.
//!
//! Two slots let the CPU record frame `k + 1` while the GPU still works on
//! frame `k`. Frame `k` always uses slot `k % FRAMES_IN_FLIGHT`, and a slot is
//! only handed out again after its previous submission signaled completion.
//!
//! Per use, a slot moves through:
//!
//! ```text
//! Idle/Submitted --wait_until_reusable--> Reusable
//!   --signal_image_requested--> ImageRequested
//!   --signal_render_complete--> Submitted
//! ```
//!
//! An out-of-date acquire leaves the slot in `ImageRequested`; the next wait
//! on it returns immediately because its guard was never reset.

use std::time::Duration;

use tracing::{debug, error, trace};

use crate::gpu::{GpuDevice, SlotStatus};
use crate::{RenderError, RenderResult};

/// Number of frames the CPU may have queued ahead of the GPU.
pub const FRAMES_IN_FLIGHT: usize = 2;

/// Where a slot is in its per-frame cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotPhase {
    /// Created, never submitted.
    Idle,
    /// Previous submission finished; the slot may be rebound.
    Reusable,
    /// An acquire was issued with the slot's image-available signal.
    ImageRequested,
    /// Commands are queued on the GPU.
    Submitted,
}

/// Index of a slot in the ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotHandle(usize);

impl SlotHandle {
    pub fn index(self) -> usize {
        self.0
    }
}

struct FrameSlot<S> {
    resources: S,
    phase: SlotPhase,
}

/// Owns the ring of frame slots.
pub struct FrameSynchronizer<D: GpuDevice> {
    slots: Vec<FrameSlot<D::Slot>>,
    timeout: Duration,
}

impl<D: GpuDevice> FrameSynchronizer<D> {
    /// Create [`FRAMES_IN_FLIGHT`] slots.
    ///
    /// Slots created before a failure are destroyed again.
    pub fn new(device: &mut D, timeout: Duration) -> RenderResult<Self> {
        let mut sync = Self {
            slots: Vec::with_capacity(FRAMES_IN_FLIGHT),
            timeout,
        };
        for index in 0..FRAMES_IN_FLIGHT {
            match device.create_frame_slot(index) {
                Ok(resources) => sync.slots.push(FrameSlot {
                    resources,
                    phase: SlotPhase::Idle,
                }),
                Err(e) => {
                    sync.destroy(device);
                    return Err(e);
                }
            }
        }
        debug!("Created {} frame slots (timeout {:?})", FRAMES_IN_FLIGHT, timeout);
        Ok(sync)
    }

    /// Slot used by frame `frame_index`.
    #[inline]
    pub fn acquire_slot(&self, frame_index: u64) -> SlotHandle {
        SlotHandle((frame_index % FRAMES_IN_FLIGHT as u64) as usize)
    }

    /// Block until the GPU finished the slot's previous submission.
    ///
    /// Exceeding the timeout is reported as device loss. The guard itself is
    /// reset later, in [`Self::signal_render_complete`], so an acquire that
    /// never leads to a submission leaves it satisfied.
    pub fn wait_until_reusable(&mut self, device: &mut D, handle: SlotHandle) -> RenderResult<()> {
        let timeout = self.timeout;
        let slot = self.slot_mut(handle)?;
        match device.wait_for_slot(&slot.resources, timeout)? {
            SlotStatus::Reusable => {
                trace!("Frame slot {} reusable", handle.0);
                slot.phase = SlotPhase::Reusable;
                Ok(())
            }
            SlotStatus::TimedOut => {
                error!("Frame slot {} still in flight after {:?}", handle.0, timeout);
                Err(RenderError::DeviceLost {
                    slot: handle.0,
                    timeout,
                })
            }
        }
    }

    /// Mark the slot's image-available signal as armed for the upcoming
    /// acquire and return the slot objects to acquire with.
    pub fn signal_image_requested(&mut self, handle: SlotHandle) -> RenderResult<&D::Slot> {
        let slot = self.slot_mut(handle)?;
        if slot.phase != SlotPhase::Reusable {
            return Err(RenderError::InvalidState(format!(
                "frame slot {} requested an image while {:?}",
                handle.0, slot.phase
            )));
        }
        slot.phase = SlotPhase::ImageRequested;
        Ok(&slot.resources)
    }

    /// Commit the slot to the GPU: reset its guard and submit the recorded
    /// commands, which signal render-finished and the guard on completion.
    pub fn signal_render_complete(&mut self, device: &mut D, handle: SlotHandle) -> RenderResult<()> {
        let slot = self.slot_mut(handle)?;
        if slot.phase != SlotPhase::ImageRequested {
            return Err(RenderError::InvalidState(format!(
                "frame slot {} submitted while {:?}",
                handle.0, slot.phase
            )));
        }
        device.reset_slot(&slot.resources)?;
        device.submit(&slot.resources)?;
        slot.phase = SlotPhase::Submitted;
        Ok(())
    }

    /// Slot objects, for presenting after submission.
    pub fn slot(&self, handle: SlotHandle) -> Option<&D::Slot> {
        self.slots.get(handle.0).map(|slot| &slot.resources)
    }

    pub fn phase(&self, handle: SlotHandle) -> Option<SlotPhase> {
        self.slots.get(handle.0).map(|slot| slot.phase)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Destroy every slot. The device must be idle.
    pub fn destroy(&mut self, device: &mut D) {
        let count = self.slots.len();
        for slot in self.slots.drain(..) {
            device.destroy_frame_slot(slot.resources);
        }
        if count > 0 {
            debug!("Destroyed {} frame slots", count);
        }
    }

    fn slot_mut(&mut self, handle: SlotHandle) -> RenderResult<&mut FrameSlot<D::Slot>> {
        self.slots
            .get_mut(handle.0)
            .ok_or_else(|| RenderError::InvalidState(format!("frame slot {} does not exist", handle.0)))
    }
}
