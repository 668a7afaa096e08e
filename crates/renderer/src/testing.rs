//! In-memory device for unit tests.

use std::time::Duration;

use modeler_platform::{Extent, Rect};

use crate::gpu::{CommandTarget, CreatedSwapchain, GpuDevice, PresentationResult, ResourceCount, SlotStatus};
use crate::{RenderError, RenderResult};

#[derive(Debug, Clone, PartialEq)]
pub enum FakeCall {
    CreateSlot(usize),
    DestroySlot(usize),
    WaitSlot(usize),
    ResetSlot(usize),
    WaitIdle,
    CreateSwapchain { id: u32, extent: Extent, previous: Option<u32> },
    DestroySwapchain(u32),
    CreateViews(u32),
    DestroyViews(u32),
    CreateFramebuffers(u32),
    DestroyFramebuffers(u32),
    Acquire(usize),
    Submit(usize),
    Present(u32),
}

pub struct FakeSlot(usize);

pub struct FakeSwapchain {
    pub id: u32,
    pub image_count: usize,
}

pub struct FakeBundle {
    pub id: u32,
    pub count: usize,
}

impl ResourceCount for FakeBundle {
    fn count(&self) -> usize {
        self.count
    }
}

/// Records calls; every wait succeeds unless `time_out_slots` is set.
pub struct FakeDevice {
    pub calls: Vec<FakeCall>,
    pub time_out_slots: bool,
    pub fail_framebuffers: bool,
    pub image_count: usize,
    pub(crate) next_id: u32,
}

impl Default for FakeDevice {
    fn default() -> Self {
        Self {
            calls: Vec::new(),
            time_out_slots: false,
            fail_framebuffers: false,
            image_count: 3,
            next_id: 0,
        }
    }
}

impl FakeDevice {
    fn next_id(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    pub fn count(&self, pred: impl Fn(&FakeCall) -> bool) -> usize {
        self.calls.iter().filter(|c| pred(*c)).count()
    }
}

impl CommandTarget for FakeDevice {
    fn set_viewport(&mut self, _rect: Rect) {}
    fn fill_rect(&mut self, _rect: Rect, _color: [f32; 4]) {}
}

impl GpuDevice for FakeDevice {
    type Slot = FakeSlot;
    type Swapchain = FakeSwapchain;
    type ImageViews = FakeBundle;
    type Framebuffers = FakeBundle;

    fn create_frame_slot(&mut self, index: usize) -> RenderResult<FakeSlot> {
        self.calls.push(FakeCall::CreateSlot(index));
        Ok(FakeSlot(index))
    }

    fn destroy_frame_slot(&mut self, slot: FakeSlot) {
        self.calls.push(FakeCall::DestroySlot(slot.0));
    }

    fn wait_for_slot(&mut self, slot: &FakeSlot, _timeout: Duration) -> RenderResult<SlotStatus> {
        self.calls.push(FakeCall::WaitSlot(slot.0));
        Ok(if self.time_out_slots {
            SlotStatus::TimedOut
        } else {
            SlotStatus::Reusable
        })
    }

    fn reset_slot(&mut self, slot: &FakeSlot) -> RenderResult<()> {
        self.calls.push(FakeCall::ResetSlot(slot.0));
        Ok(())
    }

    fn wait_idle(&mut self) -> RenderResult<()> {
        self.calls.push(FakeCall::WaitIdle);
        Ok(())
    }

    fn create_swapchain(
        &mut self,
        extent: Extent,
        previous: Option<&FakeSwapchain>,
    ) -> RenderResult<Option<CreatedSwapchain<FakeSwapchain>>> {
        let id = self.next_id();
        self.calls.push(FakeCall::CreateSwapchain {
            id,
            extent,
            previous: previous.map(|p| p.id),
        });
        Ok(Some(CreatedSwapchain {
            handle: FakeSwapchain {
                id,
                image_count: self.image_count,
            },
            extent,
            image_count: self.image_count,
        }))
    }

    fn destroy_swapchain(&mut self, swapchain: FakeSwapchain) {
        self.calls.push(FakeCall::DestroySwapchain(swapchain.id));
    }

    fn create_image_views(&mut self, swapchain: &FakeSwapchain) -> RenderResult<FakeBundle> {
        let id = self.next_id();
        self.calls.push(FakeCall::CreateViews(id));
        Ok(FakeBundle {
            id,
            count: swapchain.image_count,
        })
    }

    fn destroy_image_views(&mut self, views: FakeBundle) {
        self.calls.push(FakeCall::DestroyViews(views.id));
    }

    fn create_framebuffers(&mut self, views: &FakeBundle, _extent: Extent) -> RenderResult<FakeBundle> {
        if self.fail_framebuffers {
            return Err(RenderError::InvalidState("framebuffer creation failed".into()));
        }
        let id = self.next_id();
        self.calls.push(FakeCall::CreateFramebuffers(id));
        Ok(FakeBundle {
            id,
            count: views.count,
        })
    }

    fn destroy_framebuffers(&mut self, framebuffers: FakeBundle) {
        self.calls.push(FakeCall::DestroyFramebuffers(framebuffers.id));
    }

    fn acquire_next_image(&mut self, _swapchain: &FakeSwapchain, slot: &FakeSlot) -> PresentationResult<u32> {
        self.calls.push(FakeCall::Acquire(slot.0));
        PresentationResult::Success(0)
    }

    fn begin_frame(
        &mut self,
        _slot: &FakeSlot,
        _framebuffers: &FakeBundle,
        _image_index: u32,
        _extent: Extent,
    ) -> RenderResult<()> {
        Ok(())
    }

    fn next_pass(&mut self) {}

    fn end_frame(&mut self) -> RenderResult<()> {
        Ok(())
    }

    fn submit(&mut self, slot: &FakeSlot) -> RenderResult<()> {
        self.calls.push(FakeCall::Submit(slot.0));
        Ok(())
    }

    fn present(&mut self, _swapchain: &FakeSwapchain, _slot: &FakeSlot, image_index: u32) -> PresentationResult {
        self.calls.push(FakeCall::Present(image_index));
        PresentationResult::Success(())
    }
}
