//! Scripted GPU, recording layers and a recording bridge for the render loop tests.

#![allow(dead_code)]

use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::time::Duration;

use modeler_core::RenderConfig;
use modeler_platform::{Event, Extent, PlatformBridge, Rect, Sender, WindowGeometry, channel};
use modeler_renderer::{
    BoardLayer, CommandTarget, CreatedSwapchain, FrameContext, GpuDevice, InputResponse, Layer,
    LayerInput, PresentationResult, RenderError, RenderLoop, RenderResult, ResourceCount, Scene,
    SlotStatus,
};

// =============================================================================
// Scripted GPU
// =============================================================================

/// Every call the render loop made, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    CreateSlot(usize),
    DestroySlot(usize),
    WaitSlot(usize),
    SlotReady(usize),
    ResetSlot(usize),
    WaitIdle,
    CreateSwapchain {
        id: u32,
        extent: Extent,
        previous: Option<u32>,
    },
    DestroySwapchain(u32),
    CreateViews {
        id: u32,
        swapchain: u32,
    },
    DestroyViews(u32),
    CreateFramebuffers {
        id: u32,
        views: u32,
    },
    DestroyFramebuffers(u32),
    Acquire {
        slot: usize,
        swapchain: u32,
    },
    BeginFrame {
        slot: usize,
        framebuffers: u32,
        image_index: u32,
    },
    SetViewport(Rect),
    FillRect(Rect),
    NextPass,
    EndFrame,
    Submit(usize),
    Present {
        swapchain: u32,
        image_index: u32,
    },
    /// The simulated GPU finished the slot's work.
    Complete(usize),
}

/// Non-success outcome to return from the next acquire or present.
#[derive(Debug, Clone)]
pub enum Scripted {
    OutOfDate,
    Suboptimal,
    Fatal(&'static str),
}

#[derive(Default)]
struct State {
    calls: Vec<Call>,
    /// Reusable guard per slot.
    fences: Vec<bool>,
    /// Signal fences at submit time instead of waiting for `complete`.
    auto_complete: bool,
    acquire_script: VecDeque<Scripted>,
    present_script: VecDeque<Scripted>,
    live_swapchains: HashSet<u32>,
    live_views: HashSet<u32>,
    live_framebuffers: HashSet<u32>,
    live_slots: HashSet<usize>,
}

struct Shared {
    state: Mutex<State>,
    fence_signaled: Condvar,
}

/// Test-side handle to the scripted GPU. Cloneable and `Send`, so a helper
/// thread can play the GPU completing work.
#[derive(Clone)]
pub struct GpuHandle {
    shared: Arc<Shared>,
}

impl GpuHandle {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.shared.state.lock().unwrap()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.lock().calls.iter().filter(|c| pred(*c)).count()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    pub fn set_auto_complete(&self, enabled: bool) {
        self.lock().auto_complete = enabled;
    }

    /// Signal the slot's reusable guard, as the GPU finishing its work would.
    pub fn complete(&self, slot: usize) {
        let mut state = self.lock();
        state.fences[slot] = true;
        state.calls.push(Call::Complete(slot));
        self.shared.fence_signaled.notify_all();
    }

    pub fn script_acquire(&self, outcome: Scripted) {
        self.lock().acquire_script.push_back(outcome);
    }

    pub fn script_present(&self, outcome: Scripted) {
        self.lock().present_script.push_back(outcome);
    }

    /// Objects created and not yet destroyed: (swapchains, views, framebuffers, slots).
    pub fn live(&self) -> (usize, usize, usize, usize) {
        let state = self.lock();
        (
            state.live_swapchains.len(),
            state.live_views.len(),
            state.live_framebuffers.len(),
            state.live_slots.len(),
        )
    }
}

pub struct MockSlot(usize);

pub struct MockSwapchain {
    pub id: u32,
    pub image_count: usize,
}

pub struct MockBundle {
    pub id: u32,
    pub count: usize,
}

impl ResourceCount for MockBundle {
    fn count(&self) -> usize {
        self.count
    }
}

/// In-memory [`GpuDevice`] that records every call and simulates fences.
pub struct MockGpu {
    handle: GpuHandle,
    image_count: usize,
    next_id: u32,
    next_image: u32,
}

impl MockGpu {
    /// New device whose fences signal at submit time.
    pub fn new() -> (Self, GpuHandle) {
        let handle = GpuHandle {
            shared: Arc::new(Shared {
                state: Mutex::new(State {
                    auto_complete: true,
                    ..Default::default()
                }),
                fence_signaled: Condvar::new(),
            }),
        };
        let gpu = Self {
            handle: handle.clone(),
            image_count: 3,
            next_id: 0,
            next_image: 0,
        };
        (gpu, handle)
    }

    fn log(&self, call: Call) {
        self.handle.lock().calls.push(call);
    }

    fn next_id(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }
}

impl CommandTarget for MockGpu {
    fn set_viewport(&mut self, rect: Rect) {
        self.log(Call::SetViewport(rect));
    }

    fn fill_rect(&mut self, rect: Rect, _color: [f32; 4]) {
        self.log(Call::FillRect(rect));
    }
}

impl GpuDevice for MockGpu {
    type Slot = MockSlot;
    type Swapchain = MockSwapchain;
    type ImageViews = MockBundle;
    type Framebuffers = MockBundle;

    fn create_frame_slot(&mut self, index: usize) -> RenderResult<MockSlot> {
        let mut state = self.handle.lock();
        if state.fences.len() <= index {
            state.fences.resize(index + 1, true);
        }
        state.fences[index] = true;
        state.live_slots.insert(index);
        state.calls.push(Call::CreateSlot(index));
        Ok(MockSlot(index))
    }

    fn destroy_frame_slot(&mut self, slot: MockSlot) {
        let mut state = self.handle.lock();
        state.live_slots.remove(&slot.0);
        state.calls.push(Call::DestroySlot(slot.0));
    }

    fn wait_for_slot(&mut self, slot: &MockSlot, timeout: Duration) -> RenderResult<SlotStatus> {
        self.log(Call::WaitSlot(slot.0));
        let guard = self.handle.lock();
        let (mut state, _) = self
            .handle
            .shared
            .fence_signaled
            .wait_timeout_while(guard, timeout, |state| !state.fences[slot.0])
            .unwrap();
        if !state.fences[slot.0] {
            return Ok(SlotStatus::TimedOut);
        }
        state.calls.push(Call::SlotReady(slot.0));
        Ok(SlotStatus::Reusable)
    }

    fn reset_slot(&mut self, slot: &MockSlot) -> RenderResult<()> {
        let mut state = self.handle.lock();
        assert!(state.fences[slot.0], "reset of a guard still in flight");
        state.fences[slot.0] = false;
        state.calls.push(Call::ResetSlot(slot.0));
        Ok(())
    }

    fn wait_idle(&mut self) -> RenderResult<()> {
        // Idle means every submission finished.
        let mut state = self.handle.lock();
        state.fences.iter_mut().for_each(|fence| *fence = true);
        state.calls.push(Call::WaitIdle);
        self.handle.shared.fence_signaled.notify_all();
        Ok(())
    }

    fn create_swapchain(
        &mut self,
        extent: Extent,
        previous: Option<&MockSwapchain>,
    ) -> RenderResult<Option<CreatedSwapchain<MockSwapchain>>> {
        let id = self.next_id();
        let mut state = self.handle.lock();
        state.calls.push(Call::CreateSwapchain {
            id,
            extent,
            previous: previous.map(|p| p.id),
        });
        state.live_swapchains.insert(id);
        Ok(Some(CreatedSwapchain {
            handle: MockSwapchain {
                id,
                image_count: self.image_count,
            },
            extent,
            image_count: self.image_count,
        }))
    }

    fn destroy_swapchain(&mut self, swapchain: MockSwapchain) {
        let mut state = self.handle.lock();
        assert!(state.live_swapchains.remove(&swapchain.id), "double destroy");
        state.calls.push(Call::DestroySwapchain(swapchain.id));
    }

    fn create_image_views(&mut self, swapchain: &MockSwapchain) -> RenderResult<MockBundle> {
        let id = self.next_id();
        let mut state = self.handle.lock();
        assert!(state.live_swapchains.contains(&swapchain.id));
        state.live_views.insert(id);
        state.calls.push(Call::CreateViews {
            id,
            swapchain: swapchain.id,
        });
        Ok(MockBundle {
            id,
            count: swapchain.image_count,
        })
    }

    fn destroy_image_views(&mut self, views: MockBundle) {
        let mut state = self.handle.lock();
        assert!(state.live_views.remove(&views.id), "double destroy");
        state.calls.push(Call::DestroyViews(views.id));
    }

    fn create_framebuffers(&mut self, views: &MockBundle, _extent: Extent) -> RenderResult<MockBundle> {
        let id = self.next_id();
        let mut state = self.handle.lock();
        assert!(state.live_views.contains(&views.id));
        state.live_framebuffers.insert(id);
        state.calls.push(Call::CreateFramebuffers { id, views: views.id });
        Ok(MockBundle {
            id,
            count: views.count,
        })
    }

    fn destroy_framebuffers(&mut self, framebuffers: MockBundle) {
        let mut state = self.handle.lock();
        assert!(state.live_framebuffers.remove(&framebuffers.id), "double destroy");
        state.calls.push(Call::DestroyFramebuffers(framebuffers.id));
    }

    fn acquire_next_image(&mut self, swapchain: &MockSwapchain, slot: &MockSlot) -> PresentationResult<u32> {
        let scripted = {
            let mut state = self.handle.lock();
            state.calls.push(Call::Acquire {
                slot: slot.0,
                swapchain: swapchain.id,
            });
            state.acquire_script.pop_front()
        };
        match scripted {
            Some(Scripted::OutOfDate) => return PresentationResult::OutOfDate,
            Some(Scripted::Fatal(message)) => return PresentationResult::Fatal(message.to_string()),
            _ => {}
        }

        let index = self.next_image % swapchain.image_count as u32;
        self.next_image = self.next_image.wrapping_add(1);
        match scripted {
            Some(Scripted::Suboptimal) => PresentationResult::SuboptimalButUsable(index),
            _ => PresentationResult::Success(index),
        }
    }

    fn begin_frame(
        &mut self,
        slot: &MockSlot,
        framebuffers: &MockBundle,
        image_index: u32,
        _extent: Extent,
    ) -> RenderResult<()> {
        assert!((image_index as usize) < framebuffers.count);
        self.log(Call::BeginFrame {
            slot: slot.0,
            framebuffers: framebuffers.id,
            image_index,
        });
        Ok(())
    }

    fn next_pass(&mut self) {
        self.log(Call::NextPass);
    }

    fn end_frame(&mut self) -> RenderResult<()> {
        self.log(Call::EndFrame);
        Ok(())
    }

    fn submit(&mut self, slot: &MockSlot) -> RenderResult<()> {
        let mut state = self.handle.lock();
        assert!(!state.fences[slot.0], "submit without resetting the guard");
        state.calls.push(Call::Submit(slot.0));
        if state.auto_complete {
            state.fences[slot.0] = true;
            state.calls.push(Call::Complete(slot.0));
            self.handle.shared.fence_signaled.notify_all();
        }
        Ok(())
    }

    fn present(&mut self, swapchain: &MockSwapchain, _slot: &MockSlot, image_index: u32) -> PresentationResult {
        let mut state = self.handle.lock();
        state.calls.push(Call::Present {
            swapchain: swapchain.id,
            image_index,
        });
        match state.present_script.pop_front() {
            None => PresentationResult::Success(()),
            Some(Scripted::OutOfDate) => PresentationResult::OutOfDate,
            Some(Scripted::Suboptimal) => PresentationResult::SuboptimalButUsable(()),
            Some(Scripted::Fatal(message)) => PresentationResult::Fatal(message.to_string()),
        }
    }
}

// =============================================================================
// Recording Layers
// =============================================================================

/// Which part of the window a recording layer lays itself out in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Board,
    Overlay,
    Decoration,
}

impl Role {
    pub fn viewport(self, geometry: &WindowGeometry) -> Rect {
        let client = geometry.client_rect();
        match self {
            Role::Board => client,
            Role::Overlay => Rect::new(
                client.x + client.width as i32 - 100,
                client.y,
                100,
                40.min(client.height),
            ),
            Role::Decoration => geometry.active,
        }
    }
}

/// What the recording layers observed.
#[derive(Debug, Default)]
pub struct LayerLog {
    pub inputs: Vec<(Role, LayerInput)>,
    /// Geometry each input in `inputs` was delivered with.
    pub input_geometries: Vec<WindowGeometry>,
    pub uploads: usize,
    pub draws: Vec<(Role, u64)>,
}

pub struct RecordingLayer {
    role: Role,
    log: Arc<Mutex<LayerLog>>,
    /// Answer button presses with a board update request.
    request_update_on_press: bool,
}

impl Layer for RecordingLayer {
    fn name(&self) -> &'static str {
        match self.role {
            Role::Board => "board",
            Role::Overlay => "overlay",
            Role::Decoration => "decoration",
        }
    }

    fn viewport(&self, geometry: &WindowGeometry) -> Rect {
        self.role.viewport(geometry)
    }

    fn handle_input(&mut self, input: LayerInput, geometry: &WindowGeometry) -> InputResponse {
        let mut log = self.log.lock().unwrap();
        log.inputs.push((self.role, input));
        log.input_geometries.push(*geometry);
        drop(log);
        if self.request_update_on_press && input == LayerInput::ButtonDown {
            InputResponse::RequestBoardUpdate
        } else {
            InputResponse::Handled
        }
    }

    fn record_draw(&mut self, target: &mut dyn CommandTarget, frame: &FrameContext) -> RenderResult<()> {
        self.log.lock().unwrap().draws.push((self.role, frame.frame_index));
        target.fill_rect(self.role.viewport(&frame.geometry), [1.0, 1.0, 1.0, 1.0]);
        Ok(())
    }
}

impl BoardLayer for RecordingLayer {
    fn upload_board_state(&mut self) -> RenderResult<()> {
        self.log.lock().unwrap().uploads += 1;
        Ok(())
    }
}

/// Board, overlay and decoration layers sharing one log.
pub fn recording_scene() -> (Scene, Arc<Mutex<LayerLog>>) {
    let log = Arc::new(Mutex::new(LayerLog::default()));
    let layer = |role| {
        Box::new(RecordingLayer {
            role,
            log: log.clone(),
            request_update_on_press: role == Role::Board,
        })
    };
    let scene = Scene::new(layer(Role::Board), layer(Role::Decoration)).with_overlay(layer(Role::Overlay));
    (scene, log)
}

// =============================================================================
// Bridge
// =============================================================================

#[derive(Debug, Default)]
pub struct BridgeLog {
    pub acknowledged: Vec<WindowGeometry>,
    pub startup_failures: Vec<String>,
    pub fatal_errors: Vec<String>,
}

#[derive(Clone)]
pub struct TestBridge {
    pub geometry: WindowGeometry,
    pub log: Arc<Mutex<BridgeLog>>,
}

impl TestBridge {
    pub fn new(geometry: WindowGeometry) -> Self {
        Self {
            geometry,
            log: Arc::default(),
        }
    }
}

impl PlatformBridge for TestBridge {
    fn current_window_geometry(&self) -> WindowGeometry {
        self.geometry
    }

    fn acknowledge_resize(&self, geometry: &WindowGeometry) {
        self.log.lock().unwrap().acknowledged.push(*geometry);
    }

    fn notify_startup_failure(&self, message: &str) {
        self.log.lock().unwrap().startup_failures.push(message.to_string());
    }

    fn notify_fatal_error(&self, message: &str) {
        self.log.lock().unwrap().fatal_errors.push(message.to_string());
    }
}

// =============================================================================
// Fixtures
// =============================================================================

pub fn geometry(width: u32, height: u32) -> WindowGeometry {
    WindowGeometry::windowed(Extent::new(width, height), 1.0)
}

pub fn test_config() -> RenderConfig {
    RenderConfig {
        slot_timeout: Duration::from_secs(5),
        paused_poll_interval: Duration::from_millis(1),
        validation: false,
        ..RenderConfig::default()
    }
}

pub struct Harness {
    pub render_loop: RenderLoop<MockGpu>,
    pub events: Sender<Event>,
    pub gpu: GpuHandle,
    pub layers: Arc<Mutex<LayerLog>>,
    pub bridge: TestBridge,
}

impl Harness {
    pub fn new(initial: WindowGeometry) -> Self {
        Self::with_config(initial, test_config())
    }

    pub fn with_config(initial: WindowGeometry, config: RenderConfig) -> Self {
        let (gpu, handle) = MockGpu::new();
        let (events, receiver) = channel();
        let (scene, layers) = recording_scene();
        let render_loop =
            RenderLoop::new(gpu, receiver, scene, config, initial).expect("render loop should start");
        Self {
            render_loop,
            events,
            gpu: handle,
            layers,
            bridge: TestBridge::new(initial),
        }
    }

    pub fn step(&mut self) -> RenderResult<modeler_renderer::IterationOutcome> {
        self.render_loop.run_iteration(&self.bridge)
    }

    pub fn step_ok(&mut self) {
        self.step().expect("iteration should succeed");
    }
}

/// Index of the first call matching `pred`.
pub fn position(calls: &[Call], pred: impl Fn(&Call) -> bool) -> Option<usize> {
    calls.iter().position(pred)
}

pub fn is_fatal(result: &RenderResult<modeler_renderer::IterationOutcome>) -> bool {
    matches!(result, Err(RenderError::Presentation(_)))
}
